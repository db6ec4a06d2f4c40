use accessmgmt_application::{
    CompactEntity, CompactPackage, CompactResource, CompactRole, DelegationBasis,
    PackageDelegationCheck, PackagePermission, PartyConnection, PermissionPath,
    ResourcePermission,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query parameters of connection listings.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/connection-list-query.ts"
)]
pub struct ConnectionListQuery {
    pub counterpart: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub include_packages: bool,
    #[serde(default)]
    pub include_sub_connections: bool,
}

/// Query parameters of package and resource permission listings.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-list-query.ts"
)]
pub struct PermissionListQuery {
    pub counterpart: Option<String>,
    pub package: Option<String>,
    pub resource: Option<String>,
}

/// Query parameters of the assignable-packages check.
///
/// `packages` is a comma-separated id list; when absent every package is checked.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignable-packages-query.ts"
)]
pub struct AssignablePackagesQuery {
    pub source: String,
    pub packages: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/compact-entity-response.ts"
)]
pub struct CompactEntityResponse {
    pub id: String,
    pub name: String,
    pub type_id: String,
    pub parent_id: Option<String>,
}

impl From<CompactEntity> for CompactEntityResponse {
    fn from(value: CompactEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            type_id: value.type_id.to_string(),
            parent_id: value.parent_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/compact-role-response.ts"
)]
pub struct CompactRoleResponse {
    pub id: String,
    pub code: String,
    pub urn: String,
}

impl From<CompactRole> for CompactRoleResponse {
    fn from(value: CompactRole) -> Self {
        Self {
            id: value.id.to_string(),
            code: value.code,
            urn: value.urn,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/compact-package-response.ts"
)]
pub struct CompactPackageResponse {
    pub id: String,
    pub urn: String,
    pub name: String,
}

impl From<CompactPackage> for CompactPackageResponse {
    fn from(value: CompactPackage) -> Self {
        Self {
            id: value.id.to_string(),
            urn: value.urn,
            name: value.name,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/compact-resource-response.ts"
)]
pub struct CompactResourceResponse {
    pub id: String,
    pub ref_id: String,
    pub name: String,
}

impl From<CompactResource> for CompactResourceResponse {
    fn from(value: CompactResource) -> Self {
        Self {
            id: value.id.to_string(),
            ref_id: value.ref_id,
            name: value.name,
        }
    }
}

/// API representation of a party connected to the queried party.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/party-connection-response.ts"
)]
pub struct PartyConnectionResponse {
    pub party: CompactEntityResponse,
    pub direct: bool,
    pub roles: Vec<CompactRoleResponse>,
    pub packages: Vec<CompactPackageResponse>,
    pub sub_connections: Vec<PartyConnectionResponse>,
}

impl From<PartyConnection> for PartyConnectionResponse {
    fn from(value: PartyConnection) -> Self {
        Self {
            party: value.party.into(),
            direct: value.direct,
            roles: value.roles.into_iter().map(Into::into).collect(),
            packages: value.packages.into_iter().map(Into::into).collect(),
            sub_connections: value.sub_connections.into_iter().map(Into::into).collect(),
        }
    }
}

/// One way a party holds a package or resource.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-path-response.ts"
)]
pub struct PermissionPathResponse {
    pub from: CompactEntityResponse,
    pub to: CompactEntityResponse,
    pub via: Option<CompactEntityResponse>,
    pub via_role: Option<CompactRoleResponse>,
    pub role: CompactRoleResponse,
    pub reason: String,
}

impl From<PermissionPath> for PermissionPathResponse {
    fn from(value: PermissionPath) -> Self {
        Self {
            from: value.from.into(),
            to: value.to.into(),
            via: value.via.map(Into::into),
            via_role: value.via_role.map(Into::into),
            role: value.role.into(),
            reason: value.reason.to_string(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/package-permission-response.ts"
)]
pub struct PackagePermissionResponse {
    pub package: CompactPackageResponse,
    pub permissions: Vec<PermissionPathResponse>,
}

impl From<PackagePermission> for PackagePermissionResponse {
    fn from(value: PackagePermission) -> Self {
        Self {
            package: value.package.into(),
            permissions: value.permissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resource-permission-response.ts"
)]
pub struct ResourcePermissionResponse {
    pub resource: CompactResourceResponse,
    pub permissions: Vec<PermissionPathResponse>,
}

impl From<ResourcePermission> for ResourcePermissionResponse {
    fn from(value: ResourcePermission) -> Self {
        Self {
            resource: value.resource.into(),
            permissions: value.permissions.into_iter().map(Into::into).collect(),
        }
    }
}

/// One basis considered when deciding whether a package may be passed on.
///
/// `kind` is `relation` or `no_access`; the remaining fields are set for `relation` only.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/delegation-basis-response.ts"
)]
pub struct DelegationBasisResponse {
    pub kind: &'static str,
    pub path: Option<PermissionPathResponse>,
    pub source: Option<String>,
    pub can_delegate: bool,
}

impl From<DelegationBasis> for DelegationBasisResponse {
    fn from(value: DelegationBasis) -> Self {
        match value {
            DelegationBasis::Relation {
                path,
                source,
                can_delegate,
            } => Self {
                kind: "relation",
                path: Some(path.into()),
                source: source.map(|source| source.as_str().to_owned()),
                can_delegate,
            },
            DelegationBasis::NoAccess => Self {
                kind: "no_access",
                path: None,
                source: None,
                can_delegate: false,
            },
        }
    }
}

/// Delegability verdict for one package.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/package-delegation-check-response.ts"
)]
pub struct PackageDelegationCheckResponse {
    pub package: CompactPackageResponse,
    pub result: bool,
    pub reasons: Vec<DelegationBasisResponse>,
}

impl From<PackageDelegationCheck> for PackageDelegationCheckResponse {
    fn from(value: PackageDelegationCheck) -> Self {
        Self {
            package: value.package.into(),
            result: value.result,
            reasons: value.reasons.into_iter().map(Into::into).collect(),
        }
    }
}
