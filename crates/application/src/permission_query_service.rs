use std::sync::Arc;

use accessmgmt_core::{AppError, AppResult};
use accessmgmt_domain::{
    Entity, EntityId, EntityTypeId, PackageId, PackageSource, Relation, RelationFilter,
    RelationPredicate, RelationReason, ResourceId, RoleId,
};
use serde::{Deserialize, Serialize};

use crate::{
    EntityRepository, PackageRepository, RelationResolver, ResourceRepository, RoleRepository,
};

mod assignable;
mod catalog;
mod connections;
mod permissions;


use catalog::Catalog;

/// Which endpoint of a relation the queried party occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDirection {
    /// The party grants access to others.
    FromParty,
    /// The party has received access from others.
    ToParty,
}

impl PermissionDirection {
    /// Returns the stable path segment.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FromParty => "from",
            Self::ToParty => "to",
        }
    }

    fn filter(self, party_id: EntityId, counterpart_id: Option<EntityId>) -> RelationFilter {
        match self {
            Self::FromParty => RelationFilter::any()
                .with(RelationPredicate::From(party_id))
                .with_optional(counterpart_id, RelationPredicate::To),
            Self::ToParty => RelationFilter::any()
                .with(RelationPredicate::To(party_id))
                .with_optional(counterpart_id, RelationPredicate::From),
        }
    }

    fn counterpart(self, relation: &Relation) -> EntityId {
        match self {
            Self::FromParty => relation.to_id,
            Self::ToParty => relation.from_id,
        }
    }
}

impl std::str::FromStr for PermissionDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "from" => Ok(Self::FromParty),
            "to" => Ok(Self::ToParty),
            _ => Err(AppError::Validation(format!(
                "unknown permission direction '{value}'"
            ))),
        }
    }
}

/// Party projection used in query answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactEntity {
    /// Party id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Entity type.
    pub type_id: EntityTypeId,
    /// Immediate parent.
    pub parent_id: Option<EntityId>,
}

impl From<&Entity> for CompactEntity {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
            type_id: entity.type_id,
            parent_id: entity.parent_id,
        }
    }
}

/// Role projection used in query answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactRole {
    /// Role id.
    pub id: RoleId,
    /// Provider-scoped code.
    pub code: String,
    /// Stable urn.
    pub urn: String,
}

/// Package projection used in query answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactPackage {
    /// Package id.
    pub id: PackageId,
    /// Stable urn.
    pub urn: String,
    /// Display name.
    pub name: String,
}

/// Resource projection used in query answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactResource {
    /// Resource id.
    pub id: ResourceId,
    /// Provider-scoped reference.
    pub ref_id: String,
    /// Display name.
    pub name: String,
}

/// Input for connection listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionQuery {
    /// Party whose connections are listed.
    pub party_id: EntityId,
    /// Optional other endpoint.
    pub counterpart_id: Option<EntityId>,
    /// Optional effective role.
    pub role_id: Option<RoleId>,
    /// Collect packages per connection.
    pub include_packages: bool,
    /// Nest indirect connections under the party they pass through.
    pub include_sub_connections: bool,
}

impl ConnectionQuery {
    /// Creates a query without optional narrowing.
    #[must_use]
    pub fn for_party(party_id: EntityId) -> Self {
        Self {
            party_id,
            counterpart_id: None,
            role_id: None,
            include_packages: false,
            include_sub_connections: false,
        }
    }
}

/// One party connected to the queried party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyConnection {
    /// The other endpoint.
    pub party: CompactEntity,
    /// Whether an explicit assignment links the two parties.
    pub direct: bool,
    /// Distinct effective roles.
    pub roles: Vec<CompactRole>,
    /// Distinct packages, when requested.
    pub packages: Vec<CompactPackage>,
    /// Indirect connections routed through `party`.
    pub sub_connections: Vec<PartyConnection>,
}

/// One way a party holds a package or resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionPath {
    /// Granting party.
    pub from: CompactEntity,
    /// Receiving party.
    pub to: CompactEntity,
    /// Intermediate party.
    pub via: Option<CompactEntity>,
    /// Role held at the intermediate party.
    pub via_role: Option<CompactRole>,
    /// Effective role.
    pub role: CompactRole,
    /// Derivation path.
    pub reason: RelationReason,
}

/// Input for package permission listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackagePermissionQuery {
    /// Queried party.
    pub party_id: EntityId,
    /// Endpoint the party occupies.
    pub direction: PermissionDirection,
    /// Optional other endpoint.
    pub counterpart_id: Option<EntityId>,
    /// Optional package.
    pub package_id: Option<PackageId>,
}

/// Input for resource permission listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePermissionQuery {
    /// Queried party.
    pub party_id: EntityId,
    /// Endpoint the party occupies.
    pub direction: PermissionDirection,
    /// Optional other endpoint.
    pub counterpart_id: Option<EntityId>,
    /// Optional resource.
    pub resource_id: Option<ResourceId>,
}

/// Paths through which a package is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagePermission {
    /// Package.
    pub package: CompactPackage,
    /// Distinct holding paths.
    pub permissions: Vec<PermissionPath>,
}

/// Paths through which a resource is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourcePermission {
    /// Resource.
    pub resource: CompactResource,
    /// Distinct holding paths.
    pub permissions: Vec<PermissionPath>,
}

/// Why a package may or may not be passed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelegationBasis {
    /// The acting party holds the package through a relation.
    Relation {
        /// Holding path.
        path: PermissionPath,
        /// Instance-level or role-level grant.
        source: Option<PackageSource>,
        /// Whether this grant allows passing the package on.
        can_delegate: bool,
    },
    /// The acting party does not hold the package at all.
    NoAccess,
}

/// Delegability verdict for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDelegationCheck {
    /// Package.
    pub package: CompactPackage,
    /// Whether the acting party may assign the package onward.
    pub result: bool,
    /// Every basis considered.
    pub reasons: Vec<DelegationBasis>,
}

/// Read-side service answering "who can do what on whose behalf".
#[derive(Clone)]
pub struct PermissionQueryService {
    resolver: RelationResolver,
    entities: Arc<dyn EntityRepository>,
    roles: Arc<dyn RoleRepository>,
    packages: Arc<dyn PackageRepository>,
    resources: Arc<dyn ResourceRepository>,
}

impl PermissionQueryService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        resolver: RelationResolver,
        entities: Arc<dyn EntityRepository>,
        roles: Arc<dyn RoleRepository>,
        packages: Arc<dyn PackageRepository>,
        resources: Arc<dyn ResourceRepository>,
    ) -> Self {
        Self {
            resolver,
            entities,
            roles,
            packages,
            resources,
        }
    }

    /// Returns the underlying resolver.
    #[must_use]
    pub fn resolver(&self) -> &RelationResolver {
        &self.resolver
    }

    async fn require_party(&self, party_id: EntityId) -> AppResult<Entity> {
        self.entities
            .find_entity(party_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("party '{party_id}' does not exist")))
    }

    async fn catalog_for(&self, relations: &[Relation]) -> AppResult<Catalog> {
        Catalog::load(
            relations,
            self.entities.as_ref(),
            self.roles.as_ref(),
            self.packages.as_ref(),
            self.resources.as_ref(),
        )
        .await
    }
}
