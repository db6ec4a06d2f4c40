use std::str::FromStr;

use accessmgmt_application::{
    ConnectionQuery, PackagePermissionQuery, PermissionDirection, ResourcePermissionQuery,
};
use accessmgmt_domain::{EntityId, PackageId, ResourceId, RoleId};
use axum::Json;
use axum::extract::{Path, Query, State};

use crate::dto::{
    AssignablePackagesQuery, ConnectionListQuery, PackageDelegationCheckResponse,
    PackagePermissionResponse, PartyConnectionResponse, PermissionListQuery,
    ResourcePermissionResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{parse_id, parse_id_list, parse_optional_id};

pub async fn list_connections_handler(
    State(state): State<AppState>,
    Path((party_id, direction)): Path<(String, String)>,
    Query(query): Query<ConnectionListQuery>,
) -> ApiResult<Json<Vec<PartyConnectionResponse>>> {
    let direction = PermissionDirection::from_str(direction.as_str())?;
    let connection_query = ConnectionQuery {
        party_id: parse_id("party id", party_id.as_str(), EntityId::from_uuid)?,
        counterpart_id: parse_optional_id(
            "counterpart",
            query.counterpart.as_deref(),
            EntityId::from_uuid,
        )?,
        role_id: parse_optional_id("role", query.role.as_deref(), RoleId::from_uuid)?,
        include_packages: query.include_packages,
        include_sub_connections: query.include_sub_connections,
    };

    let connections = match direction {
        PermissionDirection::FromParty => {
            state
                .permission_query_service
                .connections_from(connection_query)
                .await?
        }
        PermissionDirection::ToParty => {
            state
                .permission_query_service
                .connections_to(connection_query)
                .await?
        }
    };

    Ok(Json(
        connections
            .into_iter()
            .map(PartyConnectionResponse::from)
            .collect(),
    ))
}

pub async fn list_package_permissions_handler(
    State(state): State<AppState>,
    Path((party_id, direction)): Path<(String, String)>,
    Query(query): Query<PermissionListQuery>,
) -> ApiResult<Json<Vec<PackagePermissionResponse>>> {
    let permissions = state
        .permission_query_service
        .package_permissions(PackagePermissionQuery {
            party_id: parse_id("party id", party_id.as_str(), EntityId::from_uuid)?,
            direction: PermissionDirection::from_str(direction.as_str())?,
            counterpart_id: parse_optional_id(
                "counterpart",
                query.counterpart.as_deref(),
                EntityId::from_uuid,
            )?,
            package_id: parse_optional_id("package", query.package.as_deref(), PackageId::from_uuid)?,
        })
        .await?
        .into_iter()
        .map(PackagePermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn list_resource_permissions_handler(
    State(state): State<AppState>,
    Path((party_id, direction)): Path<(String, String)>,
    Query(query): Query<PermissionListQuery>,
) -> ApiResult<Json<Vec<ResourcePermissionResponse>>> {
    let permissions = state
        .permission_query_service
        .resource_permissions(ResourcePermissionQuery {
            party_id: parse_id("party id", party_id.as_str(), EntityId::from_uuid)?,
            direction: PermissionDirection::from_str(direction.as_str())?,
            counterpart_id: parse_optional_id(
                "counterpart",
                query.counterpart.as_deref(),
                EntityId::from_uuid,
            )?,
            resource_id: parse_optional_id(
                "resource",
                query.resource.as_deref(),
                ResourceId::from_uuid,
            )?,
        })
        .await?
        .into_iter()
        .map(ResourcePermissionResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn list_assignable_packages_handler(
    State(state): State<AppState>,
    Path(party_id): Path<String>,
    Query(query): Query<AssignablePackagesQuery>,
) -> ApiResult<Json<Vec<PackageDelegationCheckResponse>>> {
    let acting_id = parse_id("party id", party_id.as_str(), EntityId::from_uuid)?;
    let source_id = parse_id("source", query.source.as_str(), EntityId::from_uuid)?;
    let package_ids = query
        .packages
        .as_deref()
        .map(|packages| parse_id_list("packages", packages, PackageId::from_uuid))
        .transpose()?;

    let checks = state
        .permission_query_service
        .assignable_packages(acting_id, source_id, package_ids.as_deref())
        .await?
        .into_iter()
        .map(PackageDelegationCheckResponse::from)
        .collect();

    Ok(Json(checks))
}
