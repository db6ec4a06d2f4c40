use accessmgmt_application::{
    AddAssignmentPackagesInput, CreateAssignmentInput, DeleteAssignmentInput,
};
use accessmgmt_core::AuditContext;
use accessmgmt_domain::{AssignmentId, EntityId, PackageId};
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{
    AddAssignmentPackagesRequest, AssignedPackageResponse, AssignmentResponse,
    CreateAssignmentRequest, DeleteAssignmentQuery, PackageDelegationCheckResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_id;

pub async fn create_assignment_handler(
    State(state): State<AppState>,
    Extension(audit): Extension<AuditContext>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let assignment = state
        .assignment_service
        .create_assignment(
            &audit,
            CreateAssignmentInput {
                from_id: parse_id("from_id", payload.from_id.as_str(), EntityId::from_uuid)?,
                to_id: parse_id("to_id", payload.to_id.as_str(), EntityId::from_uuid)?,
                role_code: payload.role_code,
                force: payload.force,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from(assignment))))
}

pub async fn delete_assignment_handler(
    State(state): State<AppState>,
    Extension(audit): Extension<AuditContext>,
    Query(query): Query<DeleteAssignmentQuery>,
) -> ApiResult<Json<Option<AssignmentResponse>>> {
    let removed = state
        .assignment_service
        .delete_assignment(
            &audit,
            DeleteAssignmentInput {
                from_id: parse_id("from", query.from.as_str(), EntityId::from_uuid)?,
                to_id: parse_id("to", query.to.as_str(), EntityId::from_uuid)?,
                role_code: query.role_code,
                cascade: query.cascade,
            },
        )
        .await?;

    Ok(Json(removed.map(AssignmentResponse::from)))
}

pub async fn list_assignment_packages_handler(
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
) -> ApiResult<Json<Vec<AssignedPackageResponse>>> {
    let assignment_id = parse_id(
        "assignment id",
        assignment_id.as_str(),
        AssignmentId::from_uuid,
    )?;
    let packages = state
        .assignment_service
        .packages_for_assignment(assignment_id)
        .await?
        .into_iter()
        .map(AssignedPackageResponse::from)
        .collect();

    Ok(Json(packages))
}

pub async fn add_assignment_packages_handler(
    State(state): State<AppState>,
    Extension(audit): Extension<AuditContext>,
    Path(assignment_id): Path<String>,
    Json(payload): Json<AddAssignmentPackagesRequest>,
) -> ApiResult<Json<Vec<PackageDelegationCheckResponse>>> {
    let package_ids = payload
        .package_ids
        .iter()
        .map(|package_id| parse_id("package_ids", package_id.as_str(), PackageId::from_uuid))
        .collect::<Result<Vec<_>, _>>()?;

    let checks = state
        .assignment_service
        .add_packages_to_assignment(
            &audit,
            AddAssignmentPackagesInput {
                acting_id: parse_id("acting_id", payload.acting_id.as_str(), EntityId::from_uuid)?,
                assignment_id: parse_id(
                    "assignment id",
                    assignment_id.as_str(),
                    AssignmentId::from_uuid,
                )?,
                package_ids,
            },
        )
        .await?
        .into_iter()
        .map(PackageDelegationCheckResponse::from)
        .collect();

    Ok(Json(checks))
}
