use accessmgmt_core::AuditContext;
use accessmgmt_domain::{AssignmentId, DelegationId, EntityId};
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use crate::dto::{CreateDelegationRequest, DelegationResponse, DeleteDelegationQuery};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_id;

pub async fn create_delegation_handler(
    State(state): State<AppState>,
    Extension(audit): Extension<AuditContext>,
    Json(payload): Json<CreateDelegationRequest>,
) -> ApiResult<(StatusCode, Json<DelegationResponse>)> {
    let delegation = state
        .assignment_service
        .create_delegation(
            &audit,
            parse_id(
                "from_assignment_id",
                payload.from_assignment_id.as_str(),
                AssignmentId::from_uuid,
            )?,
            parse_id(
                "to_assignment_id",
                payload.to_assignment_id.as_str(),
                AssignmentId::from_uuid,
            )?,
            parse_id(
                "facilitator_id",
                payload.facilitator_id.as_str(),
                EntityId::from_uuid,
            )?,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DelegationResponse::from(delegation))))
}

pub async fn delete_delegation_handler(
    State(state): State<AppState>,
    Extension(audit): Extension<AuditContext>,
    Path(delegation_id): Path<String>,
    Query(query): Query<DeleteDelegationQuery>,
) -> ApiResult<Json<Option<DelegationResponse>>> {
    let delegation_id = parse_id(
        "delegation id",
        delegation_id.as_str(),
        DelegationId::from_uuid,
    )?;
    let removed = state
        .assignment_service
        .delete_delegation(&audit, delegation_id, query.cascade)
        .await?;

    Ok(Json(removed.map(DelegationResponse::from)))
}
