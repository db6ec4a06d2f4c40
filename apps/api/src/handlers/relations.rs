use accessmgmt_domain::{
    EntityId, PackageId, RelationFilter, RelationPredicate, ResourceId, RoleId,
};
use axum::Json;
use axum::extract::{Query, State};

use crate::dto::{RelationListQuery, RelationResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_optional_id;

pub async fn list_relations_handler(
    State(state): State<AppState>,
    Query(query): Query<RelationListQuery>,
) -> ApiResult<Json<Vec<RelationResponse>>> {
    let filter = relation_filter_from_query(&query)?;
    let relations = state
        .relation_resolver
        .resolve_relations(filter)
        .await?
        .into_iter()
        .map(RelationResponse::from)
        .collect();

    Ok(Json(relations))
}

pub async fn list_relations_with_packages_handler(
    State(state): State<AppState>,
    Query(query): Query<RelationListQuery>,
) -> ApiResult<Json<Vec<RelationResponse>>> {
    let filter = relation_filter_from_query(&query)?;
    let relations = state
        .relation_resolver
        .resolve_relations_with_packages(filter)
        .await?
        .into_iter()
        .map(RelationResponse::from)
        .collect();

    Ok(Json(relations))
}

fn relation_filter_from_query(query: &RelationListQuery) -> ApiResult<RelationFilter> {
    Ok(RelationFilter::any()
        .with_optional(
            parse_optional_id("from", query.from.as_deref(), EntityId::from_uuid)?,
            RelationPredicate::From,
        )
        .with_optional(
            parse_optional_id("to", query.to.as_deref(), EntityId::from_uuid)?,
            RelationPredicate::To,
        )
        .with_optional(
            parse_optional_id("role", query.role.as_deref(), RoleId::from_uuid)?,
            RelationPredicate::Role,
        )
        .with_optional(
            parse_optional_id(
                "facilitator",
                query.facilitator.as_deref(),
                EntityId::from_uuid,
            )?,
            RelationPredicate::Facilitator,
        )
        .with_optional(
            parse_optional_id("package", query.package.as_deref(), PackageId::from_uuid)?,
            RelationPredicate::Package,
        )
        .with_optional(
            parse_optional_id("resource", query.resource.as_deref(), ResourceId::from_uuid)?,
            RelationPredicate::Resource,
        ))
}
