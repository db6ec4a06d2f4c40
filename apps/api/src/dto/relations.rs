use accessmgmt_domain::Relation;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query parameters narrowing a relation listing.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/relation-list-query.ts"
)]
pub struct RelationListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub role: Option<String>,
    pub facilitator: Option<String>,
    pub package: Option<String>,
    pub resource: Option<String>,
}

/// API representation of a computed relation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/relation-response.ts"
)]
pub struct RelationResponse {
    pub from_id: String,
    pub role_id: String,
    pub via_id: Option<String>,
    pub via_role_id: Option<String>,
    pub to_id: String,
    pub package_id: Option<String>,
    pub resource_id: Option<String>,
    pub reason: String,
    pub package_source: Option<String>,
}

impl From<Relation> for RelationResponse {
    fn from(value: Relation) -> Self {
        Self {
            from_id: value.from_id.to_string(),
            role_id: value.role_id.to_string(),
            via_id: value.via_id.map(|id| id.to_string()),
            via_role_id: value.via_role_id.map(|id| id.to_string()),
            to_id: value.to_id.to_string(),
            package_id: value.package_id.map(|id| id.to_string()),
            resource_id: value.resource_id.map(|id| id.to_string()),
            reason: value.reason.to_string(),
            package_source: value
                .package_source
                .map(|source| source.as_str().to_owned()),
        }
    }
}
