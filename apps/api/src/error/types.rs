use serde::Serialize;
use ts_rs::TS;

use crate::dto::{DependentGrantsResponse, RelationResponse, ViolationResponse};

/// API error payload.
///
/// Rejected writes carry their evidence: failed preconditions, the indirect relations that
/// already grant the requested assignment, or the rows still depending on a grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    pub(super) message: String,
    pub(super) violations: Vec<ViolationResponse>,
    pub(super) relations: Vec<RelationResponse>,
    pub(super) dependents: Option<DependentGrantsResponse>,
}

impl ErrorResponse {
    pub(super) fn new(message: String) -> Self {
        Self {
            message,
            violations: Vec::new(),
            relations: Vec::new(),
            dependents: None,
        }
    }
}
