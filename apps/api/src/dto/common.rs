use accessmgmt_application::DependentGrants;
use accessmgmt_core::Violation;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
}

/// Status of one backing dependency.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// One failed precondition of a rejected write.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/violation-response.ts"
)]
pub struct ViolationResponse {
    pub code: String,
    pub path: String,
    pub detail: String,
}

impl From<Violation> for ViolationResponse {
    fn from(value: Violation) -> Self {
        Self {
            code: value.code,
            path: value.path,
            detail: value.detail,
        }
    }
}

/// Rows that still reference a grant selected for removal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dependent-grants-response.ts"
)]
pub struct DependentGrantsResponse {
    pub assignment_packages: Vec<String>,
    pub delegations: Vec<String>,
    pub delegation_packages: Vec<String>,
    pub delegation_resources: Vec<String>,
}

impl From<DependentGrants> for DependentGrantsResponse {
    fn from(value: DependentGrants) -> Self {
        Self {
            assignment_packages: value
                .assignment_packages
                .iter()
                .map(ToString::to_string)
                .collect(),
            delegations: value.delegations.iter().map(ToString::to_string).collect(),
            delegation_packages: value
                .delegation_packages
                .iter()
                .map(ToString::to_string)
                .collect(),
            delegation_resources: value
                .delegation_resources
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}
