use accessmgmt_application::AssignedPackage;
use accessmgmt_domain::{Assignment, Delegation};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::CompactPackageResponse;

/// Incoming payload for assignment creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-assignment-request.ts"
)]
pub struct CreateAssignmentRequest {
    pub from_id: String,
    pub to_id: String,
    pub role_code: String,
    #[serde(default)]
    pub force: bool,
}

/// Query parameters identifying the assignment to remove.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/delete-assignment-query.ts"
)]
pub struct DeleteAssignmentQuery {
    pub from: String,
    pub to: String,
    pub role_code: String,
    #[serde(default)]
    pub cascade: bool,
}

/// API representation of an explicit assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-response.ts"
)]
pub struct AssignmentResponse {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub role_id: String,
}

impl From<Assignment> for AssignmentResponse {
    fn from(value: Assignment) -> Self {
        Self {
            id: value.id.to_string(),
            from_id: value.from_id.to_string(),
            to_id: value.to_id.to_string(),
            role_id: value.role_id.to_string(),
        }
    }
}

/// Incoming payload for attaching packages to an assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-assignment-packages-request.ts"
)]
pub struct AddAssignmentPackagesRequest {
    pub acting_id: String,
    pub package_ids: Vec<String>,
}

/// Package available through an assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assigned-package-response.ts"
)]
pub struct AssignedPackageResponse {
    pub package: CompactPackageResponse,
    pub source: String,
}

impl From<AssignedPackage> for AssignedPackageResponse {
    fn from(value: AssignedPackage) -> Self {
        Self {
            package: value.package.into(),
            source: value.source.as_str().to_owned(),
        }
    }
}

/// Incoming payload for delegation creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-delegation-request.ts"
)]
pub struct CreateDelegationRequest {
    pub from_assignment_id: String,
    pub to_assignment_id: String,
    pub facilitator_id: String,
}

/// Query parameters of delegation removal.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/delete-delegation-query.ts"
)]
pub struct DeleteDelegationQuery {
    #[serde(default)]
    pub cascade: bool,
}

/// API representation of a delegation.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/delegation-response.ts"
)]
pub struct DelegationResponse {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub facilitator_id: String,
}

impl From<Delegation> for DelegationResponse {
    fn from(value: Delegation) -> Self {
        Self {
            id: value.id.to_string(),
            from_id: value.from_id.to_string(),
            to_id: value.to_id.to_string(),
            facilitator_id: value.facilitator_id.to_string(),
        }
    }
}
