mod assignments;
mod common;
mod permissions;
mod relations;

pub use assignments::{
    AddAssignmentPackagesRequest, AssignedPackageResponse, AssignmentResponse,
    CreateAssignmentRequest, CreateDelegationRequest, DelegationResponse, DeleteAssignmentQuery,
    DeleteDelegationQuery,
};
pub use common::{
    DependentGrantsResponse, HealthDependencyStatus, HealthResponse, ViolationResponse,
};
pub use permissions::{
    AssignablePackagesQuery, CompactEntityResponse, CompactPackageResponse,
    CompactResourceResponse, CompactRoleResponse, ConnectionListQuery, DelegationBasisResponse,
    PackageDelegationCheckResponse, PackagePermissionResponse, PartyConnectionResponse,
    PermissionListQuery, PermissionPathResponse, ResourcePermissionResponse,
};
pub use relations::{RelationListQuery, RelationResponse};
