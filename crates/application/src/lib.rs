//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_service;
mod assignment_sync_service;
mod permission_query_service;
mod reference_ports;
mod reference_snapshot;
mod relation_resolver;
mod sync_ports;

#[cfg(test)]
mod test_support;

pub use assignment_service::{
    AddAssignmentPackagesInput, AssignedPackage, AssignmentService, CreateAssignmentInput,
    DeleteAssignmentInput, DependentGrants, MutationError, MutationResult,
};
pub use assignment_sync_service::{
    AssignmentSyncConfig, AssignmentSyncService, FlushReason, StagedBatch, StagedRows,
    SyncSummary,
};
pub use permission_query_service::{
    CompactEntity, CompactPackage, CompactResource, CompactRole, ConnectionQuery,
    DelegationBasis, PackageDelegationCheck, PackagePermission, PackagePermissionQuery,
    PartyConnection, PermissionDirection, PermissionPath, PermissionQueryService,
    ResourcePermission, ResourcePermissionQuery,
};
pub use reference_ports::{
    AssignmentQuery, AssignmentRepository, DelegationQuery, DelegationRepository, EntityQuery,
    EntityRepository, PackageRepository, ReferenceSnapshotSource, RelationSupplementRepository,
    ResourceRepository, RolePackageQuery, RoleRepository,
};
pub use reference_snapshot::{ReferenceData, ReferenceSnapshot};
pub use relation_resolver::{
    RelationResolver, RelationSet, ResolverConfig, derive_relations,
    derive_relations_with_packages,
};
pub use sync_ports::{
    AssignmentEvent, AssignmentEventKind, AssignmentEventPage, AssignmentEventSource,
    SyncCursorRepository,
};
