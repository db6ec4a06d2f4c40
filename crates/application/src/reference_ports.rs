mod queries;
mod repositories;

pub use queries::{AssignmentQuery, DelegationQuery, EntityQuery, RolePackageQuery};
pub use repositories::{
    AssignmentRepository, DelegationRepository, EntityRepository, PackageRepository,
    ReferenceSnapshotSource, RelationSupplementRepository, ResourceRepository, RoleRepository,
};
