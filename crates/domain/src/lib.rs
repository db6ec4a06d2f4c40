//! Domain entities and invariants for relation resolution.

#![forbid(unsafe_code)]

mod grant;
mod ids;
mod match_key;
mod party;
mod relation;
mod relation_filter;
mod role;

pub use grant::{
    Assignment, AssignmentKey, AssignmentPackage, AssignmentResource, Delegation,
    DelegationPackage, DelegationResource, Package, Resource, RolePackage,
};
pub use ids::{
    AssignmentId, AssignmentPackageId, AssignmentResourceId, DelegationId, DelegationPackageId,
    DelegationResourceId, EntityId, EntityTypeId, EntityVariantId, PackageId, ProviderId,
    ResourceId, RoleId,
};
pub use match_key::MatchKey;
pub use party::{Entity, EntityKind, EntityLookup, EntityType};
pub use relation::{PackageSource, Relation, RelationKey, RelationOrigin, RelationReason};
pub use relation_filter::{RelationFilter, RelationPredicate};
pub use role::{Role, RoleMap};
