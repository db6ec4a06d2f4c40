use std::sync::Arc;

use accessmgmt_core::{AppResult, AuditContext};
use accessmgmt_domain::{
    Assignment, AssignmentId, AssignmentKey, AssignmentPackage, AssignmentResource, Delegation,
    DelegationId, DelegationPackage, DelegationResource, Entity, EntityId, EntityType,
    EntityTypeId, Package, PackageId, Relation, RelationFilter, Resource, ResourceId, Role,
    RoleId, RoleMap, RolePackage,
};
use async_trait::async_trait;

use crate::ReferenceSnapshot;

use super::{AssignmentQuery, DelegationQuery, EntityQuery, RolePackageQuery};

/// Repository port for parties and party types.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Finds a party by id.
    async fn find_entity(&self, entity_id: EntityId) -> AppResult<Option<Entity>>;

    /// Lists parties matching the query.
    async fn list_entities(&self, query: EntityQuery) -> AppResult<Vec<Entity>>;

    /// Finds a party type by id.
    async fn find_entity_type(&self, type_id: EntityTypeId) -> AppResult<Option<EntityType>>;
}

/// Repository port for roles and the role-equivalence table.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by id.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by code.
    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>>;

    /// Lists roles by id.
    async fn list_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Role>>;

    /// Lists every role-map row.
    async fn list_role_maps(&self) -> AppResult<Vec<RoleMap>>;
}

/// Repository port for direct role grants.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Finds an assignment by id.
    async fn find_assignment(&self, assignment_id: AssignmentId)
    -> AppResult<Option<Assignment>>;

    /// Lists assignments matching the query.
    async fn list_assignments(&self, query: AssignmentQuery) -> AppResult<Vec<Assignment>>;

    /// Creates an assignment, returning the stored row when its key already exists.
    async fn create_assignment(
        &self,
        assignment: Assignment,
        audit: &AuditContext,
    ) -> AppResult<Assignment>;

    /// Deletes an assignment together with every grant that references it.
    async fn delete_assignment(
        &self,
        assignment_id: AssignmentId,
        audit: &AuditContext,
    ) -> AppResult<()>;

    /// Upserts assignments on their match key, returning the number of new rows.
    async fn merge_assignments(
        &self,
        assignments: &[Assignment],
        audit: &AuditContext,
    ) -> AppResult<u64>;

    /// Removes assignments by key with their dependent grants, returning the number removed.
    async fn remove_assignments(
        &self,
        keys: &[AssignmentKey],
        audit: &AuditContext,
    ) -> AppResult<u64>;
}

/// Repository port for delegations.
#[async_trait]
pub trait DelegationRepository: Send + Sync {
    /// Finds a delegation by id.
    async fn find_delegation(&self, delegation_id: DelegationId)
    -> AppResult<Option<Delegation>>;

    /// Lists delegations matching the query.
    async fn list_delegations(&self, query: DelegationQuery) -> AppResult<Vec<Delegation>>;

    /// Creates a delegation, returning the stored row when the same link already exists.
    async fn create_delegation(
        &self,
        delegation: Delegation,
        audit: &AuditContext,
    ) -> AppResult<Delegation>;

    /// Deletes a delegation together with its package and resource grants.
    async fn delete_delegation(
        &self,
        delegation_id: DelegationId,
        audit: &AuditContext,
    ) -> AppResult<()>;
}

/// Repository port for packages and package grants.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Lists packages by id, or every package when `package_ids` is `None`.
    async fn list_packages(&self, package_ids: Option<&[PackageId]>) -> AppResult<Vec<Package>>;

    /// Lists role-level package grants matching the query.
    async fn list_role_packages(&self, query: RolePackageQuery) -> AppResult<Vec<RolePackage>>;

    /// Lists package grants attached to the given assignments.
    async fn list_assignment_packages(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> AppResult<Vec<AssignmentPackage>>;

    /// Lists package grants attached to the given delegations.
    async fn list_delegation_packages(
        &self,
        delegation_ids: &[DelegationId],
    ) -> AppResult<Vec<DelegationPackage>>;

    /// Attaches packages to an assignment, skipping ones already attached.
    async fn add_assignment_packages(
        &self,
        assignment_id: AssignmentId,
        package_ids: &[PackageId],
        audit: &AuditContext,
    ) -> AppResult<Vec<AssignmentPackage>>;
}

/// Repository port for resources and resource grants.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Lists resources by id.
    async fn list_resources(&self, resource_ids: &[ResourceId]) -> AppResult<Vec<Resource>>;

    /// Lists resource grants attached to the given assignments.
    async fn list_assignment_resources(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> AppResult<Vec<AssignmentResource>>;

    /// Lists resource grants attached to the given delegations.
    async fn list_delegation_resources(
        &self,
        delegation_ids: &[DelegationId],
    ) -> AppResult<Vec<DelegationResource>>;
}

/// Source of precomputed relation rows merged into resolver output as-is.
#[async_trait]
pub trait RelationSupplementRepository: Send + Sync {
    /// Lists supplement rows for the filter. The resolver does not re-filter them.
    async fn list_supplement_relations(&self, filter: &RelationFilter)
    -> AppResult<Vec<Relation>>;
}

/// Loads an immutable view of the reference stores for one or more resolutions.
#[async_trait]
pub trait ReferenceSnapshotSource: Send + Sync {
    /// Returns a consistent snapshot of reference data.
    async fn load_snapshot(&self) -> AppResult<Arc<ReferenceSnapshot>>;
}
