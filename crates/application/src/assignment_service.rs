use std::sync::Arc;

use accessmgmt_core::{AppError, AppResult, AuditContext, Violation, ViolationBuilder};
use accessmgmt_domain::{AssignmentId, Entity, EntityId, EntityKind, PackageId, Role};
use tracing::info;

use crate::{
    AssignmentRepository, DelegationRepository, EntityRepository, PackageRepository,
    PermissionQueryService, ResourceRepository, RoleRepository,
};

mod assignments;
mod delegations;
mod errors;
mod packages;

#[cfg(test)]
mod tests;

pub use errors::{DependentGrants, MutationError, MutationResult};
pub use packages::AssignedPackage;

/// Input for creating an explicit assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssignmentInput {
    /// Granting party; must be an organization.
    pub from_id: EntityId,
    /// Receiving party.
    pub to_id: EntityId,
    /// Code of the role to grant.
    pub role_code: String,
    /// Create even when the relation is already held indirectly.
    pub force: bool,
}

/// Input for removing an explicit assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAssignmentInput {
    /// Granting party.
    pub from_id: EntityId,
    /// Receiving party.
    pub to_id: EntityId,
    /// Code of the granted role.
    pub role_code: String,
    /// Remove dependent package grants and delegations too.
    pub cascade: bool,
}

/// Input for attaching packages to an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAssignmentPackagesInput {
    /// Party passing the packages on; must hold them from the assignment's source.
    pub acting_id: EntityId,
    /// Target assignment.
    pub assignment_id: AssignmentId,
    /// Requested packages.
    pub package_ids: Vec<PackageId>,
}

/// Application service guarding writes to assignments and delegations.
#[derive(Clone)]
pub struct AssignmentService {
    permissions: PermissionQueryService,
    entities: Arc<dyn EntityRepository>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    delegations: Arc<dyn DelegationRepository>,
    packages: Arc<dyn PackageRepository>,
    resources: Arc<dyn ResourceRepository>,
}

impl AssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permissions: PermissionQueryService,
        entities: Arc<dyn EntityRepository>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        delegations: Arc<dyn DelegationRepository>,
        packages: Arc<dyn PackageRepository>,
        resources: Arc<dyn ResourceRepository>,
    ) -> Self {
        Self {
            permissions,
            entities,
            roles,
            assignments,
            delegations,
            packages,
            resources,
        }
    }

    async fn role_by_code(&self, role_code: &str) -> AppResult<Role> {
        self.roles
            .find_role_by_code(role_code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_code}' does not exist")))
    }

    /// Loads a party, recording `party_not_found` when it is missing.
    async fn party_or_violation(
        &self,
        party_id: EntityId,
        path: &str,
        violations: &mut ViolationBuilder,
    ) -> AppResult<Option<Entity>> {
        let entity = self.entities.find_entity(party_id).await?;
        violations.ensure(entity.is_some(), || {
            Violation::new(
                "party_not_found",
                path,
                format!("party '{party_id}' does not exist"),
            )
        });
        Ok(entity)
    }

    async fn is_organization(&self, entity: &Entity) -> AppResult<bool> {
        Ok(self
            .entities
            .find_entity_type(entity.type_id)
            .await?
            .is_some_and(|entity_type| entity_type.kind == EntityKind::Organization))
    }

    fn log_write(audit: &AuditContext, action: &str, subject: impl std::fmt::Display) {
        info!(
            operation_id = %audit.operation_id(),
            changed_by = %audit.changed_by(),
            subject = %subject,
            "{action}"
        );
    }
}
