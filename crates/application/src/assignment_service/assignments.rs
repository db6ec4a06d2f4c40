use accessmgmt_domain::{Assignment, RelationFilter, RelationPredicate, RoleId};

use crate::{AssignmentQuery, DelegationQuery};

use super::*;

impl AssignmentService {
    /// Creates an explicit assignment or returns the one already stored.
    ///
    /// Unless `input.force` is set, the write is refused when the same
    /// `(from, to, role)` triple is already held through an indirect relation.
    pub async fn create_assignment(
        &self,
        audit: &AuditContext,
        input: CreateAssignmentInput,
    ) -> MutationResult<Assignment> {
        let role = self.role_by_code(&input.role_code).await?;

        let mut violations = ViolationBuilder::new();
        let from = self
            .party_or_violation(input.from_id, "from_id", &mut violations)
            .await?;
        self.party_or_violation(input.to_id, "to_id", &mut violations)
            .await?;
        if let Some(from) = &from {
            let is_organization = self.is_organization(from).await?;
            violations.ensure(is_organization, || {
                Violation::new(
                    "party_not_organization",
                    "from_id",
                    format!("party '{}' is not an organization", from.id),
                )
            });
        }
        violations.finish()?;

        if let Some(existing) = self
            .find_explicit(input.from_id, input.to_id, role.id)
            .await?
        {
            return Ok(existing);
        }

        if !input.force {
            let inherited: Vec<_> = self
                .permissions
                .resolver()
                .resolve_relations(
                    RelationFilter::any()
                        .with(RelationPredicate::From(input.from_id))
                        .with(RelationPredicate::To(input.to_id))
                        .with(RelationPredicate::Role(role.id)),
                )
                .await?
                .into_iter()
                .filter(|relation| !relation.reason.is_direct())
                .collect();
            if !inherited.is_empty() {
                return Err(MutationError::InheritedAssignment(inherited));
            }
        }

        let assignment = self
            .assignments
            .create_assignment(Assignment::new(input.from_id, input.to_id, role.id), audit)
            .await?;
        Self::log_write(audit, "assignment created", assignment.id);

        Ok(assignment)
    }

    /// Removes an explicit assignment.
    ///
    /// Returns `Ok(None)` when no such assignment exists. Package grants and delegations that
    /// reference the assignment block the removal unless `input.cascade` is set.
    pub async fn delete_assignment(
        &self,
        audit: &AuditContext,
        input: DeleteAssignmentInput,
    ) -> MutationResult<Option<Assignment>> {
        let role = self.role_by_code(&input.role_code).await?;

        let mut violations = ViolationBuilder::new();
        self.party_or_violation(input.from_id, "from_id", &mut violations)
            .await?;
        self.party_or_violation(input.to_id, "to_id", &mut violations)
            .await?;
        violations.ensure(role.is_assignable, || {
            Violation::new(
                "role_not_revocable",
                "role_code",
                format!("role '{}' cannot be revoked here", role.code),
            )
        });
        violations.finish()?;

        let Some(assignment) = self
            .find_explicit(input.from_id, input.to_id, role.id)
            .await?
        else {
            return Ok(None);
        };

        if !input.cascade {
            let (packages, delegations) = tokio::try_join!(
                self.packages.list_assignment_packages(std::slice::from_ref(&assignment.id)),
                self.delegations
                    .list_delegations(DelegationQuery::referencing(assignment.id)),
            )?;
            let dependents = DependentGrants {
                assignment_packages: packages.iter().map(|grant| grant.id).collect(),
                delegations: delegations.iter().map(|delegation| delegation.id).collect(),
                ..DependentGrants::default()
            };
            if !dependents.is_empty() {
                return Err(MutationError::DependentGrants(dependents));
            }
        }

        self.assignments
            .delete_assignment(assignment.id, audit)
            .await?;
        Self::log_write(audit, "assignment deleted", assignment.id);

        Ok(Some(assignment))
    }

    async fn find_explicit(
        &self,
        from_id: EntityId,
        to_id: EntityId,
        role_id: RoleId,
    ) -> AppResult<Option<Assignment>> {
        Ok(self
            .assignments
            .list_assignments(AssignmentQuery::by_key(from_id, to_id, role_id))
            .await?
            .into_iter()
            .next())
    }
}
