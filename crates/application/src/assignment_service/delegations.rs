use accessmgmt_domain::{AssignmentId, Delegation, DelegationId};

use crate::DelegationQuery;

use super::*;

impl AssignmentService {
    /// Links two assignments through a facilitator.
    ///
    /// The source assignment must be granted to the facilitator and the target assignment
    /// must be granted by it. An identical stored delegation is returned as is.
    pub async fn create_delegation(
        &self,
        audit: &AuditContext,
        from_assignment_id: AssignmentId,
        to_assignment_id: AssignmentId,
        facilitator_id: EntityId,
    ) -> MutationResult<Delegation> {
        let (source, target) = tokio::try_join!(
            self.assignments.find_assignment(from_assignment_id),
            self.assignments.find_assignment(to_assignment_id),
        )?;

        let mut violations = ViolationBuilder::new();
        self.party_or_violation(facilitator_id, "facilitator_id", &mut violations)
            .await?;
        violations.ensure(source.is_some(), || {
            Violation::new(
                "assignment_not_found",
                "from_id",
                format!("assignment '{from_assignment_id}' does not exist"),
            )
        });
        violations.ensure(target.is_some(), || {
            Violation::new(
                "assignment_not_found",
                "to_id",
                format!("assignment '{to_assignment_id}' does not exist"),
            )
        });
        if let Some(source) = &source {
            violations.ensure(source.to_id == facilitator_id, || {
                Violation::new(
                    "facilitator_mismatch",
                    "from_id",
                    "source assignment is not granted to the facilitator",
                )
            });
        }
        if let Some(target) = &target {
            violations.ensure(target.from_id == facilitator_id, || {
                Violation::new(
                    "facilitator_mismatch",
                    "to_id",
                    "target assignment is not granted by the facilitator",
                )
            });
        }
        violations.finish()?;

        let existing = self
            .delegations
            .list_delegations(DelegationQuery {
                from_assignment_id: Some(from_assignment_id),
                to_assignment_id: Some(to_assignment_id),
                assignment_id: None,
                facilitator_id: Some(facilitator_id),
            })
            .await?;
        if let Some(delegation) = existing.into_iter().next() {
            return Ok(delegation);
        }

        let delegation = self
            .delegations
            .create_delegation(
                Delegation {
                    id: DelegationId::new(),
                    from_id: from_assignment_id,
                    to_id: to_assignment_id,
                    facilitator_id,
                },
                audit,
            )
            .await?;
        Self::log_write(audit, "delegation created", delegation.id);

        Ok(delegation)
    }

    /// Removes a delegation.
    ///
    /// Returns `Ok(None)` when the delegation does not exist. Attached packages and resources
    /// block the removal unless `cascade` is set.
    pub async fn delete_delegation(
        &self,
        audit: &AuditContext,
        delegation_id: DelegationId,
        cascade: bool,
    ) -> MutationResult<Option<Delegation>> {
        let Some(delegation) = self.delegations.find_delegation(delegation_id).await? else {
            return Ok(None);
        };

        if !cascade {
            let (packages, resources) = tokio::try_join!(
                self.packages.list_delegation_packages(std::slice::from_ref(&delegation.id)),
                self.resources.list_delegation_resources(std::slice::from_ref(&delegation.id)),
            )?;
            let dependents = DependentGrants {
                delegation_packages: packages.iter().map(|grant| grant.id).collect(),
                delegation_resources: resources.iter().map(|grant| grant.id).collect(),
                ..DependentGrants::default()
            };
            if !dependents.is_empty() {
                return Err(MutationError::DependentGrants(dependents));
            }
        }

        self.delegations
            .delete_delegation(delegation.id, audit)
            .await?;
        Self::log_write(audit, "delegation deleted", delegation.id);

        Ok(Some(delegation))
    }
}
