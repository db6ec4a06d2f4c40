use accessmgmt_core::{AppError, Violation};
use accessmgmt_domain::{
    AssignmentPackageId, DelegationId, DelegationPackageId, DelegationResourceId, Relation,
};
use serde::Serialize;
use thiserror::Error;

/// Result type of guarded writes.
pub type MutationResult<T> = Result<T, MutationError>;

/// Rows still referencing a grant that is about to be removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependentGrants {
    /// Packages attached to the assignment.
    pub assignment_packages: Vec<AssignmentPackageId>,
    /// Delegations using the assignment on either side.
    pub delegations: Vec<DelegationId>,
    /// Packages attached to the delegation.
    pub delegation_packages: Vec<DelegationPackageId>,
    /// Resources attached to the delegation.
    pub delegation_resources: Vec<DelegationResourceId>,
}

impl DependentGrants {
    /// Returns the number of dependent rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assignment_packages.len()
            + self.delegations.len()
            + self.delegation_packages.len()
            + self.delegation_resources.len()
    }

    /// Returns whether nothing depends on the grant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Failure of a guarded write. Conflicts carry their evidence.
#[derive(Debug, Error)]
pub enum MutationError {
    /// One or more structural preconditions failed.
    #[error("validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    /// The requested assignment is already held through indirect relations.
    #[error("assignment is already held through {} indirect relation(s)", .0.len())]
    InheritedAssignment(Vec<Relation>),

    /// The grant is still referenced and cascading was not requested.
    #[error("grant is referenced by {} dependent row(s)", .0.len())]
    DependentGrants(DependentGrants),

    /// Lookup or store failure.
    #[error(transparent)]
    App(#[from] AppError),
}

impl From<Vec<Violation>> for MutationError {
    fn from(violations: Vec<Violation>) -> Self {
        Self::Validation(violations)
    }
}
