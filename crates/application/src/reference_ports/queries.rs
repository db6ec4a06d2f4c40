use accessmgmt_domain::{AssignmentId, EntityId, PackageId, RoleId};

/// Filtered party lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    /// Restricts to these ids when set.
    pub ids: Option<Vec<EntityId>>,
    /// Restricts to direct subunits of this party when set.
    pub parent_id: Option<EntityId>,
}

impl EntityQuery {
    /// Looks up the given parties.
    #[must_use]
    pub fn by_ids(ids: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            parent_id: None,
        }
    }
}

/// Filtered assignment lookup. Absent fields match any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
    /// Granting party.
    pub from_id: Option<EntityId>,
    /// Receiving party.
    pub to_id: Option<EntityId>,
    /// Granted role.
    pub role_id: Option<RoleId>,
}

impl AssignmentQuery {
    /// Looks up the assignment with the given uniqueness key.
    #[must_use]
    pub fn by_key(from_id: EntityId, to_id: EntityId, role_id: RoleId) -> Self {
        Self {
            from_id: Some(from_id),
            to_id: Some(to_id),
            role_id: Some(role_id),
        }
    }
}

/// Filtered delegation lookup. Absent fields match any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegationQuery {
    /// Delegations whose source assignment is this one.
    pub from_assignment_id: Option<AssignmentId>,
    /// Delegations whose target assignment is this one.
    pub to_assignment_id: Option<AssignmentId>,
    /// Delegations referencing this assignment on either side.
    pub assignment_id: Option<AssignmentId>,
    /// Delegations mediated by this party.
    pub facilitator_id: Option<EntityId>,
}

impl DelegationQuery {
    /// Delegations referencing the assignment as source or target.
    #[must_use]
    pub fn referencing(assignment_id: AssignmentId) -> Self {
        Self {
            assignment_id: Some(assignment_id),
            ..Self::default()
        }
    }
}

/// Filtered role-package lookup. Absent fields match any value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePackageQuery {
    /// Restricts to these roles when set.
    pub role_ids: Option<Vec<RoleId>>,
    /// Restricts to one package when set.
    pub package_id: Option<PackageId>,
}

impl RolePackageQuery {
    /// Role packages of the given roles.
    #[must_use]
    pub fn for_roles(role_ids: impl IntoIterator<Item = RoleId>) -> Self {
        Self {
            role_ids: Some(role_ids.into_iter().collect()),
            package_id: None,
        }
    }
}
