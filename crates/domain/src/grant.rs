use serde::{Deserialize, Serialize};

use crate::ids::{
    AssignmentId, AssignmentPackageId, AssignmentResourceId, DelegationId, DelegationPackageId,
    DelegationResourceId, EntityId, PackageId, ProviderId, ResourceId, RoleId,
};

/// Direct role grant: `from_id` grants `role_id` to `to_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    /// Stable assignment id.
    pub id: AssignmentId,
    /// Granting party.
    pub from_id: EntityId,
    /// Receiving party.
    pub to_id: EntityId,
    /// Granted role.
    pub role_id: RoleId,
}

impl Assignment {
    /// Creates an assignment with a fresh id.
    #[must_use]
    pub fn new(from_id: EntityId, to_id: EntityId, role_id: RoleId) -> Self {
        Self {
            id: AssignmentId::new(),
            from_id,
            to_id,
            role_id,
        }
    }

    /// Returns the uniqueness key of this assignment.
    #[must_use]
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey {
            from_id: self.from_id,
            to_id: self.to_id,
            role_id: self.role_id,
        }
    }
}

/// Uniqueness key of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentKey {
    /// Granting party.
    pub from_id: EntityId,
    /// Receiving party.
    pub to_id: EntityId,
    /// Granted role.
    pub role_id: RoleId,
}

/// Grant linking two assignments through a facilitator.
///
/// `Assignment(from_id).to_id` and `Assignment(to_id).from_id` are both the facilitator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delegation {
    /// Stable delegation id.
    pub id: DelegationId,
    /// Assignment held by the client towards the facilitator.
    pub from_id: AssignmentId,
    /// Assignment held by the facilitator towards the agent.
    pub to_id: AssignmentId,
    /// Party mediating the delegation.
    pub facilitator_id: EntityId,
}

/// Grantable capability bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Stable package id.
    pub id: PackageId,
    /// Package urn.
    pub urn: String,
    /// Display name.
    pub name: String,
    /// Whether the package may be attached to assignments.
    pub is_assignable: bool,
    /// Whether the package may be attached to delegations.
    pub is_delegable: bool,
}

/// Grantable single service or resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable resource id.
    pub id: ResourceId,
    /// Reference id within the provider.
    pub ref_id: String,
    /// Provider publishing the resource.
    pub provider_id: ProviderId,
    /// Display name.
    pub name: String,
}

/// Role-level default package grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePackage {
    /// Role carrying the package.
    pub role_id: RoleId,
    /// Package granted.
    pub package_id: PackageId,
    /// Holders of the role have the package.
    pub has_access: bool,
    /// Holders of the role may pass the package on.
    pub can_delegate: bool,
}

/// Package attached to a single assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentPackage {
    /// Stable row id.
    pub id: AssignmentPackageId,
    /// Owning assignment.
    pub assignment_id: AssignmentId,
    /// Package granted.
    pub package_id: PackageId,
}

/// Package attached to a single delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationPackage {
    /// Stable row id.
    pub id: DelegationPackageId,
    /// Owning delegation.
    pub delegation_id: DelegationId,
    /// Package granted.
    pub package_id: PackageId,
}

/// Resource attached to a single assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentResource {
    /// Stable row id.
    pub id: AssignmentResourceId,
    /// Owning assignment.
    pub assignment_id: AssignmentId,
    /// Resource granted.
    pub resource_id: ResourceId,
}

/// Resource attached to a single delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationResource {
    /// Stable row id.
    pub id: DelegationResourceId,
    /// Owning delegation.
    pub delegation_id: DelegationId,
    /// Resource granted.
    pub resource_id: ResourceId,
}
