//! Immutable, indexed view of the reference stores.
//!
//! A snapshot is built once per operation (or shared across many) and handed to the relation
//! pipeline. It replaces ad-hoc caches of roles and grants with explicit lookup maps:
//! `role -> is_key_role`, `has_role -> get_roles`, `parent -> children`, `from -> assignments`
//! and grant-id keyed package/resource tables.

use std::collections::{HashMap, HashSet};

use accessmgmt_domain::{
    Assignment, AssignmentId, AssignmentPackage, AssignmentResource, Delegation, DelegationId,
    DelegationPackage, DelegationResource, Entity, EntityId, PackageId, ResourceId, Role, RoleId,
    RoleMap, RolePackage,
};

/// Raw reference rows a snapshot is built from.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    /// Parties.
    pub entities: Vec<Entity>,
    /// Roles.
    pub roles: Vec<Role>,
    /// Role-equivalence rows.
    pub role_maps: Vec<RoleMap>,
    /// Direct role grants.
    pub assignments: Vec<Assignment>,
    /// Assignment-to-assignment grants.
    pub delegations: Vec<Delegation>,
    /// Role-level package grants.
    pub role_packages: Vec<RolePackage>,
    /// Assignment-level package grants.
    pub assignment_packages: Vec<AssignmentPackage>,
    /// Delegation-level package grants.
    pub delegation_packages: Vec<DelegationPackage>,
    /// Assignment-level resource grants.
    pub assignment_resources: Vec<AssignmentResource>,
    /// Delegation-level resource grants.
    pub delegation_resources: Vec<DelegationResource>,
}

/// Indexed reference data shared by concurrent resolutions.
#[derive(Debug, Default)]
pub struct ReferenceSnapshot {
    entities: HashMap<EntityId, Entity>,
    children: HashMap<EntityId, Vec<EntityId>>,
    roles: HashMap<RoleId, Role>,
    key_roles: HashSet<RoleId>,
    mapped_roles: HashMap<RoleId, Vec<RoleId>>,
    map_sources: HashMap<RoleId, Vec<RoleId>>,
    assignments: HashMap<AssignmentId, Assignment>,
    assignments_by_from: HashMap<EntityId, Vec<AssignmentId>>,
    assignments_by_to: HashMap<EntityId, Vec<AssignmentId>>,
    delegations: Vec<Delegation>,
    delegations_by_client: HashMap<EntityId, Vec<usize>>,
    delegations_by_facilitator: HashMap<EntityId, Vec<usize>>,
    role_packages: HashMap<RoleId, Vec<RolePackage>>,
    assignment_packages: HashMap<AssignmentId, Vec<PackageId>>,
    delegation_packages: HashMap<DelegationId, Vec<PackageId>>,
    assignment_resources: HashMap<AssignmentId, Vec<ResourceId>>,
    delegation_resources: HashMap<DelegationId, Vec<ResourceId>>,
}

impl ReferenceSnapshot {
    /// Builds the lookup maps from raw rows.
    #[must_use]
    pub fn from_data(data: ReferenceData) -> Self {
        let mut snapshot = Self::default();

        for entity in data.entities {
            if let Some(parent_id) = entity.parent_id {
                snapshot
                    .children
                    .entry(parent_id)
                    .or_default()
                    .push(entity.id);
            }
            snapshot.entities.insert(entity.id, entity);
        }

        for role in data.roles {
            if role.is_key_role {
                snapshot.key_roles.insert(role.id);
            }
            snapshot.roles.insert(role.id, role);
        }

        for role_map in data.role_maps {
            push_unique(
                snapshot.mapped_roles.entry(role_map.has_role_id).or_default(),
                role_map.get_role_id,
            );
            push_unique(
                snapshot.map_sources.entry(role_map.get_role_id).or_default(),
                role_map.has_role_id,
            );
        }

        for assignment in data.assignments {
            snapshot
                .assignments_by_from
                .entry(assignment.from_id)
                .or_default()
                .push(assignment.id);
            snapshot
                .assignments_by_to
                .entry(assignment.to_id)
                .or_default()
                .push(assignment.id);
            snapshot.assignments.insert(assignment.id, assignment);
        }

        for delegation in data.delegations {
            let Some(client_id) = snapshot
                .assignments
                .get(&delegation.from_id)
                .map(|assignment| assignment.from_id)
            else {
                continue;
            };
            if !snapshot.assignments.contains_key(&delegation.to_id) {
                continue;
            }

            let index = snapshot.delegations.len();
            snapshot
                .delegations_by_client
                .entry(client_id)
                .or_default()
                .push(index);
            snapshot
                .delegations_by_facilitator
                .entry(delegation.facilitator_id)
                .or_default()
                .push(index);
            snapshot.delegations.push(delegation);
        }

        for role_package in data.role_packages {
            snapshot
                .role_packages
                .entry(role_package.role_id)
                .or_default()
                .push(role_package);
        }
        for grant in data.assignment_packages {
            push_unique(
                snapshot
                    .assignment_packages
                    .entry(grant.assignment_id)
                    .or_default(),
                grant.package_id,
            );
        }
        for grant in data.delegation_packages {
            push_unique(
                snapshot
                    .delegation_packages
                    .entry(grant.delegation_id)
                    .or_default(),
                grant.package_id,
            );
        }
        for grant in data.assignment_resources {
            push_unique(
                snapshot
                    .assignment_resources
                    .entry(grant.assignment_id)
                    .or_default(),
                grant.resource_id,
            );
        }
        for grant in data.delegation_resources {
            push_unique(
                snapshot
                    .delegation_resources
                    .entry(grant.delegation_id)
                    .or_default(),
                grant.resource_id,
            );
        }

        snapshot
    }

    /// Returns a party by id.
    #[must_use]
    pub fn entity(&self, entity_id: EntityId) -> Option<&Entity> {
        self.entities.get(&entity_id)
    }

    /// Returns the immediate parent of a party.
    #[must_use]
    pub fn parent_of(&self, entity_id: EntityId) -> Option<EntityId> {
        self.entities
            .get(&entity_id)
            .and_then(|entity| entity.parent_id)
    }

    /// Returns the direct subunits of a party.
    #[must_use]
    pub fn children_of(&self, entity_id: EntityId) -> &[EntityId] {
        self.children
            .get(&entity_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns a role by id.
    #[must_use]
    pub fn role(&self, role_id: RoleId) -> Option<&Role> {
        self.roles.get(&role_id)
    }

    /// Returns whether the role is flagged as key role.
    #[must_use]
    pub fn is_key_role(&self, role_id: RoleId) -> bool {
        self.key_roles.contains(&role_id)
    }

    /// Roles implied by holding `role_id`.
    #[must_use]
    pub fn mapped_roles(&self, role_id: RoleId) -> &[RoleId] {
        self.mapped_roles
            .get(&role_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Roles whose holders are implicitly granted `role_id`.
    #[must_use]
    pub fn map_sources(&self, role_id: RoleId) -> &[RoleId] {
        self.map_sources
            .get(&role_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns an assignment by id.
    #[must_use]
    pub fn assignment(&self, assignment_id: AssignmentId) -> Option<&Assignment> {
        self.assignments.get(&assignment_id)
    }

    /// Iterates all assignments.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    /// Iterates assignments granted by a party.
    pub fn assignments_from(&self, entity_id: EntityId) -> impl Iterator<Item = &Assignment> {
        self.assignments_by_from
            .get(&entity_id)
            .into_iter()
            .flatten()
            .filter_map(|assignment_id| self.assignments.get(assignment_id))
    }

    /// Iterates assignments received by a party.
    pub fn assignments_to(&self, entity_id: EntityId) -> impl Iterator<Item = &Assignment> {
        self.assignments_by_to
            .get(&entity_id)
            .into_iter()
            .flatten()
            .filter_map(|assignment_id| self.assignments.get(assignment_id))
    }

    /// Iterates delegations whose link is intact.
    pub fn delegations(&self) -> impl Iterator<Item = &Delegation> {
        self.delegations.iter()
    }

    /// Iterates delegations whose source assignment is granted by `client_id`.
    pub fn delegations_from_client(&self, client_id: EntityId) -> impl Iterator<Item = &Delegation> {
        self.indexed_delegations(self.delegations_by_client.get(&client_id))
    }

    /// Iterates delegations mediated by `facilitator_id`.
    pub fn delegations_by_facilitator(
        &self,
        facilitator_id: EntityId,
    ) -> impl Iterator<Item = &Delegation> {
        self.indexed_delegations(self.delegations_by_facilitator.get(&facilitator_id))
    }

    /// Role-level package grants of a role.
    #[must_use]
    pub fn role_packages(&self, role_id: RoleId) -> &[RolePackage] {
        self.role_packages
            .get(&role_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Packages attached to an assignment.
    #[must_use]
    pub fn assignment_packages(&self, assignment_id: AssignmentId) -> &[PackageId] {
        self.assignment_packages
            .get(&assignment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Packages attached to a delegation.
    #[must_use]
    pub fn delegation_packages(&self, delegation_id: DelegationId) -> &[PackageId] {
        self.delegation_packages
            .get(&delegation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resources attached to an assignment.
    #[must_use]
    pub fn assignment_resources(&self, assignment_id: AssignmentId) -> &[ResourceId] {
        self.assignment_resources
            .get(&assignment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resources attached to a delegation.
    #[must_use]
    pub fn delegation_resources(&self, delegation_id: DelegationId) -> &[ResourceId] {
        self.delegation_resources
            .get(&delegation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn indexed_delegations<'a>(
        &'a self,
        indexes: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a Delegation> {
        indexes
            .into_iter()
            .flatten()
            .filter_map(|index| self.delegations.get(*index))
    }
}

fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use accessmgmt_domain::{Assignment, Delegation, DelegationId, EntityId, RoleId, RoleMap};

    use super::{ReferenceData, ReferenceSnapshot};
    use crate::test_support::{organization, role};

    #[test]
    fn snapshot_indexes_children_and_role_maps() {
        let parent = organization("Parent");
        let child = organization("Child").with_parent(parent.id);
        let has_role = RoleId::new();
        let get_role = RoleId::new();

        let snapshot = ReferenceSnapshot::from_data(ReferenceData {
            entities: vec![parent.clone(), child.clone()],
            role_maps: vec![
                RoleMap {
                    has_role_id: has_role,
                    get_role_id: get_role,
                },
                RoleMap {
                    has_role_id: has_role,
                    get_role_id: get_role,
                },
            ],
            ..ReferenceData::default()
        });

        assert_eq!(snapshot.children_of(parent.id), &[child.id]);
        assert_eq!(snapshot.parent_of(child.id), Some(parent.id));
        assert_eq!(snapshot.mapped_roles(has_role), &[get_role]);
        assert_eq!(snapshot.map_sources(get_role), &[has_role]);
    }

    #[test]
    fn snapshot_skips_delegations_with_dangling_assignments() {
        let key_role = role("daglig-leder", true);
        let client = EntityId::new();
        let facilitator = EntityId::new();
        let source = Assignment::new(client, facilitator, key_role.id);
        let dangling = Delegation {
            id: DelegationId::new(),
            from_id: source.id,
            to_id: accessmgmt_domain::AssignmentId::new(),
            facilitator_id: facilitator,
        };

        let snapshot = ReferenceSnapshot::from_data(ReferenceData {
            roles: vec![key_role.clone()],
            assignments: vec![source],
            delegations: vec![dangling],
            ..ReferenceData::default()
        });

        assert!(snapshot.is_key_role(key_role.id));
        assert_eq!(snapshot.assignments_from(client).count(), 1);
        assert_eq!(snapshot.delegations().count(), 0);
        assert_eq!(snapshot.delegations_from_client(client).count(), 0);
    }
}
