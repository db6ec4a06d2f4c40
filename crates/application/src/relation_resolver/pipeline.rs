use std::collections::HashSet;

use accessmgmt_domain::{
    Assignment, AssignmentId, DelegationId, EntityId, Relation, RelationFilter, RelationReason,
    RoleId,
};

use crate::ReferenceSnapshot;

use super::RelationSet;

/// Grant a derived relation stems from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum GrantRef {
    Assignment(AssignmentId),
    Delegation(DelegationId),
}

/// Relation together with its originating grant.
#[derive(Debug, Clone, Copy)]
pub(super) struct Derived {
    pub(super) relation: Relation,
    pub(super) grant: GrantRef,
}

/// Derives every relation matching `filter` from the snapshot.
///
/// Package and resource predicates of `filter` are ignored.
#[must_use]
pub fn derive_relations(snapshot: &ReferenceSnapshot, filter: &RelationFilter) -> RelationSet {
    let filter = filter.without_overlay();
    derive(snapshot, &filter)
        .into_iter()
        .map(|derived| derived.relation)
        .filter(|relation| filter.matches(relation))
        .collect()
}

/// Runs the bounded Step 1 -> Step 2 -> Step 3 composition.
///
/// Output is not yet checked against `filter`; generators only prune candidates that cannot
/// contribute to a matching relation.
pub(super) fn derive(snapshot: &ReferenceSnapshot, filter: &RelationFilter) -> Vec<Derived> {
    let scope = GeneratorScope::new(snapshot, filter);

    let base = base_relations(snapshot, &scope);
    let mapped = role_map_relations(snapshot, &base);
    let keyed = key_role_relations(snapshot, base.iter().chain(mapped.iter()));

    let mut derived = base;
    derived.extend(mapped);
    derived.extend(keyed);
    derived
}

/// Candidate bounds for Step 1 derived from the caller's filter.
///
/// Step 2 rewrites the role and Step 3 rewrites the receiving party, so the base step admits
/// every role mapping onto the requested role and every party holding a key role towards the
/// requested receiver.
struct GeneratorScope {
    from_id: Option<EntityId>,
    to_ids: Option<HashSet<EntityId>>,
    role_ids: Option<HashSet<RoleId>>,
    facilitator_id: Option<EntityId>,
}

impl GeneratorScope {
    fn new(snapshot: &ReferenceSnapshot, filter: &RelationFilter) -> Self {
        let role_ids = filter.role_id().map(|role_id| {
            std::iter::once(role_id)
                .chain(snapshot.map_sources(role_id).iter().copied())
                .collect()
        });
        let to_ids = filter.to_id().map(|to_id| {
            std::iter::once(to_id)
                .chain(
                    snapshot
                        .assignments_to(to_id)
                        .filter(|assignment| snapshot.is_key_role(assignment.role_id))
                        .map(|assignment| assignment.from_id),
                )
                .collect()
        });

        Self {
            from_id: filter.from_id(),
            to_ids,
            role_ids,
            facilitator_id: filter.facilitator_id(),
        }
    }

    fn admits(&self, relation: &Relation) -> bool {
        self.from_id.is_none_or(|from_id| relation.from_id == from_id)
            && self
                .to_ids
                .as_ref()
                .is_none_or(|to_ids| to_ids.contains(&relation.to_id))
            && self
                .role_ids
                .as_ref()
                .is_none_or(|role_ids| role_ids.contains(&relation.role_id))
    }
}

fn base_relations(snapshot: &ReferenceSnapshot, scope: &GeneratorScope) -> Vec<Derived> {
    let mut derived = Vec::new();

    // Only delegations carry a facilitator.
    if scope.facilitator_id.is_none() {
        direct_relations(snapshot, scope, &mut derived);
        parent_relations(snapshot, scope, &mut derived);
    }
    delegation_relations(snapshot, scope, &mut derived);

    derived
}

fn direct_relations(snapshot: &ReferenceSnapshot, scope: &GeneratorScope, out: &mut Vec<Derived>) {
    let assignments: Vec<&Assignment> = match scope.from_id {
        Some(from_id) => snapshot.assignments_from(from_id).collect(),
        None => snapshot.assignments().collect(),
    };

    for assignment in assignments {
        let relation = Relation::new(
            assignment.from_id,
            assignment.role_id,
            assignment.to_id,
            RelationReason::DIRECT,
        );
        if scope.admits(&relation) {
            out.push(Derived {
                relation,
                grant: GrantRef::Assignment(assignment.id),
            });
        }
    }
}

fn parent_relations(snapshot: &ReferenceSnapshot, scope: &GeneratorScope, out: &mut Vec<Derived>) {
    let mut emit = |child_id: EntityId, assignment: &Assignment| {
        let relation = Relation::new(
            child_id,
            assignment.role_id,
            assignment.to_id,
            RelationReason::PARENT,
        )
        .via(assignment.from_id, None);
        if scope.admits(&relation) {
            out.push(Derived {
                relation,
                grant: GrantRef::Assignment(assignment.id),
            });
        }
    };

    match scope.from_id {
        Some(child_id) => {
            let Some(parent_id) = snapshot.parent_of(child_id) else {
                return;
            };
            for assignment in snapshot.assignments_from(parent_id) {
                emit(child_id, assignment);
            }
        }
        None => {
            for assignment in snapshot.assignments() {
                for child_id in snapshot.children_of(assignment.from_id) {
                    emit(*child_id, assignment);
                }
            }
        }
    }
}

fn delegation_relations(
    snapshot: &ReferenceSnapshot,
    scope: &GeneratorScope,
    out: &mut Vec<Derived>,
) {
    let delegations: Vec<_> = match (scope.facilitator_id, scope.from_id) {
        (Some(facilitator_id), _) => snapshot.delegations_by_facilitator(facilitator_id).collect(),
        (None, Some(client_id)) => snapshot.delegations_from_client(client_id).collect(),
        (None, None) => snapshot.delegations().collect(),
    };

    for delegation in delegations {
        let (Some(source), Some(target)) = (
            snapshot.assignment(delegation.from_id),
            snapshot.assignment(delegation.to_id),
        ) else {
            continue;
        };

        let relation = Relation::new(
            source.from_id,
            source.role_id,
            target.to_id,
            RelationReason::DELEGATION,
        )
        .via(source.to_id, Some(target.role_id));
        if scope.admits(&relation) {
            out.push(Derived {
                relation,
                grant: GrantRef::Delegation(delegation.id),
            });
        }
    }
}

/// Step 2: one role-map hop per base relation.
fn role_map_relations(snapshot: &ReferenceSnapshot, base: &[Derived]) -> Vec<Derived> {
    base.iter()
        .flat_map(|derived| {
            let relation = derived.relation;
            snapshot
                .mapped_roles(relation.role_id)
                .iter()
                .filter(move |get_role_id| **get_role_id != relation.role_id)
                .map(move |get_role_id| Derived {
                    relation: Relation {
                        role_id: *get_role_id,
                        via_id: Some(relation.from_id),
                        via_role_id: Some(relation.role_id),
                        reason: relation.reason.with_role_map(),
                        ..relation
                    },
                    grant: derived.grant,
                })
        })
        .collect()
}

/// Step 3: one key-role hop over Step 1 and Step 2 output.
fn key_role_relations<'a>(
    snapshot: &ReferenceSnapshot,
    inputs: impl Iterator<Item = &'a Derived>,
) -> Vec<Derived> {
    let mut derived = Vec::new();

    for input in inputs {
        let relation = input.relation;
        for key_assignment in snapshot
            .assignments_from(relation.to_id)
            .filter(|assignment| snapshot.is_key_role(assignment.role_id))
        {
            derived.push(Derived {
                relation: Relation {
                    via_id: Some(relation.to_id),
                    via_role_id: Some(key_assignment.role_id),
                    to_id: key_assignment.to_id,
                    reason: relation.reason.with_key_role(),
                    ..relation
                },
                grant: input.grant,
            });
        }
    }

    derived
}
