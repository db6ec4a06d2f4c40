use accessmgmt_domain::{PackageSource, Relation, RelationFilter};

use crate::ReferenceSnapshot;

use super::RelationSet;
use super::pipeline::{Derived, GrantRef, derive};

/// Derives relations matching `filter` and overlays package and resource grants.
///
/// Relations without any package or resource are kept as bare rows; they only survive when
/// the filter has no package or resource predicate.
#[must_use]
pub fn derive_relations_with_packages(
    snapshot: &ReferenceSnapshot,
    filter: &RelationFilter,
) -> RelationSet {
    let derived = derive(snapshot, &filter.without_overlay());

    let mut relations = RelationSet::new();
    for item in &derived {
        let packages = package_rows(snapshot, item);
        let resources = resource_rows(snapshot, item);

        if packages.is_empty() && resources.is_empty() {
            relations.extend(Some(item.relation).filter(|relation| filter.matches(relation)));
            continue;
        }

        relations.extend(
            packages
                .into_iter()
                .chain(resources)
                .filter(|relation| filter.matches(relation)),
        );
    }

    relations
}

/// Instance-level grants of the originating grant, then role-level grants of the relation role.
fn package_rows(snapshot: &ReferenceSnapshot, item: &Derived) -> Vec<Relation> {
    let relation = item.relation;
    let instance = match item.grant {
        GrantRef::Assignment(assignment_id) => snapshot.assignment_packages(assignment_id),
        GrantRef::Delegation(delegation_id) => snapshot.delegation_packages(delegation_id),
    };

    instance
        .iter()
        .map(|package_id| relation.with_package(*package_id, PackageSource::Direct))
        .chain(
            snapshot
                .role_packages(relation.role_id)
                .iter()
                .filter(|role_package| role_package.has_access)
                .map(|role_package| relation.with_package(role_package.package_id, PackageSource::Role)),
        )
        .collect()
}

/// Instance-level resource grants only; roles carry no resources here.
fn resource_rows(snapshot: &ReferenceSnapshot, item: &Derived) -> Vec<Relation> {
    let relation = item.relation;
    let resources = match item.grant {
        GrantRef::Assignment(assignment_id) => snapshot.assignment_resources(assignment_id),
        GrantRef::Delegation(delegation_id) => snapshot.delegation_resources(delegation_id),
    };

    resources
        .iter()
        .map(|resource_id| relation.with_resource(*resource_id))
        .collect()
}
