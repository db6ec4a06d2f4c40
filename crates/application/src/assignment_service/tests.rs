use std::sync::Arc;

use accessmgmt_core::AppError;
use accessmgmt_domain::{
    Assignment, AssignmentPackage, AssignmentPackageId, Delegation, DelegationId,
    DelegationPackage, DelegationPackageId, Entity, EntityId, Package, PackageSource, Role,
    RolePackage,
};

use super::{
    AddAssignmentPackagesInput, AssignmentService, CreateAssignmentInput, DeleteAssignmentInput,
    MutationError,
};
use crate::ReferenceData;
use crate::test_support::{
    FakeReferenceStore, assignment_service_for, audit, organization, package, person, role,
};

/// Parent org `a` with subunit `s`; `a` grants DAGL to `p` with an accounting package and the
/// role-level payroll package.
struct World {
    a: Entity,
    s: Entity,
    p: Entity,
    dagl: Role,
    accounting: Package,
    payroll: Package,
    granted: Assignment,
}

fn world() -> (World, Arc<FakeReferenceStore>) {
    let a = organization("A");
    let s = organization("S").with_parent(a.id);
    let p = person("P");
    let dagl = role("DAGL", false);
    let accounting = package("regnskap");
    let payroll = package("lonn");
    let granted = Assignment::new(a.id, p.id, dagl.id);

    let data = ReferenceData {
        entities: vec![a.clone(), s.clone(), p.clone()],
        roles: vec![dagl.clone()],
        assignments: vec![granted],
        assignment_packages: vec![AssignmentPackage {
            id: AssignmentPackageId::new(),
            assignment_id: granted.id,
            package_id: accounting.id,
        }],
        role_packages: vec![RolePackage {
            role_id: dagl.id,
            package_id: payroll.id,
            has_access: true,
            can_delegate: false,
        }],
        ..ReferenceData::default()
    };
    let store = Arc::new(
        FakeReferenceStore::new(data).with_packages(vec![accounting.clone(), payroll.clone()]),
    );

    (
        World {
            a,
            s,
            p,
            dagl,
            accounting,
            payroll,
            granted,
        },
        store,
    )
}

fn service(store: &Arc<FakeReferenceStore>) -> AssignmentService {
    assignment_service_for(store)
}

fn create_input(from: &Entity, to: &Entity, role: &Role) -> CreateAssignmentInput {
    CreateAssignmentInput {
        from_id: from.id,
        to_id: to.id,
        role_code: role.code.clone(),
        force: false,
    }
}

fn delete_input(from: &Entity, to: &Entity, role: &Role) -> DeleteAssignmentInput {
    DeleteAssignmentInput {
        from_id: from.id,
        to_id: to.id,
        role_code: role.code.clone(),
        cascade: false,
    }
}

#[tokio::test]
async fn create_assignment_returns_existing_row() {
    let (world, store) = world();

    let result = service(&store)
        .create_assignment(&audit(), create_input(&world.a, &world.p, &world.dagl))
        .await;

    assert!(matches!(result, Ok(assignment) if assignment.id == world.granted.id));
    assert_eq!(store.assignment_count().await, 1);
}

#[tokio::test]
async fn create_assignment_refuses_inherited_relation_without_force() {
    let (world, store) = world();

    let result = service(&store)
        .create_assignment(&audit(), create_input(&world.s, &world.p, &world.dagl))
        .await;

    let Err(MutationError::InheritedAssignment(relations)) = result else {
        panic!("expected inherited assignment conflict");
    };
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].via_id, Some(world.a.id));
    assert_eq!(store.assignment_count().await, 1);
}

#[tokio::test]
async fn create_assignment_with_force_writes_and_audits() {
    let (world, store) = world();
    let context = audit();

    let result = service(&store)
        .create_assignment(
            &context,
            CreateAssignmentInput {
                force: true,
                ..create_input(&world.s, &world.p, &world.dagl)
            },
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(store.assignment_count().await, 2);
    assert_eq!(store.audits.lock().await.as_slice(), &[context]);
}

#[tokio::test]
async fn create_assignment_accumulates_violations() {
    let (world, store) = world();
    let stranger = EntityId::new();

    let result = service(&store)
        .create_assignment(
            &audit(),
            CreateAssignmentInput {
                from_id: world.p.id,
                to_id: stranger,
                role_code: world.dagl.code.clone(),
                force: false,
            },
        )
        .await;

    let Err(MutationError::Validation(violations)) = result else {
        panic!("expected validation failure");
    };
    let codes: Vec<&str> = violations
        .iter()
        .map(|violation| violation.code.as_str())
        .collect();
    assert_eq!(codes, vec!["party_not_found", "party_not_organization"]);
}

#[tokio::test]
async fn create_assignment_ignores_the_revocation_flag() {
    let (world, store) = world();
    if let Some(stored) = store
        .data
        .lock()
        .await
        .roles
        .iter_mut()
        .find(|stored| stored.id == world.dagl.id)
    {
        stored.is_assignable = false;
    }

    let result = service(&store)
        .create_assignment(
            &audit(),
            CreateAssignmentInput {
                force: true,
                ..create_input(&world.s, &world.p, &world.dagl)
            },
        )
        .await;

    assert!(matches!(result, Ok(assignment) if assignment.role_id == world.dagl.id));
    assert_eq!(store.assignment_count().await, 2);
}

#[tokio::test]
async fn create_assignment_with_unknown_role_is_not_found() {
    let (world, store) = world();

    let result = service(&store)
        .create_assignment(
            &audit(),
            CreateAssignmentInput {
                role_code: "UKJENT".to_owned(),
                ..create_input(&world.a, &world.p, &world.dagl)
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(MutationError::App(AppError::NotFound(_)))
    ));
}

#[tokio::test]
async fn delete_missing_assignment_is_a_no_op() {
    let (world, store) = world();

    let result = service(&store)
        .delete_assignment(&audit(), delete_input(&world.s, &world.p, &world.dagl))
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn delete_assignment_reports_dependents_without_cascade() {
    let (world, store) = world();

    let result = service(&store)
        .delete_assignment(&audit(), delete_input(&world.a, &world.p, &world.dagl))
        .await;

    let Err(MutationError::DependentGrants(dependents)) = result else {
        panic!("expected dependent grants conflict");
    };
    assert_eq!(dependents.assignment_packages.len(), 1);
    assert!(dependents.delegations.is_empty());
    assert_eq!(store.assignment_count().await, 1);
}

#[tokio::test]
async fn delete_assignment_with_cascade_removes_dependents() {
    let (world, store) = world();

    let result = service(&store)
        .delete_assignment(
            &audit(),
            DeleteAssignmentInput {
                cascade: true,
                ..delete_input(&world.a, &world.p, &world.dagl)
            },
        )
        .await;

    assert!(matches!(result, Ok(Some(assignment)) if assignment.id == world.granted.id));
    assert_eq!(store.assignment_count().await, 0);
    assert!(store.data.lock().await.assignment_packages.is_empty());
}

#[tokio::test]
async fn delete_assignment_rejects_non_assignable_role() {
    let (world, store) = world();
    if let Some(stored) = store
        .data
        .lock()
        .await
        .roles
        .iter_mut()
        .find(|stored| stored.id == world.dagl.id)
    {
        stored.is_assignable = false;
    }

    let result = service(&store)
        .delete_assignment(&audit(), delete_input(&world.a, &world.p, &world.dagl))
        .await;

    let Err(MutationError::Validation(violations)) = result else {
        panic!("expected validation failure");
    };
    assert_eq!(violations[0].code, "role_not_revocable");
}

#[tokio::test]
async fn add_packages_stores_only_delegable_packages() {
    let (world, store) = world();
    let assistant = person("Q");
    let target = Assignment::new(world.a.id, assistant.id, world.dagl.id);
    {
        let mut data = store.data.lock().await;
        data.entities.push(assistant);
        data.assignments.push(target);
    }

    let checks = service(&store)
        .add_packages_to_assignment(
            &audit(),
            AddAssignmentPackagesInput {
                acting_id: world.p.id,
                assignment_id: target.id,
                package_ids: vec![world.accounting.id, world.payroll.id],
            },
        )
        .await
        .unwrap_or_default();

    assert_eq!(checks.len(), 2);
    let stored: Vec<_> = store
        .data
        .lock()
        .await
        .assignment_packages
        .iter()
        .filter(|grant| grant.assignment_id == target.id)
        .map(|grant| grant.package_id)
        .collect();
    assert_eq!(stored, vec![world.accounting.id]);
}

#[tokio::test]
async fn packages_for_assignment_merge_instance_and_role_grants() {
    let (world, store) = world();

    let packages = service(&store)
        .packages_for_assignment(world.granted.id)
        .await
        .unwrap_or_default();

    assert_eq!(packages.len(), 2);
    assert!(packages.iter().any(|assigned| assigned.package.id == world.accounting.id
        && assigned.source == PackageSource::Direct));
    assert!(packages.iter().any(|assigned| assigned.package.id == world.payroll.id
        && assigned.source == PackageSource::Role));
}

/// Client `a` grants REGN to facilitator `f`; `f` grants AGENT to `p`.
async fn delegation_world() -> (World, Arc<FakeReferenceStore>, Entity, Assignment, Assignment) {
    let (world, store) = world();
    let facilitator = organization("F");
    let regn = role("REGN", false);
    let agent = role("AGENT", false);
    let source = Assignment::new(world.a.id, facilitator.id, regn.id);
    let target = Assignment::new(facilitator.id, world.p.id, agent.id);
    {
        let mut data = store.data.lock().await;
        data.entities.push(facilitator.clone());
        data.roles.extend([regn, agent]);
        data.assignments.extend([source, target]);
    }
    (world, store, facilitator, source, target)
}

#[tokio::test]
async fn create_delegation_validates_facilitator_chain() {
    let (world, store, _, source, target) = delegation_world().await;

    let result = service(&store)
        .create_delegation(&audit(), source.id, target.id, world.s.id)
        .await;

    let Err(MutationError::Validation(violations)) = result else {
        panic!("expected validation failure");
    };
    assert_eq!(violations.len(), 2);
    assert!(
        violations
            .iter()
            .all(|violation| violation.code == "facilitator_mismatch")
    );
}

#[tokio::test]
async fn create_delegation_is_get_or_create() {
    let (_, store, facilitator, source, target) = delegation_world().await;
    let service = service(&store);

    let first = service
        .create_delegation(&audit(), source.id, target.id, facilitator.id)
        .await;
    let second = service
        .create_delegation(&audit(), source.id, target.id, facilitator.id)
        .await;

    let (Ok(first), Ok(second)) = (first, second) else {
        panic!("expected both delegations to succeed");
    };
    assert_eq!(first.id, second.id);
    assert_eq!(store.data.lock().await.delegations.len(), 1);
}

#[tokio::test]
async fn delete_delegation_is_guarded_by_packages() {
    let (world, store, facilitator, source, target) = delegation_world().await;
    let delegation = Delegation {
        id: DelegationId::new(),
        from_id: source.id,
        to_id: target.id,
        facilitator_id: facilitator.id,
    };
    {
        let mut data = store.data.lock().await;
        data.delegations.push(delegation);
        data.delegation_packages.push(DelegationPackage {
            id: DelegationPackageId::new(),
            delegation_id: delegation.id,
            package_id: world.accounting.id,
        });
    }
    let service = service(&store);

    let guarded = service
        .delete_delegation(&audit(), delegation.id, false)
        .await;
    let cascaded = service.delete_delegation(&audit(), delegation.id, true).await;

    assert!(matches!(guarded, Err(MutationError::DependentGrants(_))));
    assert!(matches!(cascaded, Ok(Some(_))));
    assert!(store.data.lock().await.delegation_packages.is_empty());
}

#[tokio::test]
async fn delete_assignment_reports_referencing_delegations() {
    let (_, store, facilitator, source, target) = delegation_world().await;
    let service = service(&store);
    let created = service
        .create_delegation(&audit(), source.id, target.id, facilitator.id)
        .await;
    assert!(created.is_ok());

    let result = service
        .delete_assignment(
            &audit(),
            DeleteAssignmentInput {
                from_id: facilitator.id,
                to_id: target.to_id,
                role_code: "AGENT".to_owned(),
                cascade: false,
            },
        )
        .await;

    let Err(MutationError::DependentGrants(dependents)) = result else {
        panic!("expected dependent grants conflict");
    };
    assert_eq!(dependents.delegations.len(), 1);
}
