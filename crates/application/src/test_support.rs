use std::sync::Arc;
use std::time::Duration;

use accessmgmt_core::{AppResult, AuditContext};
use accessmgmt_domain::{
    Assignment, AssignmentId, AssignmentKey, AssignmentPackage, AssignmentPackageId,
    AssignmentResource, Delegation, DelegationId, DelegationPackage, DelegationResource, Entity,
    EntityId, EntityKind, EntityType, EntityTypeId, EntityVariantId, Package, PackageId,
    ProviderId, Relation, RelationFilter, Resource, ResourceId, Role, RoleId, RoleMap,
    RolePackage,
};
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    AssignmentQuery, AssignmentRepository, AssignmentService, DelegationQuery,
    DelegationRepository, EntityQuery, EntityRepository, PackageRepository,
    PermissionQueryService, ReferenceData, ReferenceSnapshot, ReferenceSnapshotSource,
    RelationResolver, RelationSupplementRepository, ResolverConfig, ResourceRepository,
    RolePackageQuery, RoleRepository,
};

pub(crate) fn organization_type() -> EntityTypeId {
    EntityTypeId::from_uuid(Uuid::from_u128(0x0001))
}

pub(crate) fn person_type() -> EntityTypeId {
    EntityTypeId::from_uuid(Uuid::from_u128(0x0002))
}

pub(crate) fn organization(name: &str) -> Entity {
    party(name, organization_type())
}

pub(crate) fn person(name: &str) -> Entity {
    party(name, person_type())
}

fn party(name: &str, type_id: EntityTypeId) -> Entity {
    Entity::new(EntityId::new(), name, type_id, EntityVariantId::new())
        .unwrap_or_else(|_| unreachable!())
}

pub(crate) fn role(code: &str, is_key_role: bool) -> Role {
    Role {
        id: RoleId::new(),
        code: code.to_owned(),
        urn: format!("urn:altinn:role:{code}"),
        name: code.to_owned(),
        provider_id: ProviderId::from_uuid(Uuid::from_u128(0x0100)),
        entity_type_id: organization_type(),
        is_key_role,
        is_assignable: true,
    }
}

pub(crate) fn package(urn: &str) -> Package {
    Package {
        id: PackageId::new(),
        urn: format!("urn:altinn:accesspackage:{urn}"),
        name: urn.to_owned(),
        is_assignable: true,
        is_delegable: true,
    }
}

pub(crate) fn resource(ref_id: &str) -> Resource {
    Resource {
        id: ResourceId::new(),
        ref_id: ref_id.to_owned(),
        provider_id: ProviderId::from_uuid(Uuid::from_u128(0x0100)),
        name: ref_id.to_owned(),
    }
}

pub(crate) fn audit() -> AuditContext {
    AuditContext::new(Uuid::new_v4(), Uuid::new_v4())
}

/// In-process stand-in for every reference store.
pub(crate) struct FakeReferenceStore {
    pub(crate) data: Mutex<ReferenceData>,
    pub(crate) packages: Mutex<Vec<Package>>,
    pub(crate) resources: Mutex<Vec<Resource>>,
    pub(crate) supplement: Mutex<Vec<Relation>>,
    pub(crate) audits: Mutex<Vec<AuditContext>>,
    snapshot_delay: Option<Duration>,
}

impl FakeReferenceStore {
    pub(crate) fn new(data: ReferenceData) -> Self {
        Self {
            data: Mutex::new(data),
            packages: Mutex::new(Vec::new()),
            resources: Mutex::new(Vec::new()),
            supplement: Mutex::new(Vec::new()),
            audits: Mutex::new(Vec::new()),
            snapshot_delay: None,
        }
    }

    pub(crate) fn with_packages(mut self, packages: Vec<Package>) -> Self {
        self.packages = Mutex::new(packages);
        self
    }

    pub(crate) fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = Mutex::new(resources);
        self
    }

    pub(crate) fn with_supplement(mut self, supplement: Vec<Relation>) -> Self {
        self.supplement = Mutex::new(supplement);
        self
    }

    pub(crate) fn with_snapshot_delay(mut self, delay: Duration) -> Self {
        self.snapshot_delay = Some(delay);
        self
    }

    pub(crate) async fn assignment_count(&self) -> usize {
        self.data.lock().await.assignments.len()
    }

    async fn record(&self, audit: &AuditContext) {
        self.audits.lock().await.push(*audit);
    }
}

pub(crate) fn resolver_for(store: &Arc<FakeReferenceStore>) -> RelationResolver {
    RelationResolver::new(store.clone(), store.clone(), ResolverConfig::default())
}

pub(crate) fn assignment_service_for(store: &Arc<FakeReferenceStore>) -> AssignmentService {
    AssignmentService::new(
        permission_service_for(store),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    )
}

pub(crate) fn permission_service_for(store: &Arc<FakeReferenceStore>) -> PermissionQueryService {
    PermissionQueryService::new(
        resolver_for(store),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    )
}

fn remove_assignment_cascade(data: &mut ReferenceData, assignment_id: AssignmentId) {
    let delegation_ids: Vec<DelegationId> = data
        .delegations
        .iter()
        .filter(|delegation| {
            delegation.from_id == assignment_id || delegation.to_id == assignment_id
        })
        .map(|delegation| delegation.id)
        .collect();
    for delegation_id in delegation_ids {
        remove_delegation_cascade(data, delegation_id);
    }

    data.assignment_packages
        .retain(|grant| grant.assignment_id != assignment_id);
    data.assignment_resources
        .retain(|grant| grant.assignment_id != assignment_id);
    data.assignments
        .retain(|assignment| assignment.id != assignment_id);
}

fn remove_delegation_cascade(data: &mut ReferenceData, delegation_id: DelegationId) {
    data.delegation_packages
        .retain(|grant| grant.delegation_id != delegation_id);
    data.delegation_resources
        .retain(|grant| grant.delegation_id != delegation_id);
    data.delegations
        .retain(|delegation| delegation.id != delegation_id);
}

#[async_trait]
impl EntityRepository for FakeReferenceStore {
    async fn find_entity(&self, entity_id: EntityId) -> AppResult<Option<Entity>> {
        Ok(self
            .data
            .lock()
            .await
            .entities
            .iter()
            .find(|entity| entity.id == entity_id)
            .cloned())
    }

    async fn list_entities(&self, query: EntityQuery) -> AppResult<Vec<Entity>> {
        Ok(self
            .data
            .lock()
            .await
            .entities
            .iter()
            .filter(|entity| {
                query.ids.as_ref().is_none_or(|ids| ids.contains(&entity.id))
                    && query
                        .parent_id
                        .is_none_or(|parent_id| entity.parent_id == Some(parent_id))
            })
            .cloned()
            .collect())
    }

    async fn find_entity_type(&self, type_id: EntityTypeId) -> AppResult<Option<EntityType>> {
        let entity_type = if type_id == organization_type() {
            Some(EntityType {
                id: type_id,
                name: "Organisasjon".to_owned(),
                kind: EntityKind::Organization,
            })
        } else if type_id == person_type() {
            Some(EntityType {
                id: type_id,
                name: "Person".to_owned(),
                kind: EntityKind::Person,
            })
        } else {
            None
        };

        Ok(entity_type)
    }
}

#[async_trait]
impl RoleRepository for FakeReferenceStore {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .data
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.id == role_id)
            .cloned())
    }

    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        Ok(self
            .data
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.code == code)
            .cloned())
    }

    async fn list_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Role>> {
        Ok(self
            .data
            .lock()
            .await
            .roles
            .iter()
            .filter(|role| role_ids.contains(&role.id))
            .cloned()
            .collect())
    }

    async fn list_role_maps(&self) -> AppResult<Vec<RoleMap>> {
        Ok(self.data.lock().await.role_maps.clone())
    }
}

#[async_trait]
impl AssignmentRepository for FakeReferenceStore {
    async fn find_assignment(&self, assignment_id: AssignmentId) -> AppResult<Option<Assignment>> {
        Ok(self
            .data
            .lock()
            .await
            .assignments
            .iter()
            .find(|assignment| assignment.id == assignment_id)
            .copied())
    }

    async fn list_assignments(&self, query: AssignmentQuery) -> AppResult<Vec<Assignment>> {
        Ok(self
            .data
            .lock()
            .await
            .assignments
            .iter()
            .filter(|assignment| {
                query.from_id.is_none_or(|value| assignment.from_id == value)
                    && query.to_id.is_none_or(|value| assignment.to_id == value)
                    && query.role_id.is_none_or(|value| assignment.role_id == value)
            })
            .copied()
            .collect())
    }

    async fn create_assignment(
        &self,
        assignment: Assignment,
        audit: &AuditContext,
    ) -> AppResult<Assignment> {
        self.record(audit).await;
        let mut data = self.data.lock().await;
        if let Some(existing) = data
            .assignments
            .iter()
            .find(|stored| stored.key() == assignment.key())
        {
            return Ok(*existing);
        }

        data.assignments.push(assignment);
        Ok(assignment)
    }

    async fn delete_assignment(
        &self,
        assignment_id: AssignmentId,
        audit: &AuditContext,
    ) -> AppResult<()> {
        self.record(audit).await;
        remove_assignment_cascade(&mut *self.data.lock().await, assignment_id);
        Ok(())
    }

    async fn merge_assignments(
        &self,
        assignments: &[Assignment],
        audit: &AuditContext,
    ) -> AppResult<u64> {
        self.record(audit).await;
        let mut data = self.data.lock().await;
        let mut inserted = 0;
        for assignment in assignments {
            if data
                .assignments
                .iter()
                .all(|stored| stored.key() != assignment.key())
            {
                data.assignments.push(*assignment);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn remove_assignments(
        &self,
        keys: &[AssignmentKey],
        audit: &AuditContext,
    ) -> AppResult<u64> {
        self.record(audit).await;
        let mut data = self.data.lock().await;
        let doomed: Vec<AssignmentId> = data
            .assignments
            .iter()
            .filter(|assignment| keys.contains(&assignment.key()))
            .map(|assignment| assignment.id)
            .collect();
        for assignment_id in &doomed {
            remove_assignment_cascade(&mut data, *assignment_id);
        }
        Ok(doomed.len() as u64)
    }
}

#[async_trait]
impl DelegationRepository for FakeReferenceStore {
    async fn find_delegation(&self, delegation_id: DelegationId) -> AppResult<Option<Delegation>> {
        Ok(self
            .data
            .lock()
            .await
            .delegations
            .iter()
            .find(|delegation| delegation.id == delegation_id)
            .copied())
    }

    async fn list_delegations(&self, query: DelegationQuery) -> AppResult<Vec<Delegation>> {
        Ok(self
            .data
            .lock()
            .await
            .delegations
            .iter()
            .filter(|delegation| {
                query
                    .from_assignment_id
                    .is_none_or(|value| delegation.from_id == value)
                    && query
                        .to_assignment_id
                        .is_none_or(|value| delegation.to_id == value)
                    && query.assignment_id.is_none_or(|value| {
                        delegation.from_id == value || delegation.to_id == value
                    })
                    && query
                        .facilitator_id
                        .is_none_or(|value| delegation.facilitator_id == value)
            })
            .copied()
            .collect())
    }

    async fn create_delegation(
        &self,
        delegation: Delegation,
        audit: &AuditContext,
    ) -> AppResult<Delegation> {
        self.record(audit).await;
        let mut data = self.data.lock().await;
        if let Some(existing) = data.delegations.iter().find(|stored| {
            stored.from_id == delegation.from_id
                && stored.to_id == delegation.to_id
                && stored.facilitator_id == delegation.facilitator_id
        }) {
            return Ok(*existing);
        }

        data.delegations.push(delegation);
        Ok(delegation)
    }

    async fn delete_delegation(
        &self,
        delegation_id: DelegationId,
        audit: &AuditContext,
    ) -> AppResult<()> {
        self.record(audit).await;
        remove_delegation_cascade(&mut *self.data.lock().await, delegation_id);
        Ok(())
    }
}

#[async_trait]
impl PackageRepository for FakeReferenceStore {
    async fn list_packages(&self, package_ids: Option<&[PackageId]>) -> AppResult<Vec<Package>> {
        Ok(self
            .packages
            .lock()
            .await
            .iter()
            .filter(|package| package_ids.is_none_or(|ids| ids.contains(&package.id)))
            .cloned()
            .collect())
    }

    async fn list_role_packages(&self, query: RolePackageQuery) -> AppResult<Vec<RolePackage>> {
        Ok(self
            .data
            .lock()
            .await
            .role_packages
            .iter()
            .filter(|grant| {
                query
                    .role_ids
                    .as_ref()
                    .is_none_or(|role_ids| role_ids.contains(&grant.role_id))
                    && query
                        .package_id
                        .is_none_or(|package_id| grant.package_id == package_id)
            })
            .copied()
            .collect())
    }

    async fn list_assignment_packages(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> AppResult<Vec<AssignmentPackage>> {
        Ok(self
            .data
            .lock()
            .await
            .assignment_packages
            .iter()
            .filter(|grant| assignment_ids.contains(&grant.assignment_id))
            .copied()
            .collect())
    }

    async fn list_delegation_packages(
        &self,
        delegation_ids: &[DelegationId],
    ) -> AppResult<Vec<DelegationPackage>> {
        Ok(self
            .data
            .lock()
            .await
            .delegation_packages
            .iter()
            .filter(|grant| delegation_ids.contains(&grant.delegation_id))
            .copied()
            .collect())
    }

    async fn add_assignment_packages(
        &self,
        assignment_id: AssignmentId,
        package_ids: &[PackageId],
        audit: &AuditContext,
    ) -> AppResult<Vec<AssignmentPackage>> {
        self.record(audit).await;
        let mut data = self.data.lock().await;
        let mut added = Vec::new();
        for package_id in package_ids {
            let exists = data.assignment_packages.iter().any(|grant| {
                grant.assignment_id == assignment_id && grant.package_id == *package_id
            });
            if !exists {
                let grant = AssignmentPackage {
                    id: AssignmentPackageId::new(),
                    assignment_id,
                    package_id: *package_id,
                };
                data.assignment_packages.push(grant);
                added.push(grant);
            }
        }
        Ok(added)
    }
}

#[async_trait]
impl ResourceRepository for FakeReferenceStore {
    async fn list_resources(&self, resource_ids: &[ResourceId]) -> AppResult<Vec<Resource>> {
        Ok(self
            .resources
            .lock()
            .await
            .iter()
            .filter(|resource| resource_ids.contains(&resource.id))
            .cloned()
            .collect())
    }

    async fn list_assignment_resources(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> AppResult<Vec<AssignmentResource>> {
        Ok(self
            .data
            .lock()
            .await
            .assignment_resources
            .iter()
            .filter(|grant| assignment_ids.contains(&grant.assignment_id))
            .copied()
            .collect())
    }

    async fn list_delegation_resources(
        &self,
        delegation_ids: &[DelegationId],
    ) -> AppResult<Vec<DelegationResource>> {
        Ok(self
            .data
            .lock()
            .await
            .delegation_resources
            .iter()
            .filter(|grant| delegation_ids.contains(&grant.delegation_id))
            .copied()
            .collect())
    }
}

#[async_trait]
impl RelationSupplementRepository for FakeReferenceStore {
    async fn list_supplement_relations(&self, filter: &RelationFilter) -> AppResult<Vec<Relation>> {
        Ok(self
            .supplement
            .lock()
            .await
            .iter()
            .filter(|relation| filter.matches(relation))
            .copied()
            .collect())
    }
}

#[async_trait]
impl ReferenceSnapshotSource for FakeReferenceStore {
    async fn load_snapshot(&self) -> AppResult<Arc<ReferenceSnapshot>> {
        if let Some(delay) = self.snapshot_delay {
            tokio::time::sleep(delay).await;
        }

        let data = self.data.lock().await.clone();
        Ok(Arc::new(ReferenceSnapshot::from_data(data)))
    }
}
