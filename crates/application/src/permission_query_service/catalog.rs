use std::collections::{BTreeSet, HashMap};

use accessmgmt_core::{AppError, AppResult};
use accessmgmt_domain::{EntityId, PackageId, Relation, ResourceId, RoleId};

use crate::{EntityQuery, EntityRepository, PackageRepository, ResourceRepository, RoleRepository};

use super::{CompactEntity, CompactPackage, CompactResource, CompactRole, PermissionPath};

/// Compact projections of every id referenced by a relation batch.
#[derive(Debug, Default)]
pub(super) struct Catalog {
    entities: HashMap<EntityId, CompactEntity>,
    roles: HashMap<RoleId, CompactRole>,
    packages: HashMap<PackageId, CompactPackage>,
    resources: HashMap<ResourceId, CompactResource>,
}

impl Catalog {
    pub(super) async fn load(
        relations: &[Relation],
        entities: &dyn EntityRepository,
        roles: &dyn RoleRepository,
        packages: &dyn PackageRepository,
        resources: &dyn ResourceRepository,
    ) -> AppResult<Self> {
        let mut entity_ids = BTreeSet::new();
        let mut role_ids = BTreeSet::new();
        let mut package_ids = BTreeSet::new();
        let mut resource_ids = BTreeSet::new();

        for relation in relations {
            entity_ids.insert(relation.from_id);
            entity_ids.insert(relation.to_id);
            entity_ids.extend(relation.via_id);
            role_ids.insert(relation.role_id);
            role_ids.extend(relation.via_role_id);
            package_ids.extend(relation.package_id);
            resource_ids.extend(relation.resource_id);
        }

        if entity_ids.is_empty() {
            return Ok(Self::default());
        }

        let role_ids: Vec<RoleId> = role_ids.into_iter().collect();
        let package_ids: Vec<PackageId> = package_ids.into_iter().collect();
        let resource_ids: Vec<ResourceId> = resource_ids.into_iter().collect();

        let (entity_rows, role_rows, package_rows, resource_rows) = tokio::try_join!(
            entities.list_entities(EntityQuery::by_ids(entity_ids)),
            roles.list_roles(&role_ids),
            async {
                if package_ids.is_empty() {
                    Ok(Vec::new())
                } else {
                    packages.list_packages(Some(package_ids.as_slice())).await
                }
            },
            async {
                if resource_ids.is_empty() {
                    Ok(Vec::new())
                } else {
                    resources.list_resources(&resource_ids).await
                }
            },
        )?;

        Ok(Self {
            entities: entity_rows
                .iter()
                .map(|entity| (entity.id, CompactEntity::from(entity)))
                .collect(),
            roles: role_rows
                .into_iter()
                .map(|role| {
                    (
                        role.id,
                        CompactRole {
                            id: role.id,
                            code: role.code,
                            urn: role.urn,
                        },
                    )
                })
                .collect(),
            packages: package_rows
                .into_iter()
                .map(|package| {
                    (
                        package.id,
                        CompactPackage {
                            id: package.id,
                            urn: package.urn,
                            name: package.name,
                        },
                    )
                })
                .collect(),
            resources: resource_rows
                .into_iter()
                .map(|resource| {
                    (
                        resource.id,
                        CompactResource {
                            id: resource.id,
                            ref_id: resource.ref_id,
                            name: resource.name,
                        },
                    )
                })
                .collect(),
        })
    }

    pub(super) fn entity(&self, entity_id: EntityId) -> AppResult<CompactEntity> {
        self.entities
            .get(&entity_id)
            .cloned()
            .ok_or_else(|| missing("party", entity_id))
    }

    pub(super) fn role(&self, role_id: RoleId) -> AppResult<CompactRole> {
        self.roles
            .get(&role_id)
            .cloned()
            .ok_or_else(|| missing("role", role_id))
    }

    pub(super) fn package(&self, package_id: PackageId) -> AppResult<CompactPackage> {
        self.packages
            .get(&package_id)
            .cloned()
            .ok_or_else(|| missing("package", package_id))
    }

    pub(super) fn resource(&self, resource_id: ResourceId) -> AppResult<CompactResource> {
        self.resources
            .get(&resource_id)
            .cloned()
            .ok_or_else(|| missing("resource", resource_id))
    }

    pub(super) fn path(&self, relation: &Relation) -> AppResult<PermissionPath> {
        Ok(PermissionPath {
            from: self.entity(relation.from_id)?,
            to: self.entity(relation.to_id)?,
            via: relation
                .via_id
                .map(|via_id| self.entity(via_id))
                .transpose()?,
            via_role: relation
                .via_role_id
                .map(|via_role_id| self.role(via_role_id))
                .transpose()?,
            role: self.role(relation.role_id)?,
            reason: relation.reason,
        })
    }
}

fn missing(kind: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{kind} '{id}' referenced by a relation does not exist"))
}
