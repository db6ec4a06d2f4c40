use std::collections::BTreeMap;

use super::*;

impl PermissionQueryService {
    /// Lists packages held in `query.direction`, each with the paths granting it.
    pub async fn package_permissions(
        &self,
        query: PackagePermissionQuery,
    ) -> AppResult<Vec<PackagePermission>> {
        self.require_party(query.party_id).await?;
        if let Some(package_id) = query.package_id {
            let found = self
                .packages
                .list_packages(Some(std::slice::from_ref(&package_id)))
                .await?;
            if found.is_empty() {
                return Err(AppError::NotFound(format!(
                    "package '{package_id}' does not exist"
                )));
            }
        }

        let filter = query
            .direction
            .filter(query.party_id, query.counterpart_id)
            .with_optional(query.package_id, RelationPredicate::Package);
        let relations: Vec<Relation> = self
            .resolver
            .resolve_relations_with_packages(filter)
            .await?
            .into_iter()
            .filter(|relation| relation.package_id.is_some())
            .collect();
        let catalog = self.catalog_for(&relations).await?;

        let mut grouped: BTreeMap<PackageId, Vec<&Relation>> = BTreeMap::new();
        for relation in &relations {
            if let Some(package_id) = relation.package_id {
                grouped.entry(package_id).or_default().push(relation);
            }
        }

        grouped
            .into_iter()
            .map(|(package_id, holders)| {
                Ok(PackagePermission {
                    package: catalog.package(package_id)?,
                    permissions: distinct_paths(&catalog, &holders)?,
                })
            })
            .collect()
    }

    /// Lists resources held in `query.direction`, each with the paths granting it.
    pub async fn resource_permissions(
        &self,
        query: ResourcePermissionQuery,
    ) -> AppResult<Vec<ResourcePermission>> {
        self.require_party(query.party_id).await?;
        if let Some(resource_id) = query.resource_id {
            let found = self.resources.list_resources(&[resource_id]).await?;
            if found.is_empty() {
                return Err(AppError::NotFound(format!(
                    "resource '{resource_id}' does not exist"
                )));
            }
        }

        let filter = query
            .direction
            .filter(query.party_id, query.counterpart_id)
            .with_optional(query.resource_id, RelationPredicate::Resource);
        let relations: Vec<Relation> = self
            .resolver
            .resolve_relations_with_packages(filter)
            .await?
            .into_iter()
            .filter(|relation| relation.resource_id.is_some())
            .collect();
        let catalog = self.catalog_for(&relations).await?;

        let mut grouped: BTreeMap<ResourceId, Vec<&Relation>> = BTreeMap::new();
        for relation in &relations {
            if let Some(resource_id) = relation.resource_id {
                grouped.entry(resource_id).or_default().push(relation);
            }
        }

        grouped
            .into_iter()
            .map(|(resource_id, holders)| {
                Ok(ResourcePermission {
                    resource: catalog.resource(resource_id)?,
                    permissions: distinct_paths(&catalog, &holders)?,
                })
            })
            .collect()
    }
}

/// One path per `(from, to, via, via_role, role, reason)`.
fn distinct_paths(catalog: &Catalog, holders: &[&Relation]) -> AppResult<Vec<PermissionPath>> {
    let mut paths: Vec<PermissionPath> = Vec::with_capacity(holders.len());
    for relation in holders {
        let path = catalog.path(relation)?;
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    Ok(paths)
}
