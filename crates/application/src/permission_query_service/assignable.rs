use std::collections::{BTreeSet, HashMap};

use accessmgmt_domain::Package;

use crate::RolePackageQuery;

use super::*;

impl PermissionQueryService {
    /// Checks which packages `acting_id` may pass on, on behalf of `source_id`.
    ///
    /// Without `package_ids` every package the acting party holds from the source is checked.
    /// Packages the acting party does not hold are reported with a single
    /// [`DelegationBasis::NoAccess`].
    pub async fn assignable_packages(
        &self,
        acting_id: EntityId,
        source_id: EntityId,
        package_ids: Option<&[PackageId]>,
    ) -> AppResult<Vec<PackageDelegationCheck>> {
        self.require_party(acting_id).await?;
        self.require_party(source_id).await?;

        let filter = RelationFilter::any()
            .with(RelationPredicate::From(source_id))
            .with(RelationPredicate::To(acting_id));
        let relations: Vec<Relation> = self
            .resolver
            .resolve_relations_with_packages(filter)
            .await?
            .into_iter()
            .filter(|relation| match (relation.package_id, package_ids) {
                (Some(package_id), Some(requested)) => requested.contains(&package_id),
                (Some(_), None) => true,
                (None, _) => false,
            })
            .collect();

        let packages = self.packages_to_check(&relations, package_ids).await?;
        let delegable = self.role_delegability(&relations).await?;
        let catalog = self.catalog_for(&relations).await?;

        packages
            .into_iter()
            .map(|package| {
                let reasons = relations
                    .iter()
                    .filter(|relation| relation.package_id == Some(package.id))
                    .map(|relation| {
                        let can_delegate = match relation.package_source {
                            Some(PackageSource::Direct) => true,
                            _ => delegable
                                .get(&(relation.role_id, package.id))
                                .copied()
                                .unwrap_or(false),
                        };
                        Ok(DelegationBasis::Relation {
                            path: catalog.path(relation)?,
                            source: relation.package_source,
                            can_delegate,
                        })
                    })
                    .collect::<AppResult<Vec<_>>>()?;

                let any_delegable = reasons.iter().any(|reason| {
                    matches!(
                        reason,
                        DelegationBasis::Relation {
                            can_delegate: true,
                            ..
                        }
                    )
                });
                let reasons = if reasons.is_empty() {
                    vec![DelegationBasis::NoAccess]
                } else {
                    reasons
                };

                Ok(PackageDelegationCheck {
                    result: package.is_assignable && any_delegable,
                    package: CompactPackage {
                        id: package.id,
                        urn: package.urn,
                        name: package.name,
                    },
                    reasons,
                })
            })
            .collect()
    }

    async fn packages_to_check(
        &self,
        relations: &[Relation],
        package_ids: Option<&[PackageId]>,
    ) -> AppResult<Vec<Package>> {
        let wanted: Vec<PackageId> = match package_ids {
            Some(requested) => requested
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            None => relations
                .iter()
                .filter_map(|relation| relation.package_id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let packages = self.packages.list_packages(Some(wanted.as_slice())).await?;
        if let Some(missing) = wanted
            .iter()
            .find(|package_id| packages.iter().all(|package| package.id != **package_id))
        {
            return Err(AppError::NotFound(format!(
                "package '{missing}' does not exist"
            )));
        }

        Ok(packages)
    }

    async fn role_delegability(
        &self,
        relations: &[Relation],
    ) -> AppResult<HashMap<(RoleId, PackageId), bool>> {
        let role_ids: BTreeSet<RoleId> = relations
            .iter()
            .filter(|relation| relation.package_source != Some(PackageSource::Direct))
            .map(|relation| relation.role_id)
            .collect();
        if role_ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .packages
            .list_role_packages(RolePackageQuery::for_roles(role_ids))
            .await?
            .into_iter()
            .filter(|grant| grant.has_access)
            .map(|grant| ((grant.role_id, grant.package_id), grant.can_delegate))
            .collect())
    }
}
