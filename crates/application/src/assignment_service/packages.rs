use std::collections::BTreeMap;

use accessmgmt_domain::PackageSource;
use serde::Serialize;

use crate::{CompactPackage, PackageDelegationCheck, RolePackageQuery};

use super::*;

/// Package available through an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedPackage {
    /// Package.
    pub package: CompactPackage,
    /// Attached to the assignment itself, or granted through its role.
    pub source: PackageSource,
}

impl AssignmentService {
    /// Attaches packages to an assignment on behalf of `input.acting_id`.
    ///
    /// Each package is checked against what the acting party holds from the assignment's
    /// source; only packages whose check succeeds are stored. Every check is returned.
    pub async fn add_packages_to_assignment(
        &self,
        audit: &AuditContext,
        input: AddAssignmentPackagesInput,
    ) -> MutationResult<Vec<PackageDelegationCheck>> {
        let mut violations = ViolationBuilder::new();
        violations.ensure(!input.package_ids.is_empty(), || {
            Violation::new("packages_required", "package_ids", "no package requested")
        });
        violations.finish()?;

        let assignment = self
            .assignments
            .find_assignment(input.assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "assignment '{}' does not exist",
                    input.assignment_id
                ))
            })?;

        let checks = self
            .permissions
            .assignable_packages(
                input.acting_id,
                assignment.from_id,
                Some(input.package_ids.as_slice()),
            )
            .await?;

        let granted: Vec<PackageId> = checks
            .iter()
            .filter(|check| check.result)
            .map(|check| check.package.id)
            .collect();
        if !granted.is_empty() {
            let added = self
                .packages
                .add_assignment_packages(assignment.id, &granted, audit)
                .await?;
            info!(
                operation_id = %audit.operation_id(),
                assignment_id = %assignment.id,
                requested = input.package_ids.len(),
                added = added.len(),
                "assignment packages added"
            );
        }

        Ok(checks)
    }

    /// Lists instance-level and role-level packages of an assignment.
    pub async fn packages_for_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> AppResult<Vec<AssignedPackage>> {
        let assignment = self
            .assignments
            .find_assignment(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' does not exist"))
            })?;

        let (instance, role_level) = tokio::try_join!(
            self.packages.list_assignment_packages(std::slice::from_ref(&assignment.id)),
            self.packages
                .list_role_packages(RolePackageQuery::for_roles([assignment.role_id])),
        )?;

        let mut sources: BTreeMap<PackageId, PackageSource> = BTreeMap::new();
        for grant in role_level.iter().filter(|grant| grant.has_access) {
            sources.insert(grant.package_id, PackageSource::Role);
        }
        for grant in &instance {
            sources.insert(grant.package_id, PackageSource::Direct);
        }
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let package_ids: Vec<PackageId> = sources.keys().copied().collect();
        let packages = self
            .packages
            .list_packages(Some(package_ids.as_slice()))
            .await?;

        Ok(packages
            .into_iter()
            .filter_map(|package| {
                let source = *sources.get(&package.id)?;
                Some(AssignedPackage {
                    package: CompactPackage {
                        id: package.id,
                        urn: package.urn,
                        name: package.name,
                    },
                    source,
                })
            })
            .collect())
    }
}
