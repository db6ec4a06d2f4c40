use super::*;

#[async_trait]
impl PackageRepository for PostgresReferenceStore {
    async fn list_packages(&self, package_ids: Option<&[PackageId]>) -> AppResult<Vec<Package>> {
        let rows = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT id, urn, name, is_assignable, is_delegable
            FROM packages
            WHERE ($1::UUID[] IS NULL OR id = ANY($1))
            ORDER BY urn
            "#,
        )
        .bind(package_ids.map(|ids| uuids(ids, PackageId::as_uuid)))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list packages: {error}")))?;

        Ok(rows.into_iter().map(Package::from).collect())
    }

    async fn list_role_packages(&self, query: RolePackageQuery) -> AppResult<Vec<RolePackage>> {
        let role_ids = query
            .role_ids
            .as_deref()
            .map(|ids| uuids(ids, RoleId::as_uuid));
        let rows = sqlx::query_as::<_, RolePackageRow>(
            r#"
            SELECT role_id, package_id, has_access, can_delegate
            FROM role_packages
            WHERE ($1::UUID[] IS NULL OR role_id = ANY($1))
              AND ($2::UUID IS NULL OR package_id = $2)
            "#,
        )
        .bind(role_ids)
        .bind(query.package_id.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role packages: {error}")))?;

        Ok(rows.into_iter().map(RolePackage::from).collect())
    }

    async fn list_assignment_packages(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> AppResult<Vec<AssignmentPackage>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, assignment_id AS owner_id, package_id AS granted_id
            FROM assignment_packages
            WHERE assignment_id = ANY($1)
            "#,
        )
        .bind(uuids(assignment_ids, AssignmentId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list assignment packages: {error}"))
        })?;

        Ok(rows.into_iter().map(AssignmentPackage::from).collect())
    }

    async fn list_delegation_packages(
        &self,
        delegation_ids: &[DelegationId],
    ) -> AppResult<Vec<DelegationPackage>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, delegation_id AS owner_id, package_id AS granted_id
            FROM delegation_packages
            WHERE delegation_id = ANY($1)
            "#,
        )
        .bind(uuids(delegation_ids, DelegationId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list delegation packages: {error}"))
        })?;

        Ok(rows.into_iter().map(DelegationPackage::from).collect())
    }

    async fn add_assignment_packages(
        &self,
        assignment_id: AssignmentId,
        package_ids: &[PackageId],
        audit: &AuditContext,
    ) -> AppResult<Vec<AssignmentPackage>> {
        if package_ids.is_empty() {
            return Ok(Vec::new());
        }

        let grant_ids: Vec<Uuid> = package_ids
            .iter()
            .map(|_| AssignmentPackageId::new().as_uuid())
            .collect();

        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            INSERT INTO assignment_packages (
                id, assignment_id, package_id, changed_by, changed_by_system, operation_id
            )
            SELECT staged.id, $1, staged.package_id, $4, $5, $6
            FROM UNNEST($2::UUID[], $3::UUID[]) AS staged(id, package_id)
            ON CONFLICT (assignment_id, package_id) DO NOTHING
            RETURNING id, assignment_id AS owner_id, package_id AS granted_id
            "#,
        )
        .bind(assignment_id.as_uuid())
        .bind(grant_ids)
        .bind(uuids(package_ids, PackageId::as_uuid))
        .bind(audit.changed_by())
        .bind(audit.changed_by_system())
        .bind(audit.operation_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                AppError::NotFound(format!(
                    "assignment '{assignment_id}' or one of its packages does not exist"
                ))
            } else {
                AppError::Internal(format!(
                    "failed to add packages to assignment '{assignment_id}': {error}"
                ))
            }
        })?;

        Ok(rows.into_iter().map(AssignmentPackage::from).collect())
    }
}

#[async_trait]
impl ResourceRepository for PostgresReferenceStore {
    async fn list_resources(&self, resource_ids: &[ResourceId]) -> AppResult<Vec<Resource>> {
        let rows = sqlx::query_as::<_, ResourceRow>(
            r#"
            SELECT id, ref_id, provider_id, name
            FROM resources
            WHERE id = ANY($1)
            ORDER BY ref_id
            "#,
        )
        .bind(uuids(resource_ids, ResourceId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list resources: {error}")))?;

        Ok(rows.into_iter().map(Resource::from).collect())
    }

    async fn list_assignment_resources(
        &self,
        assignment_ids: &[AssignmentId],
    ) -> AppResult<Vec<AssignmentResource>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, assignment_id AS owner_id, resource_id AS granted_id
            FROM assignment_resources
            WHERE assignment_id = ANY($1)
            "#,
        )
        .bind(uuids(assignment_ids, AssignmentId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list assignment resources: {error}"))
        })?;

        Ok(rows.into_iter().map(AssignmentResource::from).collect())
    }

    async fn list_delegation_resources(
        &self,
        delegation_ids: &[DelegationId],
    ) -> AppResult<Vec<DelegationResource>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT id, delegation_id AS owner_id, resource_id AS granted_id
            FROM delegation_resources
            WHERE delegation_id = ANY($1)
            "#,
        )
        .bind(uuids(delegation_ids, DelegationId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list delegation resources: {error}"))
        })?;

        Ok(rows.into_iter().map(DelegationResource::from).collect())
    }
}
