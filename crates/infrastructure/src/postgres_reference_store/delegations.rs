use super::*;

#[async_trait]
impl DelegationRepository for PostgresReferenceStore {
    async fn find_delegation(
        &self,
        delegation_id: DelegationId,
    ) -> AppResult<Option<Delegation>> {
        let row = sqlx::query_as::<_, DelegationRow>(
            r#"
            SELECT id, from_id, to_id, facilitator_id
            FROM delegations
            WHERE id = $1
            "#,
        )
        .bind(delegation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find delegation '{delegation_id}': {error}"
            ))
        })?;

        Ok(row.map(Delegation::from))
    }

    async fn list_delegations(&self, query: DelegationQuery) -> AppResult<Vec<Delegation>> {
        let rows = sqlx::query_as::<_, DelegationRow>(
            r#"
            SELECT id, from_id, to_id, facilitator_id
            FROM delegations
            WHERE ($1::UUID IS NULL OR from_id = $1)
              AND ($2::UUID IS NULL OR to_id = $2)
              AND ($3::UUID IS NULL OR from_id = $3 OR to_id = $3)
              AND ($4::UUID IS NULL OR facilitator_id = $4)
            ORDER BY facilitator_id, from_id, to_id
            "#,
        )
        .bind(query.from_assignment_id.map(|id| id.as_uuid()))
        .bind(query.to_assignment_id.map(|id| id.as_uuid()))
        .bind(query.assignment_id.map(|id| id.as_uuid()))
        .bind(query.facilitator_id.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list delegations: {error}")))?;

        Ok(rows.into_iter().map(Delegation::from).collect())
    }

    async fn create_delegation(
        &self,
        delegation: Delegation,
        audit: &AuditContext,
    ) -> AppResult<Delegation> {
        let mut transaction = self.begin("delegation create").await?;

        let inserted = sqlx::query_as::<_, DelegationRow>(
            r#"
            INSERT INTO delegations (
                id, from_id, to_id, facilitator_id, changed_by, changed_by_system, operation_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (from_id, to_id, facilitator_id) DO NOTHING
            RETURNING id, from_id, to_id, facilitator_id
            "#,
        )
        .bind(delegation.id.as_uuid())
        .bind(delegation.from_id.as_uuid())
        .bind(delegation.to_id.as_uuid())
        .bind(delegation.facilitator_id.as_uuid())
        .bind(audit.changed_by())
        .bind(audit.changed_by_system())
        .bind(audit.operation_id())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            if is_foreign_key_violation(&error) {
                AppError::NotFound(format!(
                    "delegation '{}' references an assignment or party that does not exist",
                    delegation.id
                ))
            } else if is_unique_violation(&error) {
                AppError::Conflict(format!(
                    "delegation id '{}' is already taken by another delegation",
                    delegation.id
                ))
            } else {
                AppError::Internal(format!(
                    "failed to create delegation '{}': {error}",
                    delegation.id
                ))
            }
        })?;

        let stored = match inserted {
            Some(row) => row,
            None => sqlx::query_as::<_, DelegationRow>(
                r#"
                SELECT id, from_id, to_id, facilitator_id
                FROM delegations
                WHERE from_id = $1 AND to_id = $2 AND facilitator_id = $3
                "#,
            )
            .bind(delegation.from_id.as_uuid())
            .bind(delegation.to_id.as_uuid())
            .bind(delegation.facilitator_id.as_uuid())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read existing delegation: {error}"))
            })?,
        };

        commit(transaction, "delegation create").await?;
        Ok(Delegation::from(stored))
    }

    async fn delete_delegation(
        &self,
        delegation_id: DelegationId,
        audit: &AuditContext,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            WITH removed AS (
                DELETE FROM delegations
                WHERE id = $1
                RETURNING id
            )
            INSERT INTO reference_deletions (
                table_name, row_id, changed_by, changed_by_system, operation_id
            )
            SELECT 'delegations', removed.id, $2, $3, $4
            FROM removed
            "#,
        )
        .bind(delegation_id.as_uuid())
        .bind(audit.changed_by())
        .bind(audit.changed_by_system())
        .bind(audit.operation_id())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to delete delegation '{delegation_id}': {error}"
            ))
        })?;

        Ok(())
    }
}
