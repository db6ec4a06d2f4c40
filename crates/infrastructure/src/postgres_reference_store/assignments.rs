use super::*;

impl PostgresReferenceStore {
    async fn find_assignment_by_key(&self, key: AssignmentKey) -> AppResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, from_id, to_id, role_id
            FROM assignments
            WHERE from_id = $1 AND to_id = $2 AND role_id = $3
            "#,
        )
        .bind(key.from_id.as_uuid())
        .bind(key.to_id.as_uuid())
        .bind(key.role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find assignment by key: {error}")))?;

        Ok(row.map(Assignment::from))
    }
}

#[async_trait]
impl AssignmentRepository for PostgresReferenceStore {
    async fn find_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, from_id, to_id, role_id
            FROM assignments
            WHERE id = $1
            "#,
        )
        .bind(assignment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find assignment '{assignment_id}': {error}"
            ))
        })?;

        Ok(row.map(Assignment::from))
    }

    async fn list_assignments(&self, query: AssignmentQuery) -> AppResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, from_id, to_id, role_id
            FROM assignments
            WHERE ($1::UUID IS NULL OR from_id = $1)
              AND ($2::UUID IS NULL OR to_id = $2)
              AND ($3::UUID IS NULL OR role_id = $3)
            ORDER BY from_id, to_id, role_id
            "#,
        )
        .bind(query.from_id.map(|id| id.as_uuid()))
        .bind(query.to_id.map(|id| id.as_uuid()))
        .bind(query.role_id.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn create_assignment(
        &self,
        assignment: Assignment,
        audit: &AuditContext,
    ) -> AppResult<Assignment> {
        let result = sqlx::query_as::<_, AssignmentRow>(
            r#"
            INSERT INTO assignments (
                id, from_id, to_id, role_id, changed_by, changed_by_system, operation_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (from_id, role_id, to_id) DO NOTHING
            RETURNING id, from_id, to_id, role_id
            "#,
        )
        .bind(assignment.id.as_uuid())
        .bind(assignment.from_id.as_uuid())
        .bind(assignment.to_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(audit.changed_by())
        .bind(audit.changed_by_system())
        .bind(audit.operation_id())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(Assignment::from(row)),
            Ok(None) => self
                .find_assignment_by_key(assignment.key())
                .await?
                .ok_or_else(|| {
                    AppError::Conflict(format!(
                        "assignment '{}' -> '{}' was removed while being created",
                        assignment.from_id, assignment.to_id
                    ))
                }),
            Err(error) if is_foreign_key_violation(&error) => Err(AppError::NotFound(format!(
                "assignment '{}' references a party or role that does not exist",
                assignment.id
            ))),
            Err(error) if is_unique_violation(&error) => Err(AppError::Conflict(format!(
                "assignment id '{}' is already taken by another assignment",
                assignment.id
            ))),
            Err(error) => Err(AppError::Internal(format!(
                "failed to create assignment '{}': {error}",
                assignment.id
            ))),
        }
    }

    async fn delete_assignment(
        &self,
        assignment_id: AssignmentId,
        audit: &AuditContext,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            WITH removed AS (
                DELETE FROM assignments
                WHERE id = $1
                RETURNING id
            )
            INSERT INTO reference_deletions (
                table_name, row_id, changed_by, changed_by_system, operation_id
            )
            SELECT 'assignments', removed.id, $2, $3, $4
            FROM removed
            "#,
        )
        .bind(assignment_id.as_uuid())
        .bind(audit.changed_by())
        .bind(audit.changed_by_system())
        .bind(audit.operation_id())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to delete assignment '{assignment_id}': {error}"
            ))
        })?;

        Ok(())
    }

    async fn merge_assignments(
        &self,
        assignments: &[Assignment],
        audit: &AuditContext,
    ) -> AppResult<u64> {
        if assignments.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = assignments.iter().map(|row| row.id.as_uuid()).collect();
        let from_ids: Vec<Uuid> = assignments.iter().map(|row| row.from_id.as_uuid()).collect();
        let to_ids: Vec<Uuid> = assignments.iter().map(|row| row.to_id.as_uuid()).collect();
        let role_ids: Vec<Uuid> = assignments.iter().map(|row| row.role_id.as_uuid()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO assignments (
                id, from_id, to_id, role_id, changed_by, changed_by_system, operation_id
            )
            SELECT staged.id, staged.from_id, staged.to_id, staged.role_id, $5, $6, $7
            FROM UNNEST($1::UUID[], $2::UUID[], $3::UUID[], $4::UUID[])
                AS staged(id, from_id, to_id, role_id)
            ON CONFLICT (from_id, role_id, to_id) DO NOTHING
            "#,
        )
        .bind(ids)
        .bind(from_ids)
        .bind(to_ids)
        .bind(role_ids)
        .bind(audit.changed_by())
        .bind(audit.changed_by_system())
        .bind(audit.operation_id())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to merge assignments in operation '{}': {error}",
                audit.operation_id()
            ))
        })?;

        Ok(result.rows_affected())
    }

    async fn remove_assignments(
        &self,
        keys: &[AssignmentKey],
        audit: &AuditContext,
    ) -> AppResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let from_ids: Vec<Uuid> = keys.iter().map(|key| key.from_id.as_uuid()).collect();
        let to_ids: Vec<Uuid> = keys.iter().map(|key| key.to_id.as_uuid()).collect();
        let role_ids: Vec<Uuid> = keys.iter().map(|key| key.role_id.as_uuid()).collect();

        let result = sqlx::query(
            r#"
            WITH removed AS (
                DELETE FROM assignments
                USING UNNEST($1::UUID[], $2::UUID[], $3::UUID[]) AS staged(from_id, to_id, role_id)
                WHERE assignments.from_id = staged.from_id
                  AND assignments.to_id = staged.to_id
                  AND assignments.role_id = staged.role_id
                RETURNING assignments.id
            )
            INSERT INTO reference_deletions (
                table_name, row_id, changed_by, changed_by_system, operation_id
            )
            SELECT 'assignments', removed.id, $4, $5, $6
            FROM removed
            "#,
        )
        .bind(from_ids)
        .bind(to_ids)
        .bind(role_ids)
        .bind(audit.changed_by())
        .bind(audit.changed_by_system())
        .bind(audit.operation_id())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to remove assignments in operation '{}': {error}",
                audit.operation_id()
            ))
        })?;

        Ok(result.rows_affected())
    }
}
