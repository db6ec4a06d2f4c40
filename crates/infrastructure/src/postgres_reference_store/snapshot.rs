use sqlx::postgres::PgRow;

use super::*;

async fn load_rows<R, T>(
    transaction: &mut Transaction<'static, Postgres>,
    table: &str,
    statement: &'static str,
) -> AppResult<Vec<T>>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    T: From<R>,
{
    let rows = sqlx::query_as::<_, R>(statement)
        .fetch_all(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load {table} into snapshot: {error}"))
        })?;

    Ok(rows.into_iter().map(T::from).collect())
}

#[async_trait]
impl ReferenceSnapshotSource for PostgresReferenceStore {
    async fn load_snapshot(&self) -> AppResult<Arc<ReferenceSnapshot>> {
        let mut transaction = self.begin("snapshot").await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to isolate snapshot transaction: {error}"))
            })?;

        let data = ReferenceData {
            entities: load_rows::<EntityRow, _>(
                &mut transaction,
                "entities",
                "SELECT id, name, ref_id, type_id, variant_id, parent_id FROM entities",
            )
            .await?,
            roles: load_rows::<RoleRow, _>(
                &mut transaction,
                "roles",
                "SELECT id, code, urn, name, provider_id, entity_type_id, is_key_role, \
                 is_assignable FROM roles",
            )
            .await?,
            role_maps: load_rows::<RoleMapRow, _>(
                &mut transaction,
                "role maps",
                "SELECT has_role_id, get_role_id FROM role_maps",
            )
            .await?,
            assignments: load_rows::<AssignmentRow, _>(
                &mut transaction,
                "assignments",
                "SELECT id, from_id, to_id, role_id FROM assignments",
            )
            .await?,
            delegations: load_rows::<DelegationRow, _>(
                &mut transaction,
                "delegations",
                "SELECT id, from_id, to_id, facilitator_id FROM delegations",
            )
            .await?,
            role_packages: load_rows::<RolePackageRow, _>(
                &mut transaction,
                "role packages",
                "SELECT role_id, package_id, has_access, can_delegate FROM role_packages",
            )
            .await?,
            assignment_packages: load_rows::<GrantRow, _>(
                &mut transaction,
                "assignment packages",
                "SELECT id, assignment_id AS owner_id, package_id AS granted_id \
                 FROM assignment_packages",
            )
            .await?,
            delegation_packages: load_rows::<GrantRow, _>(
                &mut transaction,
                "delegation packages",
                "SELECT id, delegation_id AS owner_id, package_id AS granted_id \
                 FROM delegation_packages",
            )
            .await?,
            assignment_resources: load_rows::<GrantRow, _>(
                &mut transaction,
                "assignment resources",
                "SELECT id, assignment_id AS owner_id, resource_id AS granted_id \
                 FROM assignment_resources",
            )
            .await?,
            delegation_resources: load_rows::<GrantRow, _>(
                &mut transaction,
                "delegation resources",
                "SELECT id, delegation_id AS owner_id, resource_id AS granted_id \
                 FROM delegation_resources",
            )
            .await?,
        };

        commit(transaction, "snapshot").await?;
        Ok(Arc::new(ReferenceSnapshot::from_data(data)))
    }
}

#[async_trait]
impl RelationSupplementRepository for PostgresReferenceStore {
    async fn list_supplement_relations(
        &self,
        filter: &RelationFilter,
    ) -> AppResult<Vec<Relation>> {
        let rows = sqlx::query_as::<_, SupplementRow>(
            r#"
            SELECT DISTINCT
                from_id, role_id, via_id, via_role_id, to_id,
                package_id, resource_id, reason, package_source
            FROM relation_supplement
            WHERE ($1::UUID IS NULL OR from_id = $1)
              AND ($2::UUID IS NULL OR to_id = $2)
              AND ($3::UUID IS NULL OR role_id = $3)
              AND ($4::UUID IS NULL OR package_id = $4)
              AND ($5::UUID IS NULL OR resource_id = $5)
              AND ($6::UUID IS NULL OR facilitator_id = $6)
            "#,
        )
        .bind(filter.from_id().map(|id| id.as_uuid()))
        .bind(filter.to_id().map(|id| id.as_uuid()))
        .bind(filter.role_id().map(|id| id.as_uuid()))
        .bind(filter.package_id().map(|id| id.as_uuid()))
        .bind(filter.resource_id().map(|id| id.as_uuid()))
        .bind(filter.facilitator_id().map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list supplement relations: {error}"))
        })?;

        Ok(decode_supplement_rows(rows))
    }
}
