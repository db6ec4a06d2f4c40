use super::*;

#[async_trait]
impl EntityRepository for PostgresReferenceStore {
    async fn find_entity(&self, entity_id: EntityId) -> AppResult<Option<Entity>> {
        let row = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, ref_id, type_id, variant_id, parent_id
            FROM entities
            WHERE id = $1
            "#,
        )
        .bind(entity_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find entity '{entity_id}': {error}"))
        })?;

        Ok(row.map(Entity::from))
    }

    async fn list_entities(&self, query: EntityQuery) -> AppResult<Vec<Entity>> {
        let ids = query
            .ids
            .as_deref()
            .map(|ids| uuids(ids, EntityId::as_uuid));
        let rows = sqlx::query_as::<_, EntityRow>(
            r#"
            SELECT id, name, ref_id, type_id, variant_id, parent_id
            FROM entities
            WHERE ($1::UUID[] IS NULL OR id = ANY($1))
              AND ($2::UUID IS NULL OR parent_id = $2)
            ORDER BY name, id
            "#,
        )
        .bind(ids)
        .bind(query.parent_id.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list entities: {error}")))?;

        Ok(rows.into_iter().map(Entity::from).collect())
    }

    async fn find_entity_type(&self, type_id: EntityTypeId) -> AppResult<Option<EntityType>> {
        let row = sqlx::query_as::<_, EntityTypeRow>(
            r#"
            SELECT id, name, kind
            FROM entity_types
            WHERE id = $1
            "#,
        )
        .bind(type_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find entity type '{type_id}': {error}"))
        })?;

        row.map(EntityType::try_from).transpose()
    }
}

#[async_trait]
impl RoleRepository for PostgresReferenceStore {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, code, urn, name, provider_id, entity_type_id, is_key_role, is_assignable
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{role_id}': {error}")))?;

        Ok(row.map(Role::from))
    }

    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, code, urn, name, provider_id, entity_type_id, is_key_role, is_assignable
            FROM roles
            WHERE code = $1
            ORDER BY id
            LIMIT 2
            "#,
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find role by code '{code}': {error}"))
        })?;

        if rows.len() > 1 {
            return Err(AppError::Conflict(format!(
                "role code '{code}' is ambiguous across providers"
            )));
        }

        Ok(rows.into_iter().next().map(Role::from))
    }

    async fn list_roles(&self, role_ids: &[RoleId]) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, code, urn, name, provider_id, entity_type_id, is_key_role, is_assignable
            FROM roles
            WHERE id = ANY($1)
            ORDER BY code, id
            "#,
        )
        .bind(uuids(role_ids, RoleId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn list_role_maps(&self) -> AppResult<Vec<RoleMap>> {
        let rows = sqlx::query_as::<_, RoleMapRow>(
            r#"
            SELECT has_role_id, get_role_id
            FROM role_maps
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role maps: {error}")))?;

        Ok(rows.into_iter().map(RoleMap::from).collect())
    }
}
