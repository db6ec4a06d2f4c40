use accessmgmt_application::SyncCursorRepository;
use accessmgmt_core::{AppError, AppResult};
use async_trait::async_trait;
use sqlx::PgPool;


/// PostgreSQL-backed store of feed positions, one row per stream.
#[derive(Clone)]
pub struct PostgresSyncCursorRepository {
    pool: PgPool,
}

impl PostgresSyncCursorRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncCursorRepository for PostgresSyncCursorRepository {
    async fn load_cursor(&self, stream: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT cursor
            FROM sync_cursors
            WHERE stream = $1
            "#,
        )
        .bind(stream)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load cursor of stream '{stream}': {error}"))
        })
    }

    async fn save_cursor(&self, stream: &str, cursor: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sync_cursors (stream, cursor)
            VALUES ($1, $2)
            ON CONFLICT (stream)
            DO UPDATE SET cursor = EXCLUDED.cursor, updated_at = now()
            "#,
        )
        .bind(stream)
        .bind(cursor)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to save cursor of stream '{stream}': {error}"))
        })?;

        Ok(())
    }
}
