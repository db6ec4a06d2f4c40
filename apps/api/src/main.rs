//! Access-management API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use accessmgmt_application::{
    AssignmentService, PermissionQueryService, ReferenceSnapshotSource, RelationResolver,
    ResolverConfig,
};
use accessmgmt_core::AppError;
use accessmgmt_infrastructure::{CachedReferenceSnapshotSource, PostgresReferenceStore};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let store = Arc::new(PostgresReferenceStore::new(pool.clone()));
    let snapshots: Arc<dyn ReferenceSnapshotSource> = if config.snapshot_ttl.is_zero() {
        store.clone()
    } else {
        Arc::new(CachedReferenceSnapshotSource::new(
            store.clone(),
            config.snapshot_ttl,
        ))
    };

    let relation_resolver = RelationResolver::new(
        snapshots,
        store.clone(),
        ResolverConfig {
            timeout: config.resolver_timeout,
        },
    );
    let permission_query_service = PermissionQueryService::new(
        relation_resolver.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let assignment_service = AssignmentService::new(
        permission_query_service.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    );

    let app_state = AppState {
        postgres_pool: pool,
        relation_resolver,
        permission_query_service,
        assignment_service,
    };

    let app = api_router::build_router(app_state, &config.frontend_url)?;
    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        resolver_timeout_ms = config.resolver_timeout.as_millis(),
        snapshot_ttl_ms = config.snapshot_ttl.as_millis(),
        "accessmgmt-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
