//! Access-management registry sync worker.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use accessmgmt_application::{AssignmentSyncConfig, AssignmentSyncService};
use accessmgmt_core::{AppError, AppResult};
use accessmgmt_infrastructure::{
    HttpAssignmentEventSource, PostgresReferenceStore, PostgresSyncCursorRepository,
    RegistryFeedConfig,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    registry_base_url: String,
    registry_page_size: u32,
    registry_max_attempts: u8,
    registry_retry_backoff_ms: u64,
    poll_interval_ms: u64,
    worker_id: String,
    stream: String,
    system_entity_id: Uuid,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let sync_service = build_sync_service(pool, http_client, &config);

    let cancellation = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancellation.clone()));

    info!(
        worker_id = %config.worker_id,
        registry_base_url = %config.registry_base_url,
        stream = %config.stream,
        page_size = config.registry_page_size,
        poll_interval_ms = config.poll_interval_ms,
        "accessmgmt-worker started"
    );

    loop {
        match sync_service.run(&cancellation).await {
            Ok(summary) if summary.events > 0 => {
                info!(
                    worker_id = %config.worker_id,
                    pages = summary.pages,
                    events = summary.events,
                    flushes = summary.flushes,
                    "registry sync cycle applied changes"
                );
            }
            Ok(_) => {}
            Err(error) => {
                warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "registry sync cycle failed"
                );
            }
        }

        tokio::select! {
            () = cancellation.cancelled() => break,
            () = tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)) => {}
        }
    }

    info!(worker_id = %config.worker_id, "accessmgmt-worker stopped");
    Ok(())
}

async fn cancel_on_ctrl_c(cancellation: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested, finishing current page"),
        Err(error) => warn!(error = %error, "failed to listen for shutdown signal"),
    }
    cancellation.cancel();
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_sync_service(
    pool: PgPool,
    http_client: reqwest::Client,
    config: &WorkerConfig,
) -> AssignmentSyncService {
    let source = HttpAssignmentEventSource::new(
        http_client,
        RegistryFeedConfig {
            base_url: config.registry_base_url.clone(),
            page_size: config.registry_page_size,
            fallback_actor: config.system_entity_id,
            max_attempts: config.registry_max_attempts,
            retry_backoff_ms: config.registry_retry_backoff_ms,
        },
    );

    AssignmentSyncService::new(
        Arc::new(source),
        Arc::new(PostgresReferenceStore::new(pool.clone())),
        Arc::new(PostgresSyncCursorRepository::new(pool)),
        AssignmentSyncConfig {
            stream: config.stream.clone(),
            system_id: config.system_entity_id,
        },
    )
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let registry_base_url = required_env("REGISTRY_BASE_URL")?
            .trim_end_matches('/')
            .to_owned();
        let registry_page_size = parse_env_u32("REGISTRY_PAGE_SIZE", 1000)?;
        let registry_max_attempts = parse_env_u8("REGISTRY_MAX_ATTEMPTS", 3)?;
        let registry_retry_backoff_ms = parse_env_u64("REGISTRY_RETRY_BACKOFF_MS", 250)?;
        let poll_interval_ms = parse_env_u64("SYNC_POLL_INTERVAL_MS", 5000)?;
        let worker_id = env::var("WORKER_ID")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("worker-{}", std::process::id()));
        let stream = env::var("SYNC_STREAM")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "registry-role-delegations".to_owned());
        let system_entity_id = required_env("SYNC_SYSTEM_ENTITY_ID").and_then(|value| {
            Uuid::parse_str(value.trim()).map_err(|error| {
                AppError::Validation(format!("invalid SYNC_SYSTEM_ENTITY_ID: {error}"))
            })
        })?;

        if registry_base_url.is_empty() {
            return Err(AppError::Validation(
                "REGISTRY_BASE_URL must not be empty".to_owned(),
            ));
        }

        if registry_page_size == 0 {
            return Err(AppError::Validation(
                "REGISTRY_PAGE_SIZE must be greater than zero".to_owned(),
            ));
        }

        if registry_max_attempts == 0 {
            return Err(AppError::Validation(
                "REGISTRY_MAX_ATTEMPTS must be greater than zero".to_owned(),
            ));
        }

        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "SYNC_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            registry_base_url,
            registry_page_size,
            registry_max_attempts,
            registry_retry_backoff_ms,
            poll_interval_ms,
            worker_id,
            stream,
            system_entity_id,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u8(name: &str, default: u8) -> AppResult<u8> {
    match env::var(name) {
        Ok(value) => value.parse::<u8>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
