//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod cached_reference_snapshot_source;
mod http_assignment_event_source;
mod postgres_reference_store;
mod postgres_sync_cursor_repository;

pub use cached_reference_snapshot_source::CachedReferenceSnapshotSource;
pub use http_assignment_event_source::{HttpAssignmentEventSource, RegistryFeedConfig};
pub use postgres_reference_store::PostgresReferenceStore;
pub use postgres_sync_cursor_repository::PostgresSyncCursorRepository;
