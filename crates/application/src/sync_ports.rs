use accessmgmt_core::AppResult;
use accessmgmt_domain::Assignment;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of change reported by an upstream assignment feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentEventKind {
    /// The assignment exists upstream.
    Upsert,
    /// The assignment was revoked upstream.
    Remove,
}

/// One upstream assignment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEvent {
    /// Change kind.
    pub kind: AssignmentEventKind,
    /// Affected assignment.
    pub assignment: Assignment,
    /// Party responsible for the change upstream.
    pub performed_by: Uuid,
}

/// One page of upstream changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEventPage {
    /// Changes in feed order.
    pub events: Vec<AssignmentEvent>,
    /// Cursor positioned after this page.
    pub next_cursor: String,
    /// Whether the feed has further pages right now.
    pub has_more: bool,
}

/// Port for reading the upstream assignment feed.
#[async_trait]
pub trait AssignmentEventSource: Send + Sync {
    /// Fetches the page following `cursor`, or the first page when `cursor` is absent.
    async fn fetch_page(&self, cursor: Option<&str>) -> AppResult<AssignmentEventPage>;
}

/// Port for persisting feed positions.
#[async_trait]
pub trait SyncCursorRepository: Send + Sync {
    /// Returns the stored cursor of a named stream.
    async fn load_cursor(&self, stream: &str) -> AppResult<Option<String>>;

    /// Stores the cursor of a named stream.
    async fn save_cursor(&self, stream: &str, cursor: &str) -> AppResult<()>;
}
