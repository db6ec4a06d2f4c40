use std::sync::Arc;

use accessmgmt_core::{AppError, AppResult, AuditContext};
use accessmgmt_domain::{Assignment, AssignmentKey};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    AssignmentEvent, AssignmentEventKind, AssignmentEventSource, AssignmentRepository,
    SyncCursorRepository,
};

mod staged_batch;

#[cfg(test)]
mod tests;

pub use staged_batch::{FlushReason, StagedBatch, StagedRows};

/// Static settings of one sync stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSyncConfig {
    /// Name the cursor is stored under.
    pub stream: String,
    /// System recorded as `changed_by_system` on every write.
    pub system_id: Uuid,
}

/// Totals of one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Pages fully applied.
    pub pages: usize,
    /// Events applied.
    pub events: usize,
    /// Batches written.
    pub flushes: usize,
    /// Assignments inserted.
    pub merged: u64,
    /// Assignments removed.
    pub removed: u64,
    /// Whether the run stopped on cancellation.
    pub cancelled: bool,
}

/// Pulls upstream assignment changes into the assignment store.
///
/// Each page is staged into batches that are written whenever a match key would be touched
/// twice, the responsible actor changes, or the page ends. The cursor only advances after the
/// final flush of a page has succeeded.
#[derive(Clone)]
pub struct AssignmentSyncService {
    source: Arc<dyn AssignmentEventSource>,
    assignments: Arc<dyn AssignmentRepository>,
    cursors: Arc<dyn SyncCursorRepository>,
    config: AssignmentSyncConfig,
}

impl AssignmentSyncService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        source: Arc<dyn AssignmentEventSource>,
        assignments: Arc<dyn AssignmentRepository>,
        cursors: Arc<dyn SyncCursorRepository>,
        config: AssignmentSyncConfig,
    ) -> Self {
        Self {
            source,
            assignments,
            cursors,
            config,
        }
    }

    /// Applies pages until the feed is drained or `cancellation` fires.
    ///
    /// Cancellation is observed between pages only, never inside one.
    pub async fn run(&self, cancellation: &CancellationToken) -> AppResult<SyncSummary> {
        let mut cursor = self.cursors.load_cursor(&self.config.stream).await?;
        let mut summary = SyncSummary::default();

        loop {
            if cancellation.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let page = self.source.fetch_page(cursor.as_deref()).await?;
            summary.events += page.events.len();
            self.apply_page(page.events, &mut summary).await?;

            self.cursors
                .save_cursor(&self.config.stream, &page.next_cursor)
                .await?;
            summary.pages += 1;
            debug!(
                stream = %self.config.stream,
                cursor = %page.next_cursor,
                "assignment sync page applied"
            );
            cursor = Some(page.next_cursor);

            if !page.has_more {
                break;
            }
        }

        info!(
            stream = %self.config.stream,
            pages = summary.pages,
            events = summary.events,
            flushes = summary.flushes,
            merged = summary.merged,
            removed = summary.removed,
            cancelled = summary.cancelled,
            "assignment sync finished"
        );
        Ok(summary)
    }

    async fn apply_page(
        &self,
        events: Vec<AssignmentEvent>,
        summary: &mut SyncSummary,
    ) -> AppResult<()> {
        let mut batch = StagedBatch::new();

        for event in events {
            let mut pending = Some(event.assignment);
            while let Some(assignment) = pending.take() {
                let staged = match event.kind {
                    AssignmentEventKind::Upsert => {
                        batch.stage_merge(event.performed_by, assignment)
                    }
                    AssignmentEventKind::Remove => {
                        batch.stage_removal(event.performed_by, assignment)
                    }
                };
                if let Err((reason, assignment)) = staged {
                    self.flush(&mut batch, reason, summary).await?;
                    pending = Some(assignment);
                }
            }
        }

        self.flush(&mut batch, FlushReason::EndOfPage, summary)
            .await
    }

    async fn flush(
        &self,
        batch: &mut StagedBatch<Assignment>,
        reason: FlushReason,
        summary: &mut SyncSummary,
    ) -> AppResult<()> {
        let Some(rows) = batch.drain() else {
            return Ok(());
        };
        let audit = AuditContext::new(rows.actor, self.config.system_id);

        let merged = if rows.merges.is_empty() {
            0
        } else {
            self.assignments
                .merge_assignments(&rows.merges, &audit)
                .await
                .map_err(|error| flush_error(&audit, error))?
        };
        let removed = if rows.removals.is_empty() {
            0
        } else {
            let keys: Vec<AssignmentKey> = rows
                .removals
                .iter()
                .map(Assignment::key)
                .collect();
            self.assignments
                .remove_assignments(&keys, &audit)
                .await
                .map_err(|error| flush_error(&audit, error))?
        };

        summary.flushes += 1;
        summary.merged += merged;
        summary.removed += removed;
        info!(
            operation_id = %audit.operation_id(),
            actor = %rows.actor,
            reason = reason.as_str(),
            merged,
            removed,
            "assignment batch flushed"
        );
        Ok(())
    }
}

fn flush_error(audit: &AuditContext, error: AppError) -> AppError {
    AppError::Internal(format!(
        "assignment flush {} failed: {error}",
        audit.operation_id()
    ))
}
