use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use accessmgmt_core::{AppError, AppResult, AuditContext};
use accessmgmt_domain::{Assignment, AssignmentId, AssignmentKey, EntityId, RoleId};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{AssignmentSyncConfig, AssignmentSyncService};
use crate::test_support::FakeReferenceStore;
use crate::{
    AssignmentEvent, AssignmentEventKind, AssignmentEventPage, AssignmentEventSource,
    AssignmentQuery, AssignmentRepository, ReferenceData, SyncCursorRepository,
};

#[derive(Default)]
struct FakeFeed {
    pages: HashMap<Option<String>, AssignmentEventPage>,
    fetched: Mutex<Vec<Option<String>>>,
}

impl FakeFeed {
    fn with_page(mut self, cursor: Option<&str>, page: AssignmentEventPage) -> Self {
        self.pages.insert(cursor.map(str::to_owned), page);
        self
    }
}

#[async_trait]
impl AssignmentEventSource for FakeFeed {
    async fn fetch_page(&self, cursor: Option<&str>) -> AppResult<AssignmentEventPage> {
        let cursor = cursor.map(str::to_owned);
        self.fetched.lock().await.push(cursor.clone());
        Ok(self
            .pages
            .get(&cursor)
            .cloned()
            .unwrap_or_else(|| AssignmentEventPage {
                events: Vec::new(),
                next_cursor: cursor.unwrap_or_default(),
                has_more: false,
            }))
    }
}

#[derive(Default)]
struct FakeCursors {
    cursors: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl SyncCursorRepository for FakeCursors {
    async fn load_cursor(&self, stream: &str) -> AppResult<Option<String>> {
        Ok(self.cursors.lock().await.get(stream).cloned())
    }

    async fn save_cursor(&self, stream: &str, cursor: &str) -> AppResult<()> {
        self.cursors
            .lock()
            .await
            .insert(stream.to_owned(), cursor.to_owned());
        Ok(())
    }
}

/// Assignment store whose bulk writes always fail.
struct FailingAssignments;

#[async_trait]
impl AssignmentRepository for FailingAssignments {
    async fn find_assignment(&self, _: AssignmentId) -> AppResult<Option<Assignment>> {
        Ok(None)
    }

    async fn list_assignments(&self, _: AssignmentQuery) -> AppResult<Vec<Assignment>> {
        Ok(Vec::new())
    }

    async fn create_assignment(
        &self,
        assignment: Assignment,
        _: &AuditContext,
    ) -> AppResult<Assignment> {
        Ok(assignment)
    }

    async fn delete_assignment(&self, _: AssignmentId, _: &AuditContext) -> AppResult<()> {
        Ok(())
    }

    async fn merge_assignments(&self, _: &[Assignment], _: &AuditContext) -> AppResult<u64> {
        Err(AppError::Internal("store offline".to_owned()))
    }

    async fn remove_assignments(&self, _: &[AssignmentKey], _: &AuditContext) -> AppResult<u64> {
        Err(AppError::Internal("store offline".to_owned()))
    }
}

fn event(kind: AssignmentEventKind, assignment: Assignment, performed_by: Uuid) -> AssignmentEvent {
    AssignmentEvent {
        kind,
        assignment,
        performed_by,
    }
}

fn assignment() -> Assignment {
    Assignment::new(EntityId::new(), EntityId::new(), RoleId::new())
}

fn config() -> AssignmentSyncConfig {
    AssignmentSyncConfig {
        stream: "register-roles".to_owned(),
        system_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn page_is_split_at_every_flush_boundary() {
    let first_actor = Uuid::new_v4();
    let second_actor = Uuid::new_v4();
    let (a1, a2, a3) = (assignment(), assignment(), assignment());
    let feed = FakeFeed::default().with_page(
        None,
        AssignmentEventPage {
            events: vec![
                event(AssignmentEventKind::Upsert, a1, first_actor),
                event(AssignmentEventKind::Upsert, a2, first_actor),
                event(AssignmentEventKind::Remove, a1, first_actor),
                event(AssignmentEventKind::Upsert, a3, second_actor),
            ],
            next_cursor: "page-1".to_owned(),
            has_more: false,
        },
    );
    let store = Arc::new(FakeReferenceStore::new(ReferenceData::default()));
    let service = AssignmentSyncService::new(
        Arc::new(feed),
        store.clone(),
        Arc::new(FakeCursors::default()),
        config(),
    );

    let summary = service.run(&CancellationToken::new()).await;

    let Ok(summary) = summary else {
        panic!("sync run failed");
    };
    assert_eq!(summary.flushes, 3);
    assert_eq!(summary.merged, 3);
    assert_eq!(summary.removed, 1);
    assert_eq!(store.assignment_count().await, 2);

    let audits = store.audits.lock().await;
    let operations: HashSet<Uuid> = audits.iter().map(AuditContext::operation_id).collect();
    assert_eq!(operations.len(), 3);
    assert_eq!(audits[2].changed_by(), second_actor);
}

#[tokio::test]
async fn cursor_is_persisted_after_each_page_and_resumed() {
    let actor = Uuid::new_v4();
    let feed = Arc::new(
        FakeFeed::default()
            .with_page(
                None,
                AssignmentEventPage {
                    events: vec![event(AssignmentEventKind::Upsert, assignment(), actor)],
                    next_cursor: "page-1".to_owned(),
                    has_more: true,
                },
            )
            .with_page(
                Some("page-1"),
                AssignmentEventPage {
                    events: vec![event(AssignmentEventKind::Upsert, assignment(), actor)],
                    next_cursor: "page-2".to_owned(),
                    has_more: false,
                },
            ),
    );
    let cursors = Arc::new(FakeCursors::default());
    let store = Arc::new(FakeReferenceStore::new(ReferenceData::default()));
    let service =
        AssignmentSyncService::new(feed.clone(), store.clone(), cursors.clone(), config());

    let first = service.run(&CancellationToken::new()).await;
    let second = service.run(&CancellationToken::new()).await;

    assert!(matches!(first, Ok(summary) if summary.pages == 2 && summary.events == 2));
    assert!(matches!(second, Ok(summary) if summary.events == 0));
    assert_eq!(
        cursors.load_cursor("register-roles").await.unwrap_or_default(),
        Some("page-2".to_owned())
    );
    assert_eq!(
        feed.fetched.lock().await.last().cloned().flatten(),
        Some("page-2".to_owned())
    );
    assert_eq!(store.assignment_count().await, 2);
}

#[tokio::test]
async fn cancelled_run_fetches_nothing() {
    let feed = Arc::new(FakeFeed::default());
    let token = CancellationToken::new();
    token.cancel();
    let service = AssignmentSyncService::new(
        feed.clone(),
        Arc::new(FakeReferenceStore::new(ReferenceData::default())),
        Arc::new(FakeCursors::default()),
        config(),
    );

    let summary = service.run(&token).await;

    assert!(matches!(summary, Ok(summary) if summary.cancelled && summary.pages == 0));
    assert!(feed.fetched.lock().await.is_empty());
}

#[tokio::test]
async fn failed_flush_keeps_cursor_and_names_operation() {
    let feed = FakeFeed::default().with_page(
        None,
        AssignmentEventPage {
            events: vec![event(
                AssignmentEventKind::Upsert,
                assignment(),
                Uuid::new_v4(),
            )],
            next_cursor: "page-1".to_owned(),
            has_more: false,
        },
    );
    let cursors = Arc::new(FakeCursors::default());
    let service = AssignmentSyncService::new(
        Arc::new(feed),
        Arc::new(FailingAssignments),
        cursors.clone(),
        config(),
    );

    let result = service.run(&CancellationToken::new()).await;

    let Err(AppError::Internal(message)) = result else {
        panic!("expected flush failure");
    };
    assert!(message.starts_with("assignment flush "));
    assert!(message.contains("store offline"));
    assert_eq!(
        cursors.load_cursor("register-roles").await.unwrap_or_default(),
        None
    );
}
