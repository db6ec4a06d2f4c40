use accessmgmt_application::{AssignmentService, PermissionQueryService, RelationResolver};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub postgres_pool: PgPool,
    pub relation_resolver: RelationResolver,
    pub permission_query_service: PermissionQueryService,
    pub assignment_service: AssignmentService,
}
