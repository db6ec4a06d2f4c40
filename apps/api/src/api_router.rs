use accessmgmt_core::AppError;
use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let query_routes = Router::new()
        .route(
            "/api/relations",
            get(handlers::relations::list_relations_handler),
        )
        .route(
            "/api/relations/packages",
            get(handlers::relations::list_relations_with_packages_handler),
        )
        .route(
            "/api/parties/{party_id}/connections/{direction}",
            get(handlers::parties::list_connections_handler),
        )
        .route(
            "/api/parties/{party_id}/packages/{direction}",
            get(handlers::parties::list_package_permissions_handler),
        )
        .route(
            "/api/parties/{party_id}/resources/{direction}",
            get(handlers::parties::list_resource_permissions_handler),
        )
        .route(
            "/api/parties/{party_id}/assignable-packages",
            get(handlers::parties::list_assignable_packages_handler),
        )
        .route(
            "/api/assignments/{assignment_id}/packages",
            get(handlers::assignments::list_assignment_packages_handler),
        );

    let mutation_routes = Router::new()
        .route(
            "/api/assignments",
            post(handlers::assignments::create_assignment_handler)
                .delete(handlers::assignments::delete_assignment_handler),
        )
        .route(
            "/api/assignments/{assignment_id}/packages",
            post(handlers::assignments::add_assignment_packages_handler),
        )
        .route(
            "/api/delegations",
            post(handlers::delegations::create_delegation_handler),
        )
        .route(
            "/api/delegations/{delegation_id}",
            delete(handlers::delegations::delete_delegation_handler),
        )
        .route_layer(from_fn(middleware::require_audit_context));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(query_routes)
        .merge(mutation_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
