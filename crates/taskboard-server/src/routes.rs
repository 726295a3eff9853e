use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::config::Config;
use crate::db::DbPool;
use crate::handlers::{events as event_handlers, workspaces as workspace_handlers};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
}

pub fn create_router(db: DbPool, config: Config) -> Router {
    let state = AppState { db, config };

    // Workspace routes, all behind the session-token middleware
    let workspace_routes = Router::new()
        .route("/", get(workspace_handlers::list_workspaces))
        .route("/add-member", post(workspace_handlers::add_member))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Event intake is invoked by the delivery infrastructure, not by users
    let event_routes = Router::new().route("/", post(event_handlers::receive_event));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/workspaces", workspace_routes)
        .nest("/api/events", event_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
