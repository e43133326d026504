use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::AppState;
use super::auth::require_admin;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/mongodump",
            post(handlers::mongodump).fallback(handlers::method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route(
            "/health",
            get(handlers::health_check).fallback(handlers::method_not_allowed),
        )
        .merge(protected)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
