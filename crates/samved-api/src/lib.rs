pub mod auth;
pub mod error;
pub mod extract;
pub mod generations;
pub mod middleware;
pub mod ratings;

use axum::{
    Json, Router,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::middleware::require_auth;

/// Every route the service exposes. Transport layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/languages", get(generations::list_languages))
        .route(
            "/generations",
            get(generations::list_mine).post(generations::create_generation),
        )
        .route("/generations/all", get(generations::list_all))
        .route("/generations/{id}", get(generations::get_generation))
        .route("/generations/{id}/rating", post(ratings::vote))
        .route("/shared", get(generations::get_shared))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
