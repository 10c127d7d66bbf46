//! HTTP routes

pub mod cache;
pub mod thumbnail;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    rasterizer: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        rasterizer: state.plugin().rasterizer_available(),
    })
}

/// Build the application router
///
/// Cached thumbnails are served under the path of the configured cache URL.
/// When that URL points elsewhere (another host), no cache route is mounted.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/health", get(health_check))
        .nest("/api/v1/thumbnail", thumbnail::router());

    let cache_url = state.config().render.cache_url.clone();
    if cache_url.is_empty() || cache_url.starts_with('/') {
        router = router.merge(cache::router(&cache_url));
    } else {
        tracing::info!(cache_url = %cache_url, "Cache URL is external, not serving cached thumbnails");
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
