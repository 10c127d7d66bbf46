//! Cached thumbnail files
//!
//! Only `{32 hex}.png` names are served from the cache directory, which is
//! what the `.htaccess` marker grants to a web server fronting the same
//! directory.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::cache::CacheKey;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Routes for the cache URL path (already stripped of any trailing slash)
pub fn router(cache_url: &str) -> Router<AppState> {
    Router::new().route(&format!("{}/:file", cache_url), get(serve_cached))
}

async fn serve_cached(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response> {
    let key = CacheKey::from_file_name(&file)
        .ok_or_else(|| AppError::NotFound(format!("No cached thumbnail named {}", file)))?;

    let path = state.plugin().cache().entry_path(&key);
    let data = tokio::fs::read(&path).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CACHE_CONTROL, "max-age=3600")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}
