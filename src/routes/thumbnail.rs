//! Thumbnail fragment endpoint
//!
//! `GET /api/v1/thumbnail?args=...&page=...` runs the plugin and returns its
//! HTML. Plugin failures are part of the fragment, so the status is always
//! 200.
//!
//! Every `args` parameter carries one plugin argument verbatim, commas
//! included; repeat the parameter to pass several.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use tokio::time::timeout;

use crate::error::ThumbnailError;
use crate::state::AppState;

/// Upper bound on one thumbnail request. The render itself may still finish
/// in the background and populate the cache.
const RENDER_TIMEOUT_SECS: u64 = 30;

/// Plugin call decoded from the query string
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ThumbnailQuery {
    /// One entry per `args` parameter, in order
    pub args: Vec<String>,
    /// Page embedding the thumbnail
    pub page: Option<String>,
}

impl ThumbnailQuery {
    /// Collect `args` and `page` from decoded query pairs
    ///
    /// Empty `args` values are dropped; the last `page` wins.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = ThumbnailQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "args" => {
                    let arg = value.trim();
                    if !arg.is_empty() {
                        query.args.push(arg.to_string());
                    }
                }
                "page" => query.page = Some(value),
                _ => {}
            }
        }
        query
    }

    fn plugin_args(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

pub fn router() -> axum::Router<AppState> {
    Router::new().route("/", get(render_thumbnail))
}

async fn render_thumbnail(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<String> {
    let query = ThumbnailQuery::from_pairs(pairs);
    let page = query
        .page
        .clone()
        .unwrap_or_else(|| state.config().wiki.default_page.clone());
    let args = query.plugin_args();

    let html = match timeout(
        Duration::from_secs(RENDER_TIMEOUT_SECS),
        state.plugin().convert(&args, &page),
    )
    .await
    {
        Ok(html) => html,
        Err(_) => {
            let err = ThumbnailError::Timeout(RENDER_TIMEOUT_SECS);
            tracing::warn!(page = %page, args = ?args, "pdf_thumbnail failed: {}", err);
            err.to_html()
        }
    };

    Html(html)
}
