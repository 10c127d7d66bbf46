//! Error types for the PDF thumbnail server
//!
//! `ThumbnailError` is what the plugin pipeline produces. It never escapes the
//! plugin boundary: every variant is turned into a short escaped message that
//! is rendered inline in the wiki page. `AppError` covers the HTTP surface that
//! is not inline plugin output (serving cached PNGs).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::USAGE;

/// Result type for the thumbnail pipeline
pub type ThumbnailResult<T> = std::result::Result<T, ThumbnailError>;

/// Errors produced while turning a plugin argument into a thumbnail
#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// Wrong number of plugin arguments
    #[error("#pdf_thumbnail(): Usage:{}", USAGE)]
    Usage,

    /// Remote URL given while external files are disabled
    #[error("Use of external file is disabled: {uri}")]
    ExternalFileDisabled { uri: String },

    /// The wiki upload directory does not exist
    #[error("Upload dir does not exist")]
    UploadDirMissing,

    /// The referenced attachment is not on disk
    #[error("File not found: \"{attachment}\" at page \"{page}\"")]
    AttachmentNotFound { attachment: String, page: String },

    /// No rasterization backend compiled in or usable
    #[error("PDF rasterizer not available")]
    CapabilityMissing,

    /// The backend could not read, render or encode the document
    #[error("{0}")]
    Conversion(String),

    /// Cache directory, marker file or metadata failure
    #[error("Cache error: {0}")]
    CacheIo(#[from] std::io::Error),

    /// Thumbnail generation exceeded the request bound
    #[error("Thumbnail generation timed out after {0} seconds")]
    Timeout(u64),
}

impl ThumbnailError {
    /// Escaped message suitable for inline page content
    pub fn to_html(&self) -> String {
        html_escape::encode_text(&self.to_string()).into_owned()
    }
}

/// Result type for HTTP handlers
pub type Result<T> = std::result::Result<T, AppError>;

/// HTTP error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                (StatusCode::NOT_FOUND, "not_found", "File not found".to_string())
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "IO error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
