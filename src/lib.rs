//! PDF Thumbnail Server
//!
//! Renders the first page of a PDF (a wiki attachment or a remote URL) as a
//! PNG thumbnail linking back to the document, for the `#pdf_thumbnail(...)`
//! wiki plugin.
//!
//! # Modules
//!
//! - `source`: classifies plugin arguments and resolves wiki attachments
//! - `rasterizer`: first-page PDF to PNG conversion (MuPDF)
//! - `cache`: fingerprinted on-disk PNG cache with mtime freshness
//! - `markup`: the `<a><img></a>` fragment
//! - `plugin`: argument contract and error-to-HTML boundary
//! - `routes`: HTTP surface

pub mod cache;
pub mod config;
pub mod error;
pub mod markup;
pub mod plugin;
pub mod rasterizer;
pub mod routes;
pub mod source;
pub mod state;

#[cfg(test)]
mod test_support;

/// Argument synopsis shown in usage errors
pub const USAGE: &str = "([pagename/]attached-file-name|url)";

pub use cache::{CacheKey, CacheManager, ImageHandle};
pub use config::{Config, RenderConfig};
pub use error::{ThumbnailError, ThumbnailResult};
pub use plugin::ThumbnailPlugin;
pub use rasterizer::{default_rasterizer, Rasterizer};
pub use source::SourceReference;
