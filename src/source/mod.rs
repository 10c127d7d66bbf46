//! Thumbnail source references
//!
//! A plugin argument is either a remote URL or an attachment reference. This
//! module classifies it, applies the external-file policy, and resolves
//! attachments to files on disk.

mod attachment;
mod page_name;

pub use attachment::{encode, Attachment, AttachmentResolver};
pub use page_name::{resolve_page_name, strip_bracket};

use std::time::SystemTime;

use crate::config::Config;
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::rasterizer::RasterSource;

/// Where a thumbnail comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    Attachment(Attachment),
    Remote(String),
}

impl SourceReference {
    /// String the cache key is derived from
    pub fn identity(&self) -> String {
        match self {
            SourceReference::Attachment(a) => a.path.to_string_lossy().into_owned(),
            SourceReference::Remote(url) => url.clone(),
        }
    }

    pub fn is_attachment(&self) -> bool {
        matches!(self, SourceReference::Attachment(_))
    }

    /// Modification time of a local source; remote sources have none
    pub fn modified(&self) -> Option<SystemTime> {
        match self {
            SourceReference::Attachment(a) => a.modified,
            SourceReference::Remote(_) => None,
        }
    }

    /// First page of this source, as the rasterizer reads it
    pub fn raster_source(&self) -> RasterSource {
        match self {
            SourceReference::Attachment(a) => RasterSource::Local(a.path.clone()),
            SourceReference::Remote(url) => RasterSource::Remote(url.clone()),
        }
    }

    /// Link target of the anchor around the thumbnail
    pub fn anchor_link(&self, base_uri: &str) -> String {
        match self {
            SourceReference::Attachment(a) => a.anchor_link(base_uri),
            SourceReference::Remote(url) => url.clone(),
        }
    }
}

/// Turns plugin arguments into source references
#[derive(Debug, Clone)]
pub struct SourceResolver {
    attachments: AttachmentResolver,
    disable_external_file: bool,
}

impl SourceResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            attachments: AttachmentResolver::new(&config.wiki),
            disable_external_file: config.render.disable_external_file,
        }
    }

    pub fn resolve(&self, reference: &str, current_page: &str) -> ThumbnailResult<SourceReference> {
        if is_url(reference) {
            if self.disable_external_file {
                return Err(ThumbnailError::ExternalFileDisabled {
                    uri: reference.to_string(),
                });
            }
            return Ok(SourceReference::Remote(reference.to_string()));
        }

        self.attachments
            .resolve(reference, current_page)
            .map(SourceReference::Attachment)
    }
}

/// Whether `reference` is an absolute URL with a supported scheme
pub fn is_url(reference: &str) -> bool {
    const SCHEMES: [&str; 4] = ["http", "https", "ftp", "news"];

    let Some((scheme, rest)) = reference.split_once("://") else {
        return false;
    };

    SCHEMES.contains(&scheme) && rest.chars().all(is_url_char)
}

fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_.!~*'();/?:@&=+$,%#".contains(c)
}
