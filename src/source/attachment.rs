//! Attachment resolution
//!
//! Maps `[page/]file` plugin arguments onto the wiki's upload directory, where
//! attachments are stored flat as `HEX(page)_HEX(file)`.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::config::WikiConfig;
use crate::error::{ThumbnailError, ThumbnailResult};

use super::page_name::{resolve_page_name, strip_bracket};

/// A wiki attachment that exists on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Resolved upload path
    pub path: PathBuf,
    /// Page the attachment belongs to
    pub page: String,
    /// Attachment file name as shown to users
    pub name: String,
    /// Modification time of `path` at resolution time
    pub modified: Option<SystemTime>,
}

impl Attachment {
    /// Download link handled by the wiki's attach plugin
    pub fn anchor_link(&self, base_uri: &str) -> String {
        format!(
            "{}?plugin=attach&refer={}&openfile={}",
            base_uri,
            urlencoding::encode(&self.page),
            urlencoding::encode(&self.name)
        )
    }
}

/// Resolves attachment references against the upload directory
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    upload_dir: PathBuf,
    default_page: String,
}

impl AttachmentResolver {
    pub fn new(config: &WikiConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            default_page: config.default_page.clone(),
        }
    }

    /// Resolve `reference` as seen from `current_page`
    pub fn resolve(&self, reference: &str, current_page: &str) -> ThumbnailResult<Attachment> {
        if !self.upload_dir.is_dir() {
            return Err(ThumbnailError::UploadDirMissing);
        }

        let (page, name) = self.split_reference(reference, current_page);
        let path = self.upload_path(&page, &name);

        if !path.is_file() {
            return Err(ThumbnailError::AttachmentNotFound {
                attachment: name,
                page,
            });
        }

        let modified = path.metadata().and_then(|m| m.modified()).ok();

        Ok(Attachment {
            path,
            page,
            name,
            modified,
        })
    }

    /// Split `[page/]file` at the last slash and resolve the page part
    fn split_reference(&self, reference: &str, current_page: &str) -> (String, String) {
        match reference.rsplit_once('/') {
            Some((page, name)) if !page.is_empty() && !name.is_empty() => {
                let page = match page {
                    "." | ".." => format!("{}/", page),
                    _ => page.to_string(),
                };
                let page = resolve_page_name(strip_bracket(&page), current_page, &self.default_page);
                (page, name.to_string())
            }
            _ => (current_page.to_string(), reference.to_string()),
        }
    }

    fn upload_path(&self, page: &str, name: &str) -> PathBuf {
        self.upload_dir
            .join(format!("{}_{}", encode(page), encode(name)))
    }
}

/// Uppercase hex of the UTF-8 bytes, the wiki's on-disk name encoding
pub fn encode(name: &str) -> String {
    hex::encode_upper(name.as_bytes())
}
