//! On-disk thumbnail cache
//!
//! Thumbnails are stored as `cache_dir/{key}.png`, where the key fingerprints
//! the source identity and resolution. Attachment entries stay valid while
//! they are strictly newer than the attachment; remote entries stay valid
//! once they exist. There is no locking: concurrent misses for the same key
//! may both render, and the last rename wins.

mod freshness;
mod key;

pub use freshness::{get_mtime, is_entry_fresh, Freshness};
pub use key::CacheKey;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::RenderConfig;
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::rasterizer::{Rasterizer, RenderTarget, RenderedImage};
use crate::source::SourceReference;

/// Marker granting web access to the PNGs in the cache directory
pub const ACCESS_MARKER_NAME: &str = ".htaccess";
pub const ACCESS_MARKER: &str = "<Files ~ \"\\.png$\">\n  Require all granted\n</Files>\n";

/// A thumbnail ready to be referenced from markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageHandle {
    /// PNG on disk under the cache directory
    Cached {
        key: CacheKey,
        path: PathBuf,
        /// Served from an existing entry without rendering
        hit: bool,
    },
    /// Encoded PNG to embed as a data URI
    Inline { png: Vec<u8> },
}

impl ImageHandle {
    /// Value of the `<img src>` attribute
    pub fn src(&self, cache_url: &str) -> String {
        match self {
            ImageHandle::Cached { key, .. } => {
                format!("{}/{}", cache_url.trim_end_matches('/'), key.file_name())
            }
            ImageHandle::Inline { png } => {
                format!("data:image/png;base64,{}", STANDARD.encode(png))
            }
        }
    }
}

/// Resolves sources to cached or freshly rendered thumbnails
pub struct CacheManager {
    config: Arc<RenderConfig>,
    rasterizer: Arc<dyn Rasterizer>,
}

impl CacheManager {
    pub fn new(config: Arc<RenderConfig>, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { config, rasterizer }
    }

    /// Path of the entry for `key`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.config.cache_dir.join(key.file_name())
    }

    /// Cache key of `source` at the configured resolution
    pub fn key_for(&self, source: &SourceReference) -> CacheKey {
        CacheKey::new(&source.identity(), self.config.resolution)
    }

    /// Get a thumbnail for `source`, rendering it if the cache has no valid entry
    ///
    /// `source_mtime` is the attachment's modification time; it is ignored
    /// for remote sources.
    pub async fn resolve(
        &self,
        source: &SourceReference,
        source_mtime: Option<SystemTime>,
    ) -> ThumbnailResult<ImageHandle> {
        if !self.config.cache_enabled {
            return self.render_inline(source).await;
        }

        self.prepare_dir().await?;

        let key = self.key_for(source);
        let path = self.entry_path(&key);

        let rule = if source.is_attachment() {
            Freshness::NewerThan(source_mtime)
        } else {
            Freshness::Exists
        };

        if is_entry_fresh(&path, rule).await {
            tracing::debug!(key = %key, path = %path.display(), "Thumbnail cache hit");
            return Ok(ImageHandle::Cached {
                key,
                path,
                hit: true,
            });
        }

        self.ensure_available()?;

        tracing::info!(
            key = %key,
            path = %path.display(),
            rasterizer = self.rasterizer.name(),
            "Regenerating thumbnail"
        );

        self.rasterizer
            .rasterize(
                &source.raster_source(),
                self.config.resolution,
                RenderTarget::File(path.clone()),
            )
            .await?;

        Ok(ImageHandle::Cached {
            key,
            path,
            hit: false,
        })
    }

    async fn render_inline(&self, source: &SourceReference) -> ThumbnailResult<ImageHandle> {
        self.ensure_available()?;

        let rendered = self
            .rasterizer
            .rasterize(
                &source.raster_source(),
                self.config.resolution,
                RenderTarget::Memory,
            )
            .await?;

        match rendered {
            RenderedImage::Encoded(png) => Ok(ImageHandle::Inline { png }),
            RenderedImage::Written(path) => Ok(ImageHandle::Inline {
                png: tokio::fs::read(&path).await?,
            }),
        }
    }

    /// Whether the backend can convert at all
    pub fn rasterizer_available(&self) -> bool {
        self.rasterizer.is_available()
    }

    fn ensure_available(&self) -> ThumbnailResult<()> {
        if self.rasterizer_available() {
            Ok(())
        } else {
            Err(ThumbnailError::CapabilityMissing)
        }
    }

    /// Create the cache directory and (re)write its access marker
    async fn prepare_dir(&self) -> ThumbnailResult<()> {
        tokio::fs::create_dir_all(&self.config.cache_dir).await?;
        tokio::fs::write(self.config.cache_dir.join(ACCESS_MARKER_NAME), ACCESS_MARKER).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::mock::MockRasterizer;
    use crate::source::Attachment;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn render_config(dir: &Path, cache_enabled: bool) -> Arc<RenderConfig> {
        Arc::new(RenderConfig {
            cache_enabled,
            cache_dir: dir.join("cache"),
            ..RenderConfig::default()
        })
    }

    /// Attachment for the file at `path`, uploaded a few seconds ago
    ///
    /// The file's mtime is moved back so entries written by the test are
    /// strictly newer even on filesystems with coarse timestamps.
    fn uploaded_attachment(path: PathBuf) -> (SourceReference, Option<SystemTime>) {
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(10))
            .unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().ok();
        let source = SourceReference::Attachment(Attachment {
            path,
            page: "Docs".to_string(),
            name: "a.pdf".to_string(),
            modified,
        });
        (source, modified)
    }

    fn attachment_source(dir: &Path) -> (SourceReference, Option<SystemTime>) {
        let path = dir.join("446F6373_612E706466");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        uploaded_attachment(path)
    }

    #[tokio::test]
    async fn test_second_resolve_is_hit() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockRasterizer::new());
        let manager = CacheManager::new(render_config(dir.path(), true), mock.clone());
        let (source, mtime) = attachment_source(dir.path());
        assert_eq!(source.modified(), mtime);

        let first = manager.resolve(&source, source.modified()).await.unwrap();
        let second = manager.resolve(&source, source.modified()).await.unwrap();

        let (ImageHandle::Cached { key: k1, hit: h1, path }, ImageHandle::Cached { key: k2, hit: h2, .. }) =
            (first, second)
        else {
            panic!("expected cached handles");
        };
        assert_eq!(k1, k2);
        assert!(!h1);
        assert!(h2);
        assert!(get_mtime(&path).await > mtime);
        assert_eq!(mock.calls(), 1);
    }

    #[cfg(feature = "mupdf")]
    #[tokio::test]
    async fn test_letter_pdf_through_mupdf() {
        use crate::rasterizer::MupdfRasterizer;
        use crate::test_support::write_letter_pdf;

        let dir = TempDir::new().unwrap();
        let manager = CacheManager::new(
            render_config(dir.path(), true),
            Arc::new(MupdfRasterizer::new()),
        );
        let (source, mtime) = uploaded_attachment(write_letter_pdf(dir.path(), "letter.pdf"));

        let first = manager.resolve(&source, mtime).await.unwrap();
        let ImageHandle::Cached { hit: false, key, path } = first else {
            panic!("expected a fresh render");
        };
        assert!(get_mtime(&path).await > mtime);

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (612, 792));
        assert!(!img.color().has_alpha());
        assert_eq!(img.to_rgb8().get_pixel(5, 5).0, [255, 255, 255]);

        let second = manager.resolve(&source, mtime).await.unwrap();
        assert_eq!(second, ImageHandle::Cached { key, path, hit: true });
    }

    #[tokio::test]
    async fn test_newer_source_regenerates() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockRasterizer::new());
        let manager = CacheManager::new(render_config(dir.path(), true), mock.clone());
        let (source, _) = attachment_source(dir.path());

        let start = SystemTime::now() - Duration::from_secs(1);
        manager
            .resolve(&source, Some(SystemTime::UNIX_EPOCH))
            .await
            .unwrap();

        let future = SystemTime::now() + Duration::from_secs(3600);
        let handle = manager.resolve(&source, Some(future)).await.unwrap();

        let ImageHandle::Cached { hit, path, .. } = handle else {
            panic!("expected cached handle");
        };
        assert!(!hit);
        assert_eq!(mock.calls(), 2);
        assert!(get_mtime(&path).await.unwrap() >= start);
    }

    #[tokio::test]
    async fn test_marker_written() {
        let dir = TempDir::new().unwrap();
        let config = render_config(dir.path(), true);
        let manager = CacheManager::new(config.clone(), Arc::new(MockRasterizer::new()));
        let (source, mtime) = attachment_source(dir.path());

        manager.resolve(&source, mtime).await.unwrap();

        let marker = std::fs::read_to_string(config.cache_dir.join(ACCESS_MARKER_NAME)).unwrap();
        assert_eq!(marker, ACCESS_MARKER);
    }

    #[tokio::test]
    async fn test_remote_existing_entry_is_fresh() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockRasterizer::new());
        let manager = CacheManager::new(render_config(dir.path(), true), mock.clone());
        let source = SourceReference::Remote("https://example.com/doc.pdf".to_string());

        let first = manager.resolve(&source, None).await.unwrap();
        let second = manager.resolve(&source, None).await.unwrap();

        assert!(matches!(first, ImageHandle::Cached { hit: false, .. }));
        assert!(matches!(second, ImageHandle::Cached { hit: true, .. }));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_sources_distinct_entries() {
        let dir = TempDir::new().unwrap();
        let manager = CacheManager::new(
            render_config(dir.path(), true),
            Arc::new(MockRasterizer::new()),
        );
        let a = SourceReference::Remote("https://example.com/a.pdf".to_string());
        let b = SourceReference::Remote("https://example.com/b.pdf".to_string());

        assert_ne!(manager.key_for(&a), manager.key_for(&b));
        assert_eq!(manager.key_for(&a), CacheKey::new("https://example.com/a.pdf", 72));
    }

    #[tokio::test]
    async fn test_inline_when_cache_disabled() {
        let dir = TempDir::new().unwrap();
        let config = render_config(dir.path(), false);
        let mock = Arc::new(MockRasterizer::new());
        let manager = CacheManager::new(config.clone(), mock.clone());
        let (source, mtime) = attachment_source(dir.path());

        let handle = manager.resolve(&source, mtime).await.unwrap();

        let ImageHandle::Inline { ref png } = handle else {
            panic!("expected inline handle");
        };
        assert!(image::load_from_memory(png).is_ok());
        assert!(handle.src("/cache").starts_with("data:image/png;base64,"));
        assert!(!config.cache_dir.exists());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_capability_missing() {
        let dir = TempDir::new().unwrap();
        let (source, mtime) = attachment_source(dir.path());

        for cache_enabled in [true, false] {
            let mock = Arc::new(MockRasterizer::unavailable());
            let manager = CacheManager::new(render_config(dir.path(), cache_enabled), mock.clone());
            let err = manager.resolve(&source, mtime).await.unwrap_err();
            assert!(matches!(err, ThumbnailError::CapabilityMissing));
            assert_eq!(mock.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_conversion_error_propagates() {
        let dir = TempDir::new().unwrap();
        let config = render_config(dir.path(), true);
        let manager = CacheManager::new(config.clone(), Arc::new(MockRasterizer::failing("broken")));
        let (source, mtime) = attachment_source(dir.path());

        let err = manager.resolve(&source, mtime).await.unwrap_err();
        assert!(matches!(err, ThumbnailError::Conversion(ref m) if m == "broken"));
        assert!(!manager.entry_path(&manager.key_for(&source)).exists());
    }

    #[test]
    fn test_cached_src() {
        let key = CacheKey::new("doc", 72);
        let handle = ImageHandle::Cached {
            key: key.clone(),
            path: PathBuf::from("/tmp/x.png"),
            hit: true,
        };
        assert_eq!(handle.src("/cache/pdf_thumbnail/"), format!("/cache/pdf_thumbnail/{}.png", key));
    }
}
