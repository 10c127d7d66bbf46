//! `#pdf_thumbnail(...)` plugin entry
//!
//! Takes the raw plugin arguments and the page being rendered, and produces
//! either the thumbnail fragment or an escaped error message. Errors never
//! leave [`ThumbnailPlugin::convert`]; the host page always renders.

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::error::{ThumbnailError, ThumbnailResult};
use crate::markup::Thumbnail;
use crate::rasterizer::Rasterizer;
use crate::source::SourceResolver;

/// End-to-end thumbnail conversion
pub struct ThumbnailPlugin {
    config: Arc<Config>,
    sources: SourceResolver,
    cache: CacheManager,
}

impl ThumbnailPlugin {
    pub fn new(config: Arc<Config>, rasterizer: Arc<dyn Rasterizer>) -> Self {
        let render = Arc::new(config.render.clone());
        Self {
            sources: SourceResolver::new(&config),
            cache: CacheManager::new(render, rasterizer),
            config,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn rasterizer_available(&self) -> bool {
        self.cache.rasterizer_available()
    }

    /// Build the thumbnail for exactly one argument
    pub async fn render(&self, args: &[&str], current_page: &str) -> ThumbnailResult<Thumbnail> {
        let [reference] = args else {
            return Err(ThumbnailError::Usage);
        };

        let source = self.sources.resolve(reference, current_page)?;
        let handle = self.cache.resolve(&source, source.modified()).await?;

        Ok(Thumbnail {
            link: source.anchor_link(&self.config.wiki.base_uri),
            target: self.config.render.anchor_target.clone(),
            src: handle.src(&self.config.render.cache_url),
            style: self.config.render.style.clone(),
        })
    }

    /// HTML for the plugin call: the fragment, or the escaped error message
    pub async fn convert(&self, args: &[&str], current_page: &str) -> String {
        match self.render(args, current_page).await {
            Ok(thumbnail) => thumbnail.to_html(),
            Err(e) => {
                tracing::warn!(page = %current_page, args = ?args, "pdf_thumbnail failed: {}", e);
                e.to_html()
            }
        }
    }
}
