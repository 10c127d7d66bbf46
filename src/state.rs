//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::plugin::ThumbnailPlugin;
use crate::rasterizer::Rasterizer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Arc<Config>,
    plugin: ThumbnailPlugin,
}

impl AppState {
    /// Create the application state around a rasterization backend
    pub fn new(config: Config, rasterizer: Arc<dyn Rasterizer>) -> Self {
        if !rasterizer.is_available() {
            tracing::warn!(
                rasterizer = rasterizer.name(),
                "No PDF rasterizer available, thumbnails will report an error"
            );
        }

        let config = Arc::new(config);
        let plugin = ThumbnailPlugin::new(config.clone(), rasterizer);

        Self {
            inner: Arc::new(AppStateInner { config, plugin }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the thumbnail plugin
    pub fn plugin(&self) -> &ThumbnailPlugin {
        &self.inner.plugin
    }
}
