//! Counting rasterizer for tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use crate::error::{ThumbnailError, ThumbnailResult};

use super::{deliver, encode_png, RasterSource, Rasterizer, RenderTarget, RenderedImage};

/// Produces a small white PNG and records how often it ran
pub struct MockRasterizer {
    pub available: bool,
    /// Conversion error message to fail with, if any
    pub fail_with: Option<String>,
    calls: AtomicUsize,
}

impl MockRasterizer {
    pub fn new() -> Self {
        Self {
            available: true,
            fail_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rasterizer for MockRasterizer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn rasterize(
        &self,
        _source: &RasterSource,
        resolution: u32,
        target: RenderTarget,
    ) -> ThumbnailResult<RenderedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.fail_with {
            return Err(ThumbnailError::Conversion(message.clone()));
        }

        let side = resolution.max(1) / 8 + 1;
        let png = encode_png(RgbImage::from_pixel(side, side, Rgb([255, 255, 255])))?;
        deliver(png, target).await
    }
}
