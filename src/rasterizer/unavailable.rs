//! Fallback used when no rasterization backend is compiled in

use async_trait::async_trait;

use crate::error::{ThumbnailError, ThumbnailResult};

use super::{RasterSource, Rasterizer, RenderTarget, RenderedImage};

/// Rasterizer that can never convert anything
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRasterizer;

#[async_trait]
impl Rasterizer for UnavailableRasterizer {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn rasterize(
        &self,
        _source: &RasterSource,
        _resolution: u32,
        _target: RenderTarget,
    ) -> ThumbnailResult<RenderedImage> {
        Err(ThumbnailError::CapabilityMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_capability_missing() {
        let rasterizer = UnavailableRasterizer;
        assert!(!rasterizer.is_available());

        let err = rasterizer
            .rasterize(&RasterSource::Remote("http://x/a.pdf".into()), 72, RenderTarget::Memory)
            .await
            .unwrap_err();
        assert!(matches!(err, ThumbnailError::CapabilityMissing));
    }
}
