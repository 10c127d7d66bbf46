//! First-page rasterization
//!
//! A [`Rasterizer`] turns page 0 of a document into an opaque PNG at a given
//! DPI. The MuPDF backend is compiled in with the `mupdf` feature; without it
//! the [`UnavailableRasterizer`] reports the capability as missing so callers
//! can say so instead of failing.
//!
//! # Output modes
//!
//! - [`RenderTarget::Memory`]: encoded PNG bytes, for inline `data:` URIs
//! - [`RenderTarget::File`]: PNG written to a path, for the on-disk cache

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "mupdf")]
mod mupdf_renderer;
mod unavailable;

#[cfg(feature = "mupdf")]
pub use mupdf_renderer::MupdfRasterizer;
pub use unavailable::UnavailableRasterizer;

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, RgbImage};

use crate::error::{ThumbnailError, ThumbnailResult};

/// PDF points per inch
pub const POINTS_PER_INCH: f32 = 72.0;

/// Document to rasterize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterSource {
    /// Local file path
    Local(PathBuf),
    /// URL fetched over HTTP
    Remote(String),
}

/// Where the encoded PNG goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderTarget {
    Memory,
    File(PathBuf),
}

/// Output of a rasterization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedImage {
    /// Encoded PNG bytes
    Encoded(Vec<u8>),
    /// PNG written to this path
    Written(PathBuf),
}

/// Rasterization backend
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Whether conversions can run at all
    fn is_available(&self) -> bool;

    /// Render the first page of `source` at `resolution` DPI into `target`
    async fn rasterize(
        &self,
        source: &RasterSource,
        resolution: u32,
        target: RenderTarget,
    ) -> ThumbnailResult<RenderedImage>;
}

/// The best backend compiled into this build
pub fn default_rasterizer() -> Arc<dyn Rasterizer> {
    #[cfg(feature = "mupdf")]
    {
        Arc::new(MupdfRasterizer::new())
    }

    #[cfg(not(feature = "mupdf"))]
    {
        Arc::new(UnavailableRasterizer)
    }
}

/// Scale factor from PDF points to pixels at `resolution` DPI
pub fn dpi_scale(resolution: u32) -> f32 {
    resolution as f32 / POINTS_PER_INCH
}

/// Composite raw samples onto white, dropping any alpha channel
///
/// `n` is the number of components per pixel: 1 (gray), 2 (gray + alpha),
/// 3 (RGB) or 4 (RGBA). Samples are expected to be non-premultiplied.
pub fn flatten_onto_white(
    samples: &[u8],
    width: u32,
    height: u32,
    n: usize,
) -> ThumbnailResult<RgbImage> {
    if !(1..=4).contains(&n) {
        return Err(ThumbnailError::Conversion(format!(
            "Unsupported pixel layout: {} components",
            n
        )));
    }

    let pixels = width as usize * height as usize;
    if samples.len() < pixels * n {
        return Err(ThumbnailError::Conversion(format!(
            "Pixel buffer too short: {} bytes for {}x{}x{}",
            samples.len(),
            width,
            height,
            n
        )));
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for px in samples.chunks_exact(n).take(pixels) {
        let (color, alpha) = match n {
            1 => ([px[0]; 3], 255),
            2 => ([px[0]; 3], px[1]),
            3 => ([px[0], px[1], px[2]], 255),
            _ => ([px[0], px[1], px[2]], px[3]),
        };
        rgb.extend(color.iter().map(|&c| over_white(c, alpha)));
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ThumbnailError::Conversion("Failed to create image buffer".to_string()))
}

fn over_white(c: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Encode an opaque image as PNG
pub fn encode_png(img: RgbImage) -> ThumbnailResult<Vec<u8>> {
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| ThumbnailError::Conversion(e.to_string()))?;
    Ok(output)
}

/// Hand encoded PNG bytes to `target`
///
/// File targets are written to a sibling temporary file and renamed into
/// place, so readers never see a partially written PNG.
pub async fn deliver(png: Vec<u8>, target: RenderTarget) -> ThumbnailResult<RenderedImage> {
    match target {
        RenderTarget::Memory => Ok(RenderedImage::Encoded(png)),
        RenderTarget::File(path) => {
            write_atomic(&path, &png).await.map_err(|e| {
                ThumbnailError::Conversion(format!("Failed to write {}: {}", path.display(), e))
            })?;
            Ok(RenderedImage::Written(path))
        }
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let result = match tokio::fs::write(&tmp, data).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}
