//! MuPDF rasterizer
//!
//! Renders page 0 with MuPDF. Local documents are opened by path, remote ones
//! are downloaded first and opened from memory. MuPDF work is CPU-bound and
//! runs on the blocking pool.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use mupdf::{Colorspace, Document, Matrix};

use crate::error::{ThumbnailError, ThumbnailResult};

use super::{
    deliver, dpi_scale, encode_png, flatten_onto_white, RasterSource, Rasterizer, RenderTarget,
    RenderedImage,
};

const PDF_MIME: &str = "application/pdf";

/// Largest remote document that will be downloaded (64 MiB)
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

impl From<mupdf::Error> for ThumbnailError {
    fn from(err: mupdf::Error) -> Self {
        ThumbnailError::Conversion(err.to_string())
    }
}

/// Where MuPDF reads the document from
enum DocumentInput {
    Path(PathBuf),
    Bytes(Arc<Vec<u8>>),
}

impl DocumentInput {
    fn open(&self) -> ThumbnailResult<Document> {
        match self {
            DocumentInput::Path(path) => {
                let path_str = path.to_string_lossy();
                Document::open(&*path_str).map_err(Into::into)
            }
            DocumentInput::Bytes(data) => Document::from_bytes(data, PDF_MIME).map_err(Into::into),
        }
    }
}

/// MuPDF-backed rasterizer
pub struct MupdfRasterizer {
    http: reqwest::Client,
    max_download_bytes: u64,
}

impl MupdfRasterizer {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }

    /// Limit the size of remote documents
    pub fn with_max_download_bytes(mut self, max: u64) -> Self {
        self.max_download_bytes = max;
        self
    }

    fn too_large(&self, url: &str) -> ThumbnailError {
        ThumbnailError::Conversion(format!(
            "Failed to fetch {}: document exceeds {} bytes",
            url, self.max_download_bytes
        ))
    }

    async fn fetch(&self, url: &str) -> ThumbnailResult<Vec<u8>> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ThumbnailError::Conversion(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ThumbnailError::Conversion(format!(
                "Failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_download_bytes)
        {
            return Err(self.too_large(url));
        }

        // Content-Length may be absent or wrong, so the body is capped as it streams
        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ThumbnailError::Conversion(format!("Failed to read {}: {}", url, e)))?
        {
            if (data.len() + chunk.len()) as u64 > self.max_download_bytes {
                return Err(self.too_large(url));
            }
            data.extend_from_slice(&chunk);
        }

        Ok(data)
    }
}

impl Default for MupdfRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Rasterizer for MupdfRasterizer {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn rasterize(
        &self,
        source: &RasterSource,
        resolution: u32,
        target: RenderTarget,
    ) -> ThumbnailResult<RenderedImage> {
        let input = match source {
            RasterSource::Local(path) => DocumentInput::Path(path.clone()),
            RasterSource::Remote(url) => DocumentInput::Bytes(Arc::new(self.fetch(url).await?)),
        };

        let png = tokio::task::spawn_blocking(move || render_first_page(&input, resolution))
            .await
            .map_err(|e| ThumbnailError::Conversion(format!("Task join error: {}", e)))??;

        deliver(png, target).await
    }
}

fn render_first_page(input: &DocumentInput, resolution: u32) -> ThumbnailResult<Vec<u8>> {
    let doc = input.open()?;
    if doc.page_count()? < 1 {
        return Err(ThumbnailError::Conversion(
            "Document has no pages".to_string(),
        ));
    }

    let page = doc.load_page(0)?;

    let scale = dpi_scale(resolution);
    let matrix = Matrix::new_scale(scale, scale);

    // No alpha: MuPDF clears the pixmap to white before drawing
    let colorspace = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;

    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = pixmap.n() as usize;

    let img = flatten_onto_white(pixmap.samples(), width, height, n)?;
    encode_png(img)
}
