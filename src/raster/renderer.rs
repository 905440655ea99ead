//! Page decoding and rasterization
//!
//! Wraps the document engine: decode a byte stream once, then produce a
//! fixed-resolution RGB surface per page at the requested zoom factor.
//! Everything here runs synchronously on the caller's thread.

use base64::Engine as _;
use log::debug;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::types::{ImageData, PageSurface};
use crate::geometry::PageSize;

/// Failure to decode or rasterize a document.
///
/// Callers surface this as a blocking "failed to load document"; no
/// partial render is attempted.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("document engine: {0}")]
    Engine(#[from] mupdf::error::Error),

    #[error("invalid base64 payload: {0}")]
    Payload(#[from] base64::DecodeError),

    #[error("document has no pages")]
    EmptyDocument,

    #[error("{detail}")]
    Surface { detail: String },
}

impl DecodeError {
    fn surface(msg: impl Into<String>) -> Self {
        Self::Surface { detail: msg.into() }
    }
}

/// Decoded document handle plus per-page rasterization
pub struct PageRasterizer {
    doc: Document,
    page_count: usize,
    title: Option<String>,
}

impl PageRasterizer {
    /// Decode a document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let doc = Document::from_bytes(bytes, "application/pdf")?;
        let page_count = doc.page_count()? as usize;
        if page_count == 0 {
            return Err(DecodeError::EmptyDocument);
        }

        let title = doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty());

        debug!("decoded document: {page_count} pages, title={title:?}");

        Ok(Self {
            doc,
            page_count,
            title,
        })
    }

    /// Decode a base64 document payload (decoded once, at load)
    pub fn from_base64(payload: &str) -> Result<Self, DecodeError> {
        let bytes = decode_base64(payload)?;
        Self::from_bytes(&bytes)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Intrinsic dimensions of a page, in native units
    pub fn native_size(&self, page: usize) -> Result<PageSize, DecodeError> {
        let page = self.doc.load_page(page as i32)?;
        let bounds = page.bounds()?;
        Ok(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    /// Rasterize one page at the given zoom factor.
    ///
    /// The surface is sized `native * scale`; the native size travels with
    /// it so the coordinate mapper can position overlays.
    pub fn rasterize_page(&self, page_index: usize, scale: f32) -> Result<PageSurface, DecodeError> {
        let page = self.doc.load_page(page_index as i32)?;
        let bounds = page.bounds()?;
        let native = PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0);

        let transform = Matrix::new_scale(scale, scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&transform, &rgb, false, false)?;

        let pixels = pixmap_to_rgb(&pixmap)?;

        Ok(PageSurface {
            image: ImageData {
                pixels,
                width_px: pixmap.width(),
                height_px: pixmap.height(),
            },
            page: page_index,
            native,
            scale,
        })
    }

    /// Rasterize every page in order at the given zoom factor.
    ///
    /// Re-run in full whenever the zoom changes; documents are assumed
    /// short (tens of pages), so there is no incremental path.
    pub fn rasterize_all(&self, scale: f32) -> Result<Vec<PageSurface>, DecodeError> {
        (0..self.page_count)
            .map(|page| self.rasterize_page(page, scale))
            .collect()
    }
}

/// Decode a base64 document payload into raw bytes
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
}

/// Extract tightly-packed RGB from a pixmap, dropping padding and any
/// alpha channel.
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, DecodeError> {
    let n = pixmap.n() as usize;
    if n != 3 && n != 4 {
        return Err(DecodeError::surface(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();

    if samples.len() < stride * height {
        return Err(DecodeError::surface("Pixmap buffer size mismatch"));
    }

    let mut pixels = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        let row_start = row * stride;
        for col in 0..width {
            let px = row_start + col * n;
            pixels.extend_from_slice(&samples[px..px + 3]);
        }
    }

    Ok(pixels)
}
