//! Rasterized page surfaces

use crate::geometry::PageSize;

/// Raw rendered page image.
///
/// Tightly packed RGB pixel data (3 bytes per pixel), row-major.
#[derive(Clone)]
pub struct ImageData {
    pub pixels: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageData {
    /// Adapt the surface to an [`image::RgbImage`] for callers that want
    /// to encode or post-process it.
    #[must_use]
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width_px, self.height_px, self.pixels.clone())
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// One fully rendered page at a given zoom factor
#[derive(Clone, Debug)]
pub struct PageSurface {
    pub image: ImageData,
    /// 0-based page index
    pub page: usize,
    /// Intrinsic page dimensions, required by the coordinate mapper
    pub native: PageSize,
    /// Zoom factor the surface was rendered at
    pub scale: f32,
}

impl PageSurface {
    /// Rendered dimensions in viewport pixels.
    ///
    /// Uses the actual surface size rather than `native * scale` so
    /// overlays align with the rounded pixel grid.
    #[must_use]
    pub fn viewport_size(&self) -> PageSize {
        PageSize::new(self.image.width_px as f32, self.image.height_px as f32)
    }
}
