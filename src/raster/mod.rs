//! Page rasterization: decode once, render each page at the current zoom

pub mod cache;
pub mod renderer;
pub mod types;

pub use cache::{SurfaceCache, SurfaceKey};
pub use renderer::{DecodeError, PageRasterizer, decode_base64};
pub use types::{ImageData, PageSurface};

/// Default surface cache capacity; documents are assumed short
pub const DEFAULT_SURFACE_CACHE: usize = 64;
