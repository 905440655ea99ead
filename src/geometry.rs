//! Native/viewport coordinate mapping
//!
//! Segments arrive positioned against a page's intrinsic dimensions; the
//! viewer renders pages scaled by the current zoom factor. The mapping
//! between the two spaces scales each axis independently so callers may
//! rescale non-uniformly, though normal operation keeps both factors equal.

use serde::{Deserialize, Serialize};

/// Intrinsic or rendered dimensions of a page
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size after uniform scaling by `factor`
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Axis-aligned rectangle, top-left origin
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corner points, in any drag direction
    #[must_use]
    pub fn from_corners(ax: f32, ay: f32, bx: f32, by: f32) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            width: (bx - ax).abs(),
            height: (by - ay).abs(),
        }
    }

    /// Map a native-space rectangle into viewport pixels.
    ///
    /// Each axis uses its own factor: `viewport.width / native.width` and
    /// `viewport.height / native.height`. No rotation or skew.
    #[must_use]
    pub fn to_viewport(self, native: PageSize, viewport: PageSize) -> Self {
        let sx = viewport.width / native.width;
        let sy = viewport.height / native.height;
        Self {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    /// Inverse of [`Rect::to_viewport`]
    #[must_use]
    pub fn to_native(self, native: PageSize, viewport: PageSize) -> Self {
        let sx = native.width / viewport.width;
        let sy = native.height / viewport.height;
        Self {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    /// True if the point lies inside the rectangle (inclusive edges)
    #[must_use]
    pub fn contains(self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}
