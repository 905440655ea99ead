//! Viewport state management
//!
//! A small command/effect reducer: commands mutate the state, effects tell
//! the owning [`DocumentViewer`](super::DocumentViewer) what expensive work
//! to run (re-rasterizing, emitting selection events). Loads are gated by a
//! single `loading` flag; a newer load supersedes an older one via the
//! generation counter, and the stale result is discarded, not cancelled.

use log::debug;

/// Minimum allowed zoom factor
pub const MIN_SCALE: f32 = 0.5;
/// Maximum allowed zoom factor
pub const MAX_SCALE: f32 = 3.0;
/// Zoom factor a fresh document opens at
pub const DEFAULT_SCALE: f32 = 1.5;

/// Zoom in rate multiplier per step - 10%
pub const ZOOM_IN_RATE: f32 = 1.1;
/// Zoom out rate divisor per step - 5%
pub const ZOOM_OUT_RATE: f32 = 1.05;

/// Current viewport state for a loaded document
#[derive(Clone, Debug)]
pub struct ViewerState {
    /// User-specified zoom factor, clamped to `[MIN_SCALE, MAX_SCALE]`
    pub scale: f32,

    /// Total page count of the decoded document
    pub page_count: usize,

    /// A decode/re-raster is in flight
    pub loading: bool,

    /// Monotonic load generation; stale completions are discarded
    pub generation: u64,

    /// Single-selection segment index, last click wins
    pub selected: Option<usize>,

    /// Show only PII segments in the overlay pass
    pub pii_only: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            page_count: 0,
            loading: false,
            generation: 0,
            selected: None,
            pii_only: false,
        }
    }
}

impl ViewerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zoom level for display, as a percentage
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// Clamp a zoom factor to the valid range, handling NaN/Inf
    #[must_use]
    pub fn clamp_scale(scale: f32) -> f32 {
        if !scale.is_finite() {
            DEFAULT_SCALE
        } else {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::BeginLoad => {
                self.generation += 1;
                self.loading = true;
                self.selected = None;
                self.page_count = 0;
                debug!("load generation {}", self.generation);
                vec![Effect::InvalidateSurfaces]
            }

            Command::LoadCompleted {
                generation,
                page_count,
            } => {
                if generation != self.generation {
                    // Superseded by a newer load; let the result drop.
                    return vec![];
                }
                self.loading = false;
                self.page_count = page_count;
                vec![Effect::RasterizeAll]
            }

            Command::LoadFailed { generation } => {
                if generation != self.generation {
                    return vec![];
                }
                self.loading = false;
                self.page_count = 0;
                vec![]
            }

            Command::SetScale(scale) => {
                let clamped = Self::clamp_scale(scale);
                if (self.scale - clamped).abs() > f32::EPSILON {
                    self.scale = clamped;
                    vec![Effect::InvalidateSurfaces, Effect::RasterizeAll]
                } else {
                    vec![]
                }
            }

            Command::ZoomIn => self.apply(Command::SetScale(self.scale * ZOOM_IN_RATE)),

            Command::ZoomOut => self.apply(Command::SetScale(self.scale / ZOOM_OUT_RATE)),

            Command::SetSegments => {
                // New segment list: indexes into the old one are stale.
                self.selected = None;
                vec![Effect::InvalidateSurfaces, Effect::RasterizeAll]
            }

            Command::TogglePiiFilter => {
                self.pii_only = !self.pii_only;
                vec![]
            }

            Command::SelectSegment(index) => {
                self.selected = Some(index);
                vec![Effect::EmitSelection(index)]
            }

            Command::ClearSelection => {
                self.selected = None;
                vec![]
            }
        }
    }
}

/// Commands that modify viewport state
#[derive(Clone, Copy, Debug)]
pub enum Command {
    /// A new document is arriving
    BeginLoad,
    /// Decode finished for the given generation
    LoadCompleted { generation: u64, page_count: usize },
    /// Decode failed for the given generation
    LoadFailed { generation: u64 },
    /// Set the zoom factor
    SetScale(f32),
    /// Step the zoom in
    ZoomIn,
    /// Step the zoom out
    ZoomOut,
    /// The segment list was replaced
    SetSegments,
    /// Flip the PII-only overlay filter
    TogglePiiFilter,
    /// Select a segment, last click wins
    SelectSegment(usize),
    /// Drop the selection
    ClearSelection,
}

/// Effects produced by state changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Drop every cached surface
    InvalidateSurfaces,
    /// Re-rasterize the whole document at the current scale
    RasterizeAll,
    /// Notify the embedding application of a selection
    EmitSelection(usize),
}
