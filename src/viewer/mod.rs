//! Document viewer: state, overlays, and interaction glued together
//!
//! [`DocumentViewer`] is the engine's facade for the embedding
//! application. It owns every piece of mutable state (viewport, surfaces,
//! segments, annotations, form values) on a single thread; decode and
//! re-raster run synchronously on the call that triggers them.

pub mod controller;
pub mod overlay;
pub mod state;

pub use controller::{
    ControllerEvent, GestureState, InteractionController, MIN_DRAG_SIZE, Tool,
};
pub use overlay::{OverlayKind, SegmentOverlay, build_overlays, overlay_at};
pub use state::{Command, Effect, ViewerState};

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::annotations::{Annotation, AnnotationId, AnnotationStore};
use crate::export::{ExportError, FieldBinding, FormExporter, bind_fields, discover_fields};
use crate::form::{FieldKey, FormValues};
use crate::geometry::Rect;
use crate::raster::{
    DEFAULT_SURFACE_CACHE, DecodeError, PageRasterizer, PageSurface, SurfaceCache, SurfaceKey,
    decode_base64,
};
use crate::segment::Segment;

/// Notification raised to the embedding application
#[derive(Clone, Debug)]
pub enum ViewerEvent {
    /// An overlay was clicked; single selection, last click wins
    SegmentSelected { index: usize, segment: Segment },
    /// The interaction controller committed, requested, or performed an
    /// annotation change
    Annotation(ControllerEvent),
}

/// The rendering and annotation overlay engine for one document at a time
pub struct DocumentViewer {
    state: ViewerState,
    controller: InteractionController,
    store: AnnotationStore,
    values: FormValues,
    segments: Vec<Segment>,
    bindings: Vec<FieldBinding>,
    rasterizer: Option<PageRasterizer>,
    original_bytes: Vec<u8>,
    surfaces: Vec<Arc<PageSurface>>,
    cache: SurfaceCache,
    annotations_dir: Option<PathBuf>,
}

impl Default for DocumentViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentViewer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ViewerState::new(),
            controller: InteractionController::new(),
            store: AnnotationStore::new(),
            values: FormValues::new(),
            segments: Vec::new(),
            bindings: Vec::new(),
            rasterizer: None,
            original_bytes: Vec::new(),
            surfaces: Vec::new(),
            cache: SurfaceCache::new(DEFAULT_SURFACE_CACHE),
            annotations_dir: None,
        }
    }

    /// Construct a viewer with configured defaults applied
    #[must_use]
    pub fn with_settings(settings: &crate::settings::Settings) -> Self {
        let mut viewer = Self::new();
        let _ = viewer
            .state
            .apply(Command::SetScale(settings.default_scale));
        if settings.pii_only {
            let _ = viewer.state.apply(Command::TogglePiiFilter);
        }
        viewer.annotations_dir = settings.annotations_dir.clone();
        viewer
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Decode a document and rasterize every page at the current zoom.
    ///
    /// Annotations and form values reset with the document. On failure the
    /// viewer is left empty and the error is surfaced as a blocking
    /// "failed to load document".
    pub fn load_document(&mut self, bytes: Vec<u8>) -> Result<(), DecodeError> {
        let effects = self.state.apply(Command::BeginLoad);
        self.run_effects(effects)?;
        let generation = self.state.generation;

        match PageRasterizer::from_bytes(&bytes) {
            Ok(rasterizer) => {
                let page_count = rasterizer.page_count();
                info!("document loaded: {page_count} pages");
                self.rasterizer = Some(rasterizer);
                self.original_bytes = bytes;
                self.store = AnnotationStore::new();
                self.values.clear();
                self.controller.cancel();

                let effects = self.state.apply(Command::LoadCompleted {
                    generation,
                    page_count,
                });
                self.run_effects(effects)?;
                self.refresh_bindings();
                Ok(())
            }
            Err(err) => {
                let effects = self.state.apply(Command::LoadFailed { generation });
                let _ = self.run_effects(effects);
                self.rasterizer = None;
                self.original_bytes.clear();
                self.surfaces.clear();
                Err(err)
            }
        }
    }

    /// Load from a base64 payload, decoded once
    pub fn load_base64(&mut self, payload: &str) -> Result<(), DecodeError> {
        let bytes = decode_base64(payload)?;
        self.load_document(bytes)
    }

    /// Replace the segment list supplied by the analysis service.
    ///
    /// Out-of-contract segments are reported and kept; rendering skips
    /// what it cannot place rather than failing.
    pub fn set_segments(&mut self, segments: Vec<Segment>) -> Result<(), DecodeError> {
        for segment in &segments {
            if !segment.in_page_bounds() {
                warn!(
                    "segment on page {} exceeds its measured page bounds",
                    segment.page_number
                );
            }
        }
        self.segments = segments;
        let effects = self.state.apply(Command::SetSegments);
        self.run_effects(effects)?;
        self.refresh_bindings();
        Ok(())
    }

    /// Field-name bindings are fixed once per (document, segments) pair.
    fn refresh_bindings(&mut self) {
        self.bindings.clear();
        if self.original_bytes.is_empty() || self.segments.is_empty() {
            return;
        }
        match lopdf::Document::load_mem(&self.original_bytes) {
            Ok(doc) => {
                let fields = discover_fields(&doc);
                self.bindings = bind_fields(&fields, &self.segments);
                debug!(
                    "{} structured field(s), {} bound to segments",
                    fields.len(),
                    self.bindings.len()
                );
            }
            Err(err) => {
                // The raster engine accepted the bytes; field discovery is
                // best-effort on top.
                warn!("field discovery failed: {err}");
            }
        }
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    pub fn set_scale(&mut self, scale: f32) -> Result<(), DecodeError> {
        let effects = self.state.apply(Command::SetScale(scale));
        self.run_effects(effects)
    }

    pub fn zoom_in(&mut self) -> Result<(), DecodeError> {
        let effects = self.state.apply(Command::ZoomIn);
        self.run_effects(effects)
    }

    pub fn zoom_out(&mut self) -> Result<(), DecodeError> {
        let effects = self.state.apply(Command::ZoomOut);
        self.run_effects(effects)
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    /// Zoom level for display, as a percentage
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        self.state.zoom_percent()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.state.page_count
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.rasterizer.as_ref().and_then(PageRasterizer::title)
    }

    /// Rendered page surfaces, index-aligned with page numbers
    #[must_use]
    pub fn surfaces(&self) -> &[Arc<PageSurface>] {
        &self.surfaces
    }

    pub fn toggle_pii_filter(&mut self) {
        let _ = self.state.apply(Command::TogglePiiFilter);
    }

    #[must_use]
    pub fn pii_only(&self) -> bool {
        self.state.pii_only
    }

    fn run_effects(&mut self, effects: Vec<Effect>) -> Result<(), DecodeError> {
        for effect in effects {
            match effect {
                Effect::InvalidateSurfaces => {
                    self.cache.invalidate_all();
                    self.surfaces.clear();
                }
                Effect::RasterizeAll => self.rasterize_all()?,
                Effect::EmitSelection(_) => {
                    // Selection events are returned to the caller by the
                    // entry point that produced them.
                }
            }
        }
        Ok(())
    }

    fn rasterize_all(&mut self) -> Result<(), DecodeError> {
        let Some(rasterizer) = &self.rasterizer else {
            return Ok(());
        };
        let scale = self.state.scale;

        let mut surfaces = Vec::with_capacity(rasterizer.page_count());
        for page in 0..rasterizer.page_count() {
            let key = SurfaceKey::new(page, scale);
            if let Some(hit) = self.cache.get(&key) {
                surfaces.push(hit);
                continue;
            }
            let surface = rasterizer.rasterize_page(page, scale)?;
            surfaces.push(self.cache.insert(key, surface));
        }

        debug!("rasterized {} page(s) at {:.2}x", surfaces.len(), scale);
        self.surfaces = surfaces;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Overlays and selection
    // ------------------------------------------------------------------

    /// Build the overlay list for the current render pass.
    ///
    /// Derived fresh from state every call, keyed by segment index;
    /// nothing is patched in place between passes.
    #[must_use]
    pub fn overlays(&self) -> Vec<SegmentOverlay> {
        build_overlays(
            &self.segments,
            &self.surfaces,
            &self.values,
            self.state.pii_only,
            self.state.selected,
        )
    }

    /// Select a segment by index, replacing any previous selection
    pub fn select_segment(&mut self, index: usize) -> Option<ViewerEvent> {
        let segment = self.segments.get(index)?.clone();
        let effects = self.state.apply(Command::SelectSegment(index));
        for effect in effects {
            if let Effect::EmitSelection(index) = effect {
                return Some(ViewerEvent::SegmentSelected { index, segment });
            }
        }
        None
    }

    #[must_use]
    pub fn selected_segment(&self) -> Option<(usize, &Segment)> {
        let index = self.state.selected?;
        Some((index, self.segments.get(index)?))
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    // ------------------------------------------------------------------
    // Form values
    // ------------------------------------------------------------------

    pub fn set_field_value(&mut self, key: FieldKey, value: impl Into<String>) {
        self.values.set(key, value);
    }

    pub fn toggle_checkbox(&mut self, key: FieldKey) {
        self.values.toggle(key);
    }

    #[must_use]
    pub fn form_values(&self) -> &FormValues {
        &self.values
    }

    // ------------------------------------------------------------------
    // Pointer and tools
    // ------------------------------------------------------------------

    pub fn toggle_tool(&mut self, tool: Tool) {
        self.controller.toggle_tool(tool);
    }

    #[must_use]
    pub fn armed_tool(&self) -> Option<Tool> {
        self.controller.armed_tool()
    }

    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.controller.state()
    }

    /// The uncommitted highlight preview, while a drag is in progress
    #[must_use]
    pub fn drag_preview(&self) -> Option<Rect> {
        self.controller.preview()
    }

    /// Pointer pressed at viewport coordinates on a page.
    ///
    /// Editable overlays intercept the press so toggling and typing never
    /// reach the annotation tools; region overlays select their segment;
    /// everything else goes to the gesture machine.
    pub fn pointer_down(&mut self, page: usize, x: f32, y: f32) -> Option<ViewerEvent> {
        let overlays = self.overlays();
        if let Some(overlay) = overlay_at(&overlays, page, x, y) {
            if overlay.intercepts_pointer() {
                if let OverlayKind::Checkbox { key, .. } = &overlay.kind {
                    self.values.toggle(*key);
                }
                return None;
            }
            if self.controller.armed_tool().is_none() {
                let index = overlay.segment_index;
                return self.select_segment(index);
            }
        }

        self.controller
            .pointer_down(page, x, y, &mut self.store)
            .map(ViewerEvent::Annotation)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.controller.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) -> Option<ViewerEvent> {
        self.controller
            .pointer_up(&mut self.store)
            .map(ViewerEvent::Annotation)
    }

    /// Escape: discard any in-flight gesture
    pub fn cancel_gesture(&mut self) {
        self.controller.cancel();
    }

    // ------------------------------------------------------------------
    // Annotations
    // ------------------------------------------------------------------

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        self.store.all()
    }

    #[must_use]
    pub fn annotation_store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn annotation_store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    /// Delete a highlight after the user confirmed the prompt
    pub fn confirm_delete(&mut self, id: AnnotationId) -> Option<ViewerEvent> {
        self.controller
            .confirm_delete(id, &mut self.store)
            .map(ViewerEvent::Annotation)
    }

    /// Delete a note through its delete affordance; no confirmation
    pub fn delete_note(&mut self, id: AnnotationId) -> Option<ViewerEvent> {
        self.controller
            .delete_note(id, &mut self.store)
            .map(ViewerEvent::Annotation)
    }

    /// Commit a note's text on blur/change
    pub fn set_annotation_text(&mut self, id: AnnotationId, text: impl Into<String>) -> bool {
        self.store.set_text(id, text)
    }

    /// Swap the in-memory store for one backed by the sidecar file of the
    /// named document, loading whatever was persisted for it.
    pub fn attach_annotations(&mut self, doc_name: &str) -> anyhow::Result<()> {
        self.store = AnnotationStore::for_document(doc_name, self.annotations_dir.as_deref())?;
        Ok(())
    }

    /// Persist the annotation list to its sidecar, if one is attached
    pub fn save_annotations(&self) -> anyhow::Result<()> {
        self.store.save_to_disk()
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Field-name bindings computed at load time
    #[must_use]
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// Serialize the original document with the current form values
    /// written into it. Never mutates the loaded bytes.
    pub fn export_filled(&self) -> Result<Vec<u8>, ExportError> {
        FormExporter::export(&self.original_bytes, &self.values, &self.segments)
    }

    /// Serialize the form values alone as a flat JSON record
    pub fn export_values(&self) -> Result<String, ExportError> {
        FormExporter::export_values(&self.values, &self.segments)
    }
}
