//! Document page rendering and annotation overlay engine.
//!
//! Rasterizes document pages at a user zoom factor, keeps externally
//! supplied content segments pixel-aligned across zoom changes, drives
//! highlight/note annotation tools through a gesture state machine, and
//! serializes user-entered form values back into the document.

pub mod annotations;
pub mod export;
pub mod form;
pub mod geometry;
pub mod raster;
pub mod segment;
pub mod settings;
pub mod viewer;

pub use annotations::{Annotation, AnnotationId, AnnotationKind, AnnotationStore, NoteStyle};
pub use export::{ExportError, FormExporter};
pub use form::{FieldKey, FormValues};
pub use geometry::{PageSize, Rect};
pub use raster::{DecodeError, PageRasterizer, PageSurface};
pub use segment::{Segment, SegmentKind};
pub use viewer::{DocumentViewer, Tool, ViewerEvent};
