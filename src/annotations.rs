//! User-created annotations
//!
//! Highlights and notes live in viewport space, bound to the zoom level at
//! creation time; they are deliberately NOT renormalized when the zoom
//! changes ("on the glass", not "in the document"). Segments, by contrast,
//! rescale with every render pass.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::geometry::Rect;

/// Unique, generation-ordered annotation identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

/// Visual form of a note annotation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStyle {
    Sticky,
    TextBox,
}

/// Kind of annotation a gesture or tool-click produced
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationKind {
    Highlight,
    Note { style: NoteStyle },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(flatten)]
    pub kind: AnnotationKind,
    /// 0-based page index
    pub page: usize,
    /// Viewport-space rectangle at creation-time zoom
    pub rect: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    #[must_use]
    pub fn is_note(&self) -> bool {
        matches!(self.kind, AnnotationKind::Note { .. })
    }
}

/// Ordered collection of annotations for one loaded document.
///
/// Ids are handed out in creation order and never reused within a store.
/// An optional YAML sidecar file persists the collection for callers that
/// keep annotations alongside the document.
#[derive(Debug)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    next_id: u64,
    file_path: Option<PathBuf>,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            annotations: Vec::new(),
            next_id: 1,
            file_path: None,
        }
    }

    /// Open the store for a named document, loading its sidecar if one
    /// exists. The sidecar lives under `PAGEMARK_ANNOTATIONS_DIR` or
    /// `.pagemark_annotations` in the working directory, named by a hash
    /// of the document name.
    pub fn for_document(doc_name: &str, annotations_dir: Option<&Path>) -> Result<Self> {
        let resolved_dir = match annotations_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::default_dir()?,
        };
        if !resolved_dir.exists() {
            fs::create_dir_all(&resolved_dir)
                .context("Failed to create annotations directory")?;
        }

        let digest = md5::compute(doc_name.as_bytes());
        let file_path = resolved_dir.join(format!("doc_{digest:x}.yaml"));

        let annotations: Vec<Annotation> = if file_path.exists() {
            let content =
                fs::read_to_string(&file_path).context("Failed to read annotations file")?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_yaml::from_str(&content).context("Failed to parse annotations YAML")?
            }
        } else {
            Vec::new()
        };

        let next_id = annotations.iter().map(|a| a.id.0).max().unwrap_or(0) + 1;

        Ok(Self {
            annotations,
            next_id,
            file_path: Some(file_path),
        })
    }

    fn default_dir() -> Result<PathBuf> {
        if let Ok(custom_dir) = std::env::var("PAGEMARK_ANNOTATIONS_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }
        Ok(std::env::current_dir()
            .context("Could not determine current directory")?
            .join(".pagemark_annotations"))
    }

    /// Persist the collection to the sidecar file, if the store has one
    pub fn save_to_disk(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let yaml =
            serde_yaml::to_string(&self.annotations).context("Failed to serialize annotations")?;
        fs::write(path, yaml).context("Failed to write annotations file")
    }

    fn create(
        &mut self,
        kind: AnnotationKind,
        page: usize,
        rect: Rect,
        color: Option<String>,
        text: Option<String>,
    ) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        self.annotations.push(Annotation {
            id,
            kind,
            page,
            rect,
            color,
            text,
            created_at: Utc::now(),
        });
        id
    }

    pub fn create_highlight(
        &mut self,
        page: usize,
        rect: Rect,
        color: Option<String>,
    ) -> AnnotationId {
        self.create(AnnotationKind::Highlight, page, rect, color, None)
    }

    pub fn create_note(&mut self, style: NoteStyle, page: usize, rect: Rect) -> AnnotationId {
        self.create(
            AnnotationKind::Note { style },
            page,
            rect,
            None,
            Some(String::new()),
        )
    }

    /// Replace an annotation's text, committing an edit. Returns false if
    /// the id is gone (the edit raced a delete).
    pub fn set_text(&mut self, id: AnnotationId, text: impl Into<String>) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                annotation.text = Some(text.into());
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: AnnotationId) -> Option<Annotation> {
        let idx = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn for_page(&self, page: usize) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.page == page)
    }

    #[must_use]
    pub fn all(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Topmost annotation under a viewport point on a page, if any.
    /// Later annotations draw above earlier ones, so search back to front.
    #[must_use]
    pub fn annotation_at(&self, page: usize, x: f32, y: f32) -> Option<&Annotation> {
        self.annotations
            .iter()
            .rev()
            .find(|a| a.page == page && a.rect.contains(x, y))
    }
}
