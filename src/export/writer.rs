//! Filled-document serialization
//!
//! Writes the current form values back into a copy of the original
//! document bytes. Structured fields get their `/V` set; a document with
//! no structured fields at all falls back to drawing each value as page
//! content at the segment's native position. The original bytes are never
//! mutated; export either yields a complete new byte stream or fails.

use std::collections::BTreeMap;

use log::{debug, warn};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use super::fields::{FieldType, StructuredField, bind_fields, discover_fields};
use crate::form::{FieldKey, FormValues};
use crate::segment::Segment;

/// Font resource name registered for fallback text drawing
const OVERLAY_FONT: &str = "PmHelv";

/// Failure while producing the export byte stream.
///
/// In-memory state is untouched on failure; the caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("document authoring: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to serialize field values: {0}")]
    Values(#[from] serde_json::Error),

    #[error("writing output: {0}")]
    Io(#[from] std::io::Error),
}

enum FieldWrite {
    Written,
    /// The authoring layer cannot set this field type; recovered locally
    /// by drawing the value instead.
    Unsupported,
}

pub struct FormExporter;

impl FormExporter {
    /// Produce a new document byte stream with the form values applied.
    pub fn export(
        original: &[u8],
        values: &FormValues,
        segments: &[Segment],
    ) -> Result<Vec<u8>, ExportError> {
        let mut doc = Document::load_mem(original)?;
        let fields = discover_fields(&doc);

        if fields.is_empty() {
            if !values.is_empty() {
                debug!("no structured fields; drawing {} value(s)", values.len());
                Self::draw_values(&mut doc, values, segments)?;
            }
        } else {
            Self::fill_fields(&mut doc, &fields, values, segments)?;
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)?;
        Ok(output)
    }

    /// Serialize the value map alone as a flat name-to-string JSON record.
    ///
    /// Keys are the bound segment labels where available, otherwise the
    /// composite field key.
    pub fn export_values(values: &FormValues, segments: &[Segment]) -> Result<String, ExportError> {
        let mut record = BTreeMap::new();
        for (key, value) in values.iter() {
            let name = segments
                .iter()
                .find(|s| FieldKey::for_segment(s) == *key)
                .map(|s| s.label().to_string())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| key.to_string());
            record.insert(name, value.to_string());
        }
        Ok(serde_json::to_string_pretty(&record)?)
    }

    fn fill_fields(
        doc: &mut Document,
        fields: &[StructuredField],
        values: &FormValues,
        segments: &[Segment],
    ) -> Result<(), ExportError> {
        // The name-to-key binding was fixed at load time; re-deriving it
        // here from the same inputs keeps export a pure function of them.
        let bindings = bind_fields(fields, segments);
        let mut written = 0usize;

        for field in fields {
            let Some(binding) = bindings.iter().find(|b| b.field_name == field.name) else {
                continue;
            };
            let Some(value) = values.get(&binding.key) else {
                continue;
            };

            match Self::set_field(doc, field, value)? {
                FieldWrite::Written => written += 1,
                FieldWrite::Unsupported => {
                    warn!(
                        "field '{}' has an unsupported type; drawing its value instead",
                        field.name
                    );
                    if let Some(segment) = segments
                        .iter()
                        .find(|s| FieldKey::for_segment(s) == binding.key)
                    {
                        Self::draw_single(doc, segment, value)?;
                    }
                }
            }
        }

        if written > 0 {
            // Viewers must regenerate widget appearances for the new values.
            Self::set_need_appearances(doc);
        }
        Ok(())
    }

    fn set_field(
        doc: &mut Document,
        field: &StructuredField,
        value: &str,
    ) -> Result<FieldWrite, ExportError> {
        match field.field_type {
            FieldType::Text | FieldType::Choice => {
                let dict = doc.get_object_mut(field.id)?.as_dict_mut()?;
                dict.set(
                    "V",
                    Object::String(value.as_bytes().to_vec(), lopdf::StringFormat::Literal),
                );
                Ok(FieldWrite::Written)
            }

            FieldType::Checkbox => {
                let state = if value == "true" {
                    field.on_state.clone().unwrap_or_else(|| "Yes".to_string())
                } else {
                    "Off".to_string()
                };
                let dict = doc.get_object_mut(field.id)?.as_dict_mut()?;
                dict.set("V", Object::Name(state.as_bytes().to_vec()));
                dict.set("AS", Object::Name(state.into_bytes()));
                Ok(FieldWrite::Written)
            }

            FieldType::Other => Ok(FieldWrite::Unsupported),
        }
    }

    /// Fallback for documents without structured fields: draw every value
    /// whose segment can be located.
    fn draw_values(
        doc: &mut Document,
        values: &FormValues,
        segments: &[Segment],
    ) -> Result<(), ExportError> {
        for (key, value) in values.iter() {
            let Some(segment) = segments.iter().find(|s| FieldKey::for_segment(s) == *key) else {
                warn!("no segment for value at {key}; skipping");
                continue;
            };
            Self::draw_single(doc, segment, value)?;
        }
        Ok(())
    }

    fn draw_single(
        doc: &mut Document,
        segment: &Segment,
        value: &str,
    ) -> Result<(), ExportError> {
        let Some(page_id) = doc.get_pages().get(&segment.page_number).copied() else {
            warn!(
                "segment page {} not present in document; skipping value",
                segment.page_number
            );
            return Ok(());
        };

        // Page content coordinates originate at the bottom-left; the
        // segment rectangle is measured from the top. This is the one
        // place the two conventions diverge.
        let page_height = Self::page_height(doc, page_id);
        let pdf_y = page_height - segment.top - segment.height;
        let font_size = (segment.height * 0.8).clamp(6.0, 14.0);

        Self::ensure_overlay_font(doc, page_id)?;

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(OVERLAY_FONT.as_bytes().to_vec()),
                        font_size.into(),
                    ],
                ),
                Operation::new("Td", vec![segment.left.into(), pdf_y.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        value.as_bytes().to_vec(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let stream_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        match page.get_mut(b"Contents") {
            Ok(Object::Array(contents)) => contents.push(Object::Reference(stream_id)),
            Ok(existing @ Object::Reference(_)) => {
                let previous = existing.clone();
                *existing = Object::Array(vec![previous, Object::Reference(stream_id)]);
            }
            _ => page.set("Contents", Object::Reference(stream_id)),
        }
        Ok(())
    }

    /// MediaBox height for a page, traversing to the parent when the page
    /// itself has none; defaults to US Letter.
    fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
        Self::media_box(doc, page_id)
            .map(|[_, y1, _, y2]| y2 - y1)
            .unwrap_or(792.0)
    }

    fn media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
        let page = doc.get_object(page_id).ok()?.as_dict().ok()?;

        let media_box = page.get(b"MediaBox").ok().or_else(|| {
            let parent_id = page.get(b"Parent").ok()?.as_reference().ok()?;
            let parent = doc.get_object(parent_id).ok()?.as_dict().ok()?;
            parent.get(b"MediaBox").ok()
        })?;

        let resolved = match media_box {
            Object::Reference(id) => doc.get_object(*id).ok()?,
            other => other,
        };
        let values = resolved.as_array().ok()?;
        if values.len() != 4 {
            return None;
        }

        let mut out = [0.0f32; 4];
        for (i, obj) in values.iter().enumerate() {
            out[i] = Self::number(doc, obj)?;
        }
        Some(out)
    }

    fn number(doc: &Document, obj: &Object) -> Option<f32> {
        match obj {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r),
            Object::Reference(id) => Self::number(doc, doc.get_object(*id).ok()?),
            _ => None,
        }
    }

    /// Register a Helvetica resource on the page for drawn values.
    fn ensure_overlay_font(doc: &mut Document, page_id: ObjectId) -> Result<(), ExportError> {
        // Locate the resource and font tables before any mutable borrow;
        // either may be inline or its own object.
        let (resources_ref, font_ref) = {
            let page = doc.get_object(page_id)?.as_dict()?;
            let resources_obj = page.get(b"Resources").ok();
            let resources_ref = resources_obj.and_then(|o| o.as_reference().ok());
            let resources_dict = match resources_obj {
                Some(Object::Reference(id)) => {
                    doc.get_object(*id).ok().and_then(|o| o.as_dict().ok())
                }
                Some(Object::Dictionary(dict)) => Some(dict),
                _ => None,
            };
            let font_ref = resources_dict
                .and_then(|d| d.get(b"Font").ok())
                .and_then(|o| o.as_reference().ok());
            (resources_ref, font_ref)
        };

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        if let Some(fonts_id) = font_ref {
            let fonts = doc.get_object_mut(fonts_id)?.as_dict_mut()?;
            fonts.set(OVERLAY_FONT, Object::Reference(font_id));
        } else if let Some(resources_id) = resources_ref {
            let resources = doc.get_object_mut(resources_id)?.as_dict_mut()?;
            Self::set_font_entry(resources, font_id);
        } else {
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            if !page.has(b"Resources") {
                page.set("Resources", Object::Dictionary(Dictionary::new()));
            }
            if let Ok(resources) = page.get_mut(b"Resources").and_then(|o| o.as_dict_mut()) {
                Self::set_font_entry(resources, font_id);
            }
        }
        Ok(())
    }

    fn set_font_entry(resources: &mut Dictionary, font_id: ObjectId) {
        match resources.get_mut(b"Font") {
            Ok(Object::Dictionary(fonts)) => {
                fonts.set(OVERLAY_FONT, Object::Reference(font_id));
            }
            _ => {
                let mut fonts = Dictionary::new();
                fonts.set(OVERLAY_FONT, Object::Reference(font_id));
                resources.set("Font", Object::Dictionary(fonts));
            }
        }
    }

    fn set_need_appearances(doc: &mut Document) {
        let Some(root_id) = doc
            .trailer
            .get(b"Root")
            .ok()
            .and_then(|o| o.as_reference().ok())
        else {
            return;
        };

        let acroform_ref = doc
            .get_object(root_id)
            .ok()
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"AcroForm").ok())
            .and_then(|o| o.as_reference().ok());

        if let Some(acroform_id) = acroform_ref {
            if let Ok(acroform) = doc
                .get_object_mut(acroform_id)
                .and_then(Object::as_dict_mut)
            {
                acroform.set("NeedAppearances", Object::Boolean(true));
            }
        } else if let Ok(catalog) = doc.get_object_mut(root_id).and_then(Object::as_dict_mut) {
            if let Ok(acroform) = catalog.get_mut(b"AcroForm").and_then(Object::as_dict_mut) {
                acroform.set("NeedAppearances", Object::Boolean(true));
            }
        }
    }
}
