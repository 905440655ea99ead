//! Structured form field discovery
//!
//! Walks the document's AcroForm field tree once at load time and builds
//! an explicit field-name to segment-key correspondence. Export reuses the
//! binding instead of re-deriving matches ad hoc.

use lopdf::{Dictionary, Document, Object};

use crate::form::FieldKey;
use crate::segment::Segment;

/// Field types the authoring layer knows how to set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// `/FT /Tx`
    Text,
    /// `/FT /Btn`
    Checkbox,
    /// `/FT /Ch`
    Choice,
    /// Anything else; writing falls back to drawn text
    Other,
}

/// One named input region defined by the document format itself
#[derive(Clone, Debug)]
pub struct StructuredField {
    pub id: lopdf::ObjectId,
    pub name: String,
    pub field_type: FieldType,
    /// Checkbox "on" appearance state from `/AP /N`, when present
    pub on_state: Option<String>,
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj)?.as_dict().ok()
}

fn field_name(dict: &Dictionary) -> Option<String> {
    let name = dict.get(b"T").ok()?;
    match name {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

fn field_type(dict: &Dictionary) -> Option<FieldType> {
    let ft = dict.get(b"FT").ok()?.as_name().ok()?;
    Some(match ft {
        b"Tx" => FieldType::Text,
        b"Btn" => FieldType::Checkbox,
        b"Ch" => FieldType::Choice,
        _ => FieldType::Other,
    })
}

/// The checkbox "on" state is whatever non-`Off` appearance the normal
/// appearance dictionary defines; real forms rarely call it `Yes`.
fn checkbox_on_state(doc: &Document, dict: &Dictionary) -> Option<String> {
    let ap = dict.get(b"AP").ok().and_then(|o| resolve_dict(doc, o))?;
    let normal = ap.get(b"N").ok().and_then(|o| resolve_dict(doc, o))?;
    normal
        .iter()
        .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
        .find(|state| state != "Off")
}

fn walk_field(
    doc: &Document,
    field_obj: &Object,
    prefix: &str,
    out: &mut Vec<StructuredField>,
) {
    let Object::Reference(id) = field_obj else {
        return;
    };
    let id = *id;
    let Ok(obj) = doc.get_object(id) else {
        return;
    };
    let Ok(dict) = obj.as_dict() else {
        return;
    };

    let name = match field_name(dict) {
        Some(partial) if prefix.is_empty() => partial,
        Some(partial) => format!("{prefix}.{partial}"),
        None => prefix.to_string(),
    };

    if let Some(field_type) = field_type(dict) {
        if !name.is_empty() {
            let on_state = (field_type == FieldType::Checkbox)
                .then(|| checkbox_on_state(doc, dict))
                .flatten();
            out.push(StructuredField {
                id,
                name: name.clone(),
                field_type,
                on_state,
            });
        }
    }

    if let Ok(kids) = dict.get(b"Kids") {
        if let Some(Object::Array(kids)) = resolve(doc, kids) {
            for kid in kids {
                walk_field(doc, kid, &name, out);
            }
        }
    }
}

/// Every structured field the document defines, in tree order.
/// Returns an empty list for documents without an AcroForm.
#[must_use]
pub fn discover_fields(doc: &Document) -> Vec<StructuredField> {
    let mut fields = Vec::new();

    let Ok(catalog) = doc.catalog() else {
        return fields;
    };
    let Some(acroform) = catalog.get(b"AcroForm").ok().and_then(|o| resolve_dict(doc, o))
    else {
        return fields;
    };
    let Some(Object::Array(roots)) = acroform.get(b"Fields").ok().and_then(|o| resolve(doc, o))
    else {
        return fields;
    };

    for root in roots {
        walk_field(doc, root, "", &mut fields);
    }

    fields
}

/// Field-name to segment-key correspondence, computed once at load
#[derive(Clone, Debug, PartialEq)]
pub struct FieldBinding {
    pub field_name: String,
    pub key: FieldKey,
}

fn labels_match(field_name: &str, label: &str) -> bool {
    field_name == label || field_name.trim().eq_ignore_ascii_case(label.trim())
}

/// Match each structured field to a form-input segment by name.
///
/// Matching is exact first, then trimmed case-insensitive; the segment's
/// leading label (text up to the first colon) is the name it goes by.
#[must_use]
pub fn bind_fields(fields: &[StructuredField], segments: &[Segment]) -> Vec<FieldBinding> {
    fields
        .iter()
        .filter_map(|field| {
            let segment = segments
                .iter()
                .find(|s| is_form_input(s) && s.label() == field.name)
                .or_else(|| {
                    segments
                        .iter()
                        .find(|s| is_form_input(s) && labels_match(&field.name, s.label()))
                })?;
            Some(FieldBinding {
                field_name: field.name.clone(),
                key: FieldKey::for_segment(segment),
            })
        })
        .collect()
}

fn is_form_input(segment: &Segment) -> bool {
    segment.kind.is_editable_field() || segment.kind == crate::segment::SegmentKind::Checkbox
}
