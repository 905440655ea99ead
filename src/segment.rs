//! Extracted content segments
//!
//! Segments are produced by an upstream analysis service and consumed
//! read-only: a typed, positioned span of page content, measured against
//! the page's native dimensions.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Closed vocabulary of segment types.
///
/// Unrecognized type strings deserialize to [`SegmentKind::Unknown`] and
/// render through the default overlay path instead of failing the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum SegmentKind {
    Title,
    Text,
    Table,
    Picture,
    Formula,
    #[serde(rename = "List item")]
    ListItem,
    #[serde(rename = "Section Header")]
    SectionHeader,
    Caption,
    Footnote,
    #[serde(rename = "Form Field")]
    FormField,
    Checkbox,
    Dropdown,
    Signature,
    Label,
    Instructions,
    Unknown,
}

impl From<String> for SegmentKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Title" => SegmentKind::Title,
            "Text" => SegmentKind::Text,
            "Table" => SegmentKind::Table,
            "Picture" => SegmentKind::Picture,
            "Formula" => SegmentKind::Formula,
            "List item" => SegmentKind::ListItem,
            "Section Header" => SegmentKind::SectionHeader,
            "Caption" => SegmentKind::Caption,
            "Footnote" => SegmentKind::Footnote,
            "Form Field" => SegmentKind::FormField,
            "Checkbox" => SegmentKind::Checkbox,
            "Dropdown" => SegmentKind::Dropdown,
            "Signature" => SegmentKind::Signature,
            "Label" => SegmentKind::Label,
            "Instructions" => SegmentKind::Instructions,
            _ => SegmentKind::Unknown,
        }
    }
}

/// Border color for a segment overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl SegmentKind {
    /// Outline color per type. Exhaustive so a new variant is a
    /// compile-time gap; `Unknown` is the single default arm.
    #[must_use]
    pub const fn outline_color(self) -> Rgb {
        match self {
            SegmentKind::Title => Rgb::new(0x25, 0x63, 0xEB),
            SegmentKind::Text => Rgb::new(0x6B, 0x72, 0x80),
            SegmentKind::Table => Rgb::new(0x7C, 0x3A, 0xED),
            SegmentKind::Picture => Rgb::new(0xDB, 0x27, 0x77),
            SegmentKind::Formula => Rgb::new(0x0D, 0x94, 0x88),
            SegmentKind::ListItem => Rgb::new(0x4F, 0x46, 0xE5),
            SegmentKind::SectionHeader => Rgb::new(0x02, 0x84, 0xC7),
            SegmentKind::Caption => Rgb::new(0xD9, 0x77, 0x06),
            SegmentKind::Footnote => Rgb::new(0x64, 0x74, 0x8B),
            SegmentKind::FormField => Rgb::new(0x16, 0xA3, 0x4A),
            SegmentKind::Checkbox => Rgb::new(0x15, 0x80, 0x3D),
            SegmentKind::Dropdown => Rgb::new(0x05, 0x96, 0x69),
            SegmentKind::Signature => Rgb::new(0xDC, 0x26, 0x26),
            SegmentKind::Label => Rgb::new(0xEA, 0x58, 0x0C),
            SegmentKind::Instructions => Rgb::new(0x08, 0x91, 0xB2),
            SegmentKind::Unknown => Rgb::new(0x9C, 0xA3, 0xAF),
        }
    }

    /// True for kinds that render a text-entry overlay
    #[must_use]
    pub const fn is_editable_field(self) -> bool {
        matches!(self, SegmentKind::FormField | SegmentKind::Dropdown)
    }
}

/// One extracted content region, positioned in native page space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// 1-based page number, per the upstream contract
    pub page_number: u32,
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
    /// Native page dimensions the rectangle was measured against
    pub page_width: f32,
    pub page_height: f32,
    #[serde(default)]
    pub is_pii: bool,
}

impl Segment {
    /// Native-space rectangle of this segment
    #[must_use]
    pub fn native_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    /// 0-based page index, if the page number is within the document
    #[must_use]
    pub fn page_index(&self, page_count: usize) -> Option<usize> {
        if self.page_number == 0 {
            return None;
        }
        let idx = (self.page_number - 1) as usize;
        (idx < page_count).then_some(idx)
    }

    /// True if the native rectangle lies within the measured page bounds
    #[must_use]
    pub fn in_page_bounds(&self) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.left + self.width <= self.page_width
            && self.top + self.height <= self.page_height
    }

    /// Leading label text, up to the first colon.
    ///
    /// Used as the placeholder for editable-field overlays and as the
    /// name matched against structured document fields.
    #[must_use]
    pub fn label(&self) -> &str {
        self.text.split(':').next().unwrap_or("").trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(kind: SegmentKind) -> Segment {
        Segment {
            text: "Full Name: ____".to_string(),
            kind,
            page_number: 1,
            top: 100.0,
            left: 50.0,
            width: 200.0,
            height: 20.0,
            page_width: 612.0,
            page_height: 792.0,
            is_pii: false,
        }
    }

    #[test]
    fn unknown_type_string_deserializes_to_unknown() {
        let json = r#"{
            "text": "x", "type": "Hologram", "page_number": 1,
            "top": 0.0, "left": 0.0, "width": 1.0, "height": 1.0,
            "page_width": 612.0, "page_height": 792.0
        }"#;
        let seg: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(seg.kind, SegmentKind::Unknown);
        assert!(!seg.is_pii);
    }

    #[test]
    fn vocabulary_names_roundtrip() {
        for (name, kind) in [
            ("List item", SegmentKind::ListItem),
            ("Section Header", SegmentKind::SectionHeader),
            ("Form Field", SegmentKind::FormField),
            ("Checkbox", SegmentKind::Checkbox),
        ] {
            let json = format!(
                r#"{{"text":"","type":"{name}","page_number":1,"top":0.0,"left":0.0,
                    "width":1.0,"height":1.0,"page_width":10.0,"page_height":10.0}}"#
            );
            let seg: Segment = serde_json::from_str(&json).unwrap();
            assert_eq!(seg.kind, kind);
        }
    }

    #[test]
    fn label_stops_at_first_colon() {
        let seg = segment(SegmentKind::FormField);
        assert_eq!(seg.label(), "Full Name");

        let mut no_colon = segment(SegmentKind::FormField);
        no_colon.text = "Signature".to_string();
        assert_eq!(no_colon.label(), "Signature");
    }

    #[test]
    fn page_index_checks_range() {
        let seg = segment(SegmentKind::Text);
        assert_eq!(seg.page_index(2), Some(0));
        assert_eq!(seg.page_index(0), None);

        let mut out_of_range = segment(SegmentKind::Text);
        out_of_range.page_number = 3;
        assert_eq!(out_of_range.page_index(2), None);
    }

    #[test]
    fn bounds_check_uses_measured_page() {
        let seg = segment(SegmentKind::Text);
        assert!(seg.in_page_bounds());

        let mut oversized = segment(SegmentKind::Text);
        oversized.width = 600.0;
        assert!(!oversized.in_page_bounds());
    }

    #[test]
    fn every_kind_has_a_color() {
        // Unknown gets the default arm; everything else is distinct enough
        // to tell apart in the overlay legend.
        assert_ne!(
            SegmentKind::Title.outline_color(),
            SegmentKind::Unknown.outline_color()
        );
        assert_ne!(
            SegmentKind::FormField.outline_color(),
            SegmentKind::Checkbox.outline_color()
        );
    }
}
