//! Segment overlay rendering
//!
//! Overlays are derived declaratively: every pass rebuilds the full list
//! from the current segment array, surfaces, and form values, keyed by
//! segment index. Nothing is patched in place, so there is no stale-node
//! bookkeeping to get wrong.

use std::sync::Arc;

use crate::form::{FieldKey, FormValues};
use crate::geometry::Rect;
use crate::raster::PageSurface;
use crate::segment::{Rgb, Segment, SegmentKind};

/// Border color for the sensitive-segment treatment
pub const PII_COLOR: Rgb = Rgb::new(0xEF, 0x44, 0x44);

/// Indicator glyph rendered on every sensitive segment
pub const PII_GLYPH: &str = "\u{26A0}";

/// How a segment overlay renders and reacts to the pointer
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayKind {
    /// Boolean toggle bound to the form-value entry for this segment
    Checkbox { key: FieldKey, checked: bool },
    /// Text-entry region (Form Field / Dropdown), prefilled from the
    /// form values; placeholder is the segment's leading label
    Field {
        key: FieldKey,
        value: String,
        placeholder: String,
    },
    /// Sensitive segment: distinct treatment, unmistakable at a glance
    Pii,
    /// Everything else: clickable highlight with a per-type border color
    Region { color: Rgb },
}

/// One positioned, interactive overlay for a segment
#[derive(Clone, Debug)]
pub struct SegmentOverlay {
    /// Index into the segment array this overlay represents
    pub segment_index: usize,
    /// 0-based page index
    pub page: usize,
    /// Viewport-space rectangle at the current zoom
    pub rect: Rect,
    pub kind: OverlayKind,
    /// Sensitive flag; independent of kind so form inputs keep their
    /// interaction while still carrying the treatment
    pub pii: bool,
    pub selected: bool,
}

impl SegmentOverlay {
    /// Editable overlays swallow pointer events so typing or toggling
    /// never reaches the page-level annotation tools.
    #[must_use]
    pub fn intercepts_pointer(&self) -> bool {
        matches!(
            self.kind,
            OverlayKind::Checkbox { .. } | OverlayKind::Field { .. }
        )
    }

    /// Always-visible indicator for sensitive segments
    #[must_use]
    pub fn indicator_glyph(&self) -> Option<&'static str> {
        self.pii.then_some(PII_GLYPH)
    }

    /// Border color this overlay draws with
    #[must_use]
    pub fn border_color(&self) -> Rgb {
        if self.pii {
            return PII_COLOR;
        }
        match &self.kind {
            OverlayKind::Checkbox { .. } => SegmentKind::Checkbox.outline_color(),
            OverlayKind::Field { .. } => SegmentKind::FormField.outline_color(),
            OverlayKind::Pii => PII_COLOR,
            OverlayKind::Region { color } => *color,
        }
    }
}

fn overlay_kind(segment: &Segment, values: &FormValues) -> OverlayKind {
    if segment.kind == SegmentKind::Checkbox {
        let key = FieldKey::for_segment(segment);
        return OverlayKind::Checkbox {
            checked: values.is_checked(&key),
            key,
        };
    }
    if segment.kind.is_editable_field() {
        let key = FieldKey::for_segment(segment);
        return OverlayKind::Field {
            value: values.get(&key).unwrap_or_default().to_string(),
            placeholder: segment.label().to_string(),
            key,
        };
    }
    if segment.is_pii {
        return OverlayKind::Pii;
    }
    OverlayKind::Region {
        color: segment.kind.outline_color(),
    }
}

/// Build the overlay list for the current render pass.
///
/// Segments whose page has no rendered surface are skipped rather than
/// failing the pass; unknown kinds fall through to the default region
/// path with the default color.
#[must_use]
pub fn build_overlays(
    segments: &[Segment],
    surfaces: &[Arc<PageSurface>],
    values: &FormValues,
    pii_only: bool,
    selected: Option<usize>,
) -> Vec<SegmentOverlay> {
    let mut overlays = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        if pii_only && !segment.is_pii {
            continue;
        }
        let Some(page) = segment.page_index(surfaces.len()) else {
            continue;
        };
        let surface = &surfaces[page];

        let rect = segment
            .native_rect()
            .to_viewport(surface.native, surface.viewport_size());

        overlays.push(SegmentOverlay {
            segment_index: index,
            page,
            rect,
            kind: overlay_kind(segment, values),
            pii: segment.is_pii,
            selected: selected == Some(index),
        });
    }

    overlays
}

/// Topmost overlay under a viewport point on a page, if any
#[must_use]
pub fn overlay_at<'a>(
    overlays: &'a [SegmentOverlay],
    page: usize,
    x: f32,
    y: f32,
) -> Option<&'a SegmentOverlay> {
    overlays
        .iter()
        .rev()
        .find(|o| o.page == page && o.rect.contains(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PageSize;
    use crate::raster::ImageData;

    fn surface(page: usize, native_w: f32, native_h: f32, scale: f32) -> Arc<PageSurface> {
        let width_px = (native_w * scale).round() as u32;
        let height_px = (native_h * scale).round() as u32;
        Arc::new(PageSurface {
            image: ImageData {
                pixels: vec![0; (width_px * height_px * 3) as usize],
                width_px,
                height_px,
            },
            page,
            native: PageSize::new(native_w, native_h),
            scale,
        })
    }

    fn segment(kind: SegmentKind, page_number: u32) -> Segment {
        Segment {
            text: "Full Name: ____".to_string(),
            kind,
            page_number,
            top: 100.0,
            left: 50.0,
            width: 200.0,
            height: 20.0,
            page_width: 612.0,
            page_height: 792.0,
            is_pii: false,
        }
    }

    fn letter_surfaces(scale: f32) -> Vec<Arc<PageSurface>> {
        vec![surface(0, 612.0, 792.0, scale), surface(1, 612.0, 792.0, scale)]
    }

    #[test]
    fn form_field_maps_to_doubled_viewport_rect() {
        let segments = vec![segment(SegmentKind::FormField, 1)];
        let surfaces = letter_surfaces(2.0);
        let overlays = build_overlays(&segments, &surfaces, &FormValues::new(), false, None);

        assert_eq!(overlays.len(), 1);
        let o = &overlays[0];
        assert_eq!(o.rect, Rect::new(100.0, 200.0, 400.0, 40.0));
        assert!(o.intercepts_pointer());
    }

    #[test]
    fn rescale_repositions_but_preserves_identity() {
        let segments = vec![
            segment(SegmentKind::Text, 1),
            segment(SegmentKind::Table, 2),
        ];
        let at_1x = build_overlays(&segments, &letter_surfaces(1.0), &FormValues::new(), false, Some(1));
        let at_2x = build_overlays(&segments, &letter_surfaces(2.0), &FormValues::new(), false, Some(1));

        assert_eq!(at_1x.len(), at_2x.len());
        for (a, b) in at_1x.iter().zip(&at_2x) {
            assert_eq!(a.segment_index, b.segment_index);
            assert_eq!(a.selected, b.selected);
            assert_ne!(a.rect, b.rect);
        }
        assert!(at_2x[1].selected);
        assert!(!at_2x[0].selected);
    }

    #[test]
    fn pii_flag_drives_treatment_for_every_kind() {
        let mut field = segment(SegmentKind::FormField, 1);
        field.is_pii = true;
        let mut plain = segment(SegmentKind::Text, 1);
        plain.is_pii = true;
        let normal = segment(SegmentKind::Text, 2);

        let segments = vec![field, plain, normal];
        let overlays = build_overlays(
            &segments,
            &letter_surfaces(1.0),
            &FormValues::new(),
            false,
            None,
        );

        assert_eq!(overlays.len(), 3);
        assert!(overlays[0].indicator_glyph().is_some());
        assert_eq!(overlays[0].border_color(), PII_COLOR);
        // The form input keeps its interaction despite the treatment.
        assert!(overlays[0].intercepts_pointer());

        assert_eq!(overlays[1].kind, OverlayKind::Pii);
        assert!(overlays[1].indicator_glyph().is_some());

        assert!(overlays[2].indicator_glyph().is_none());
        assert_ne!(overlays[2].border_color(), PII_COLOR);
    }

    #[test]
    fn pii_only_filter_drops_everything_else() {
        let mut sensitive = segment(SegmentKind::Text, 1);
        sensitive.is_pii = true;
        let segments = vec![segment(SegmentKind::Text, 1), sensitive];

        let overlays = build_overlays(
            &segments,
            &letter_surfaces(1.0),
            &FormValues::new(),
            true,
            None,
        );
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].segment_index, 1);
    }

    #[test]
    fn checkbox_binds_to_form_value() {
        let seg = segment(SegmentKind::Checkbox, 1);
        let key = FieldKey::for_segment(&seg);
        let segments = vec![seg];

        let mut values = FormValues::new();
        let overlays = build_overlays(&segments, &letter_surfaces(1.0), &values, false, None);
        assert_eq!(
            overlays[0].kind,
            OverlayKind::Checkbox {
                key,
                checked: false
            }
        );

        values.set_checked(key, true);
        let overlays = build_overlays(&segments, &letter_surfaces(1.0), &values, false, None);
        assert_eq!(overlays[0].kind, OverlayKind::Checkbox { key, checked: true });
    }

    #[test]
    fn field_prefills_value_and_derives_placeholder() {
        let seg = segment(SegmentKind::FormField, 1);
        let key = FieldKey::for_segment(&seg);
        let mut values = FormValues::new();
        values.set(key, "John Doe");

        let segments = vec![seg];
        let overlays = build_overlays(&segments, &letter_surfaces(1.0), &values, false, None);
        match &overlays[0].kind {
            OverlayKind::Field {
                value, placeholder, ..
            } => {
                assert_eq!(value, "John Doe");
                assert_eq!(placeholder, "Full Name");
            }
            other => panic!("expected field overlay, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_renders_default_region() {
        let seg = segment(SegmentKind::Unknown, 1);
        let segments = vec![seg];
        let overlays = build_overlays(
            &segments,
            &letter_surfaces(1.0),
            &FormValues::new(),
            false,
            None,
        );
        assert_eq!(overlays.len(), 1);
        assert_eq!(
            overlays[0].kind,
            OverlayKind::Region {
                color: SegmentKind::Unknown.outline_color()
            }
        );
        assert!(!overlays[0].intercepts_pointer());
    }

    #[test]
    fn out_of_range_page_is_skipped_not_fatal() {
        let segments = vec![segment(SegmentKind::Text, 9)];
        let overlays = build_overlays(
            &segments,
            &letter_surfaces(1.0),
            &FormValues::new(),
            false,
            None,
        );
        assert!(overlays.is_empty());
    }

    #[test]
    fn hit_test_finds_topmost_on_page() {
        let segments = vec![segment(SegmentKind::Text, 1), segment(SegmentKind::Title, 1)];
        let overlays = build_overlays(
            &segments,
            &letter_surfaces(1.0),
            &FormValues::new(),
            false,
            None,
        );

        let hit = overlay_at(&overlays, 0, 60.0, 110.0).unwrap();
        assert_eq!(hit.segment_index, 1);
        assert!(overlay_at(&overlays, 1, 60.0, 110.0).is_none());
    }
}
