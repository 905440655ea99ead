//! End-to-end viewer scenarios: load, overlay, interact, export.

use lopdf::{Document, Object, StringFormat, dictionary};

use pagemark::segment::{Segment, SegmentKind};
use pagemark::viewer::{ControllerEvent, DocumentViewer, Tool, ViewerEvent};

/// Two-page US Letter document whose first page carries a text form
/// field named "Full Name".
fn two_page_form_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");

    let field_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::String(b"Full Name".to_vec(), StringFormat::Literal),
        "Rect" => vec![50.into(), 672.into(), 250.into(), 692.into()],
    });

    let page1_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Annots" => vec![Object::Reference(field_id)],
    });
    let page2_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page1_id), Object::Reference(page2_id)],
        "Count" => 2,
    });
    for page_id in [page1_id, page2_id] {
        if let Ok(page) = doc.get_object_mut(page_id) {
            if let Ok(dict) = page.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => dictionary! {
            "Fields" => vec![Object::Reference(field_id)],
        },
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn segment(kind: SegmentKind, page_number: u32, top: f32, left: f32) -> Segment {
    Segment {
        text: "Full Name: ____".to_string(),
        kind,
        page_number,
        top,
        left,
        width: 200.0,
        height: 20.0,
        page_width: 612.0,
        page_height: 792.0,
        is_pii: false,
    }
}

fn loaded_viewer() -> DocumentViewer {
    let mut viewer = DocumentViewer::new();
    viewer.load_document(two_page_form_pdf()).unwrap();
    viewer
}

#[test]
fn load_reports_pages_and_default_zoom() {
    let viewer = loaded_viewer();
    assert_eq!(viewer.page_count(), 2);
    assert_eq!(viewer.surfaces().len(), 2);
    assert_eq!(viewer.zoom_percent(), 150);
    assert!(!viewer.is_loading());
}

#[test]
fn failed_load_leaves_viewer_usable() {
    let mut viewer = DocumentViewer::new();
    assert!(viewer.load_document(vec![0u8; 64]).is_err());
    assert_eq!(viewer.page_count(), 0);
    assert!(viewer.surfaces().is_empty());

    // A retry with good bytes succeeds.
    viewer.load_document(two_page_form_pdf()).unwrap();
    assert_eq!(viewer.page_count(), 2);
}

#[test]
fn form_field_overlay_lands_on_doubled_coordinates() {
    let mut viewer = loaded_viewer();
    viewer
        .set_segments(vec![segment(SegmentKind::FormField, 1, 100.0, 50.0)])
        .unwrap();
    viewer.set_scale(2.0).unwrap();

    let overlays = viewer.overlays();
    assert_eq!(overlays.len(), 1);
    let rect = overlays[0].rect;
    assert!((rect.x - 100.0).abs() < 0.01, "left was {}", rect.x);
    assert!((rect.y - 200.0).abs() < 0.01, "top was {}", rect.y);
    assert!((rect.width - 400.0).abs() < 0.01, "width was {}", rect.width);
    assert!((rect.height - 40.0).abs() < 0.01, "height was {}", rect.height);
}

#[test]
fn rescaling_repositions_overlays_but_keeps_selection() {
    let mut viewer = loaded_viewer();
    viewer
        .set_segments(vec![
            segment(SegmentKind::Text, 1, 100.0, 50.0),
            segment(SegmentKind::Table, 2, 300.0, 60.0),
        ])
        .unwrap();

    let event = viewer.select_segment(1).unwrap();
    assert!(matches!(
        event,
        ViewerEvent::SegmentSelected { index: 1, .. }
    ));

    let before = viewer.overlays();
    viewer.set_scale(2.5).unwrap();
    let after = viewer.overlays();

    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(&after) {
        assert_eq!(a.segment_index, b.segment_index);
        assert_eq!(a.selected, b.selected);
        assert_ne!(a.rect, b.rect);
    }
    assert_eq!(viewer.selected_segment().unwrap().0, 1);
}

#[test]
fn clicking_a_region_overlay_raises_selection() {
    let mut viewer = loaded_viewer();
    viewer
        .set_segments(vec![segment(SegmentKind::Text, 1, 100.0, 50.0)])
        .unwrap();

    // Default scale is 1.5: the segment spans (75, 150) to (375, 180).
    let event = viewer.pointer_down(0, 80.0, 160.0);
    match event {
        Some(ViewerEvent::SegmentSelected { index, segment }) => {
            assert_eq!(index, 0);
            assert_eq!(segment.kind, SegmentKind::Text);
        }
        other => panic!("expected selection, got {other:?}"),
    }
}

#[test]
fn checkbox_overlay_intercepts_and_toggles() {
    let mut viewer = loaded_viewer();
    let checkbox = segment(SegmentKind::Checkbox, 1, 100.0, 50.0);
    let key = pagemark::form::FieldKey::for_segment(&checkbox);
    viewer.set_segments(vec![checkbox]).unwrap();

    viewer.toggle_tool(Tool::Highlight);
    let event = viewer.pointer_down(0, 80.0, 160.0);
    assert!(event.is_none(), "editable overlays swallow the press");
    assert!(viewer.form_values().is_checked(&key));

    // No drag started underneath the intercepted press.
    assert!(viewer.pointer_up().is_none());
    assert!(viewer.annotations().is_empty());

    viewer.toggle_tool(Tool::Highlight);
    viewer.pointer_down(0, 80.0, 160.0);
    assert!(!viewer.form_values().is_checked(&key));
}

#[test]
fn highlight_drag_commits_in_viewport_space_and_stays_put_on_zoom() {
    let mut viewer = loaded_viewer();

    viewer.toggle_tool(Tool::Highlight);
    viewer.pointer_down(0, 100.0, 100.0);
    viewer.pointer_move(180.0, 140.0);
    let event = viewer.pointer_up();
    assert!(matches!(
        event,
        Some(ViewerEvent::Annotation(ControllerEvent::AnnotationCreated(_)))
    ));

    let rect = viewer.annotations()[0].rect;
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (100.0, 100.0, 80.0, 40.0));

    // Annotations are bound to the zoom at creation time; segments
    // rescale, annotations do not.
    viewer.set_scale(3.0).unwrap();
    let after = viewer.annotations()[0].rect;
    assert_eq!(rect, after);
}

#[test]
fn pii_filter_narrows_overlays() {
    let mut viewer = loaded_viewer();
    let mut sensitive = segment(SegmentKind::Text, 1, 300.0, 50.0);
    sensitive.is_pii = true;
    viewer
        .set_segments(vec![segment(SegmentKind::Text, 1, 100.0, 50.0), sensitive])
        .unwrap();

    assert_eq!(viewer.overlays().len(), 2);
    viewer.toggle_pii_filter();
    let overlays = viewer.overlays();
    assert_eq!(overlays.len(), 1);
    assert!(overlays[0].indicator_glyph().is_some());
}

#[test]
fn entered_value_survives_export_and_redecode() {
    let mut viewer = loaded_viewer();
    let field = segment(SegmentKind::FormField, 1, 100.0, 50.0);
    let key = pagemark::form::FieldKey::for_segment(&field);
    viewer.set_segments(vec![field]).unwrap();

    assert_eq!(viewer.bindings().len(), 1);
    viewer.set_field_value(key, "John Doe");

    let exported = viewer.export_filled().unwrap();
    let doc = Document::load_mem(&exported).unwrap();

    let catalog = doc.catalog().unwrap();
    let acroform = catalog.get(b"AcroForm").unwrap().as_dict().unwrap();
    let fields = acroform.get(b"Fields").unwrap().as_array().unwrap();
    let field_dict = doc
        .get_object(fields[0].as_reference().unwrap())
        .unwrap()
        .as_dict()
        .unwrap();
    match field_dict.get(b"V").unwrap() {
        Object::String(bytes, _) => assert_eq!(bytes, b"John Doe"),
        other => panic!("expected string value, got {other:?}"),
    }
}

#[test]
fn values_record_round_trips_through_json() {
    let mut viewer = loaded_viewer();
    let field = segment(SegmentKind::FormField, 1, 100.0, 50.0);
    let key = pagemark::form::FieldKey::for_segment(&field);
    viewer.set_segments(vec![field]).unwrap();
    viewer.set_field_value(key, "John Doe");

    let record = viewer.export_values().unwrap();
    let parsed: std::collections::BTreeMap<String, String> =
        serde_json::from_str(&record).unwrap();
    assert_eq!(parsed.get("Full Name").map(String::as_str), Some("John Doe"));
}

#[test]
fn new_document_resets_annotations_and_values() {
    let mut viewer = loaded_viewer();
    let field = segment(SegmentKind::FormField, 1, 100.0, 50.0);
    let key = pagemark::form::FieldKey::for_segment(&field);
    viewer.set_segments(vec![field]).unwrap();
    viewer.set_field_value(key, "John Doe");

    viewer.toggle_tool(Tool::StickyNote);
    viewer.pointer_down(0, 10.0, 10.0);
    assert_eq!(viewer.annotations().len(), 1);

    viewer.load_document(two_page_form_pdf()).unwrap();
    assert!(viewer.annotations().is_empty());
    assert!(viewer.form_values().is_empty());
}
