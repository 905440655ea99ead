//! User-entered form field values
//!
//! Values are keyed by the composite `(page_number, left, top)` identity of
//! the Form-Field/Checkbox segment they belong to. Coordinates are
//! quantized to thousandths so the key is hashable and stable across
//! float round-trips.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// Composite identity of a form-input segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldKey {
    /// 1-based page number
    pub page: u32,
    left_milli: i64,
    top_milli: i64,
}

impl FieldKey {
    #[must_use]
    pub fn new(page: u32, left: f32, top: f32) -> Self {
        Self {
            page,
            left_milli: (f64::from(left) * 1000.0).round() as i64,
            top_milli: (f64::from(top) * 1000.0).round() as i64,
        }
    }

    #[must_use]
    pub fn for_segment(segment: &Segment) -> Self {
        Self::new(segment.page_number, segment.left, segment.top)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p{}@{:.3},{:.3}",
            self.page,
            self.left_milli as f64 / 1000.0,
            self.top_milli as f64 / 1000.0
        )
    }
}

/// The mutable field-value map: created empty on load, written on every
/// edit, read once at export time.
#[derive(Clone, Debug, Default)]
pub struct FormValues {
    values: HashMap<FieldKey, String>,
}

impl FormValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    #[must_use]
    pub fn get(&self, key: &FieldKey) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Checkbox write: stores `"true"` or `"false"`
    pub fn set_checked(&mut self, key: FieldKey, checked: bool) {
        self.values
            .insert(key, if checked { "true" } else { "false" }.to_string());
    }

    /// Checkbox read: only the literal `"true"` counts as checked
    #[must_use]
    pub fn is_checked(&self, key: &FieldKey) -> bool {
        self.values.get(key).is_some_and(|v| v == "true")
    }

    /// Flip a checkbox value, defaulting to checked when unset
    pub fn toggle(&mut self, key: FieldKey) {
        let next = !self.is_checked(&key);
        self.set_checked(key, next);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &str)> {
        self.values.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentKind;

    fn checkbox_segment() -> Segment {
        Segment {
            text: "Agree to terms".to_string(),
            kind: SegmentKind::Checkbox,
            page_number: 2,
            top: 300.5,
            left: 72.25,
            width: 14.0,
            height: 14.0,
            page_width: 612.0,
            page_height: 792.0,
            is_pii: false,
        }
    }

    #[test]
    fn key_is_stable_across_float_noise() {
        let a = FieldKey::new(1, 50.0, 100.0);
        let b = FieldKey::new(1, 50.0001, 100.0004);
        assert_eq!(a, b);

        let c = FieldKey::new(1, 50.01, 100.0);
        assert_ne!(a, c);
    }

    #[test]
    fn segment_key_uses_page_left_top() {
        let seg = checkbox_segment();
        assert_eq!(
            FieldKey::for_segment(&seg),
            FieldKey::new(2, 72.25, 300.5)
        );
    }

    #[test]
    fn checkbox_values_are_literal_booleans() {
        let mut values = FormValues::new();
        let key = FieldKey::new(1, 0.0, 0.0);

        values.set_checked(key, true);
        assert_eq!(values.get(&key), Some("true"));
        assert!(values.is_checked(&key));

        values.toggle(key);
        assert_eq!(values.get(&key), Some("false"));
        assert!(!values.is_checked(&key));
    }

    #[test]
    fn toggle_from_unset_checks() {
        let mut values = FormValues::new();
        let key = FieldKey::new(1, 10.0, 10.0);
        values.toggle(key);
        assert!(values.is_checked(&key));
    }

    #[test]
    fn key_display_is_readable() {
        let key = FieldKey::new(3, 72.25, 300.5);
        assert_eq!(key.to_string(), "p3@72.250,300.500");
    }
}
