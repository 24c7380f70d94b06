//! Marker model, field catalogue, and partial-field patches.
//!
//! A [`Marker`] is an id plus a sparse map of [`MarkerField`] values. Edits are
//! expressed as [`MarkerPatch`]es: only the fields present in a patch are
//! merged, recorded in history, and persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ownership::{self, Namespace};
use crate::types::MarkerId;

// ---------------------------------------------------------------------------
// MarkerField
// ---------------------------------------------------------------------------

/// How a field is stored in its backing column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `DOUBLE PRECISION`, nullable.
    Float,
    /// `TEXT`, nullable.
    Text,
    /// `JSONB`, nullable. Used for `[x, y]` size and anchor pairs.
    Json,
    /// `BOOLEAN NOT NULL`. Only the namespace lock flags.
    Bool,
}

/// Every attribute a marker can carry.
///
/// The catalogue is closed: field names coming from the UI are parsed into
/// this enum and unknown names are rejected, so column names used in SQL are
/// never caller-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerField {
    // core
    Lat,
    Lng,
    Angle,
    RectWidth,
    RectHeight,
    CoreLocked,
    // appearance
    IconUrl,
    IconSize,
    IconColor,
    ClassName,
    Glyph,
    GlyphColor,
    GlyphSize,
    GlyphAnchor,
    ShadowScale,
    FontWeight,
    AppearanceLocked,
    // content
    Name,
    Logo,
    Website,
    Info,
    BoothNumber,
    ContentLocked,
}

impl MarkerField {
    pub const ALL: &'static [MarkerField] = &[
        Self::Lat,
        Self::Lng,
        Self::Angle,
        Self::RectWidth,
        Self::RectHeight,
        Self::CoreLocked,
        Self::IconUrl,
        Self::IconSize,
        Self::IconColor,
        Self::ClassName,
        Self::Glyph,
        Self::GlyphColor,
        Self::GlyphSize,
        Self::GlyphAnchor,
        Self::ShadowScale,
        Self::FontWeight,
        Self::AppearanceLocked,
        Self::Name,
        Self::Logo,
        Self::Website,
        Self::Info,
        Self::BoothNumber,
        Self::ContentLocked,
    ];

    /// External (camelCase) name, as used by the UI layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lat => "lat",
            Self::Lng => "lng",
            Self::Angle => "angle",
            Self::RectWidth => "rectWidth",
            Self::RectHeight => "rectHeight",
            Self::CoreLocked => "coreLocked",
            Self::IconUrl => "iconUrl",
            Self::IconSize => "iconSize",
            Self::IconColor => "iconColor",
            Self::ClassName => "className",
            Self::Glyph => "glyph",
            Self::GlyphColor => "glyphColor",
            Self::GlyphSize => "glyphSize",
            Self::GlyphAnchor => "glyphAnchor",
            Self::ShadowScale => "shadowScale",
            Self::FontWeight => "fontWeight",
            Self::AppearanceLocked => "appearanceLocked",
            Self::Name => "name",
            Self::Logo => "logo",
            Self::Website => "website",
            Self::Info => "info",
            Self::BoothNumber => "boothNumber",
            Self::ContentLocked => "contentLocked",
        }
    }

    /// Backing column name. The same column name is used on the namespace
    /// tables, `assignments`, and `companies`.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Lat => "lat",
            Self::Lng => "lng",
            Self::Angle => "angle",
            Self::RectWidth => "rect_width",
            Self::RectHeight => "rect_height",
            Self::CoreLocked => "core_locked",
            Self::IconUrl => "icon_url",
            Self::IconSize => "icon_size",
            Self::IconColor => "icon_color",
            Self::ClassName => "class_name",
            Self::Glyph => "glyph",
            Self::GlyphColor => "glyph_color",
            Self::GlyphSize => "glyph_size",
            Self::GlyphAnchor => "glyph_anchor",
            Self::ShadowScale => "shadow_scale",
            Self::FontWeight => "font_weight",
            Self::AppearanceLocked => "appearance_locked",
            Self::Name => "name",
            Self::Logo => "logo",
            Self::Website => "website",
            Self::Info => "info",
            Self::BoothNumber => "booth_number",
            Self::ContentLocked => "content_locked",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Lat
            | Self::Lng
            | Self::Angle
            | Self::RectWidth
            | Self::RectHeight
            | Self::ShadowScale => ColumnKind::Float,
            Self::IconSize | Self::GlyphAnchor => ColumnKind::Json,
            Self::CoreLocked | Self::AppearanceLocked | Self::ContentLocked => ColumnKind::Bool,
            _ => ColumnKind::Text,
        }
    }

    /// Namespace this field belongs to in the static ownership map.
    pub fn namespace(&self) -> Namespace {
        ownership::namespace_of(*self)
    }

    pub fn is_lock(&self) -> bool {
        self.kind() == ColumnKind::Bool
    }
}

impl fmt::Display for MarkerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown marker field '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A single field value as exchanged with the UI layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `true` for null, the empty string, and the empty list.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short variant name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// MarkerPatch
// ---------------------------------------------------------------------------

/// A set of field changes for one marker. Only keys present are touched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerPatch(BTreeMap<MarkerField, FieldValue>);

impl MarkerPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: MarkerField, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field, value.into());
        self
    }

    pub fn insert(&mut self, field: MarkerField, value: impl Into<FieldValue>) {
        self.0.insert(field, value.into());
    }

    pub fn get(&self, field: MarkerField) -> Option<&FieldValue> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: MarkerField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = MarkerField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerField, &FieldValue)> {
        self.0.iter().map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a patch from a JSON object keyed by external field names.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("Invalid marker patch: {e}")))
    }
}

impl FromIterator<(MarkerField, FieldValue)> for MarkerPatch {
    fn from_iter<I: IntoIterator<Item = (MarkerField, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MarkerPatch {
    type Item = (MarkerField, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<MarkerField, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

/// One map marker as held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    #[serde(default)]
    pub fields: BTreeMap<MarkerField, FieldValue>,
}

impl Marker {
    /// Create a marker with no attributes set.
    pub fn new(id: MarkerId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: MarkerField, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn get(&self, field: MarkerField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Current value of `field`. Absent fields read as null, absent lock
    /// flags as `false`.
    pub fn value(&self, field: MarkerField) -> FieldValue {
        match self.fields.get(&field) {
            Some(value) => value.clone(),
            None if field.is_lock() => FieldValue::Bool(false),
            None => FieldValue::Null,
        }
    }

    /// Merge every field of `patch` into this marker.
    pub fn apply(&mut self, patch: &MarkerPatch) {
        for (field, value) in patch.iter() {
            self.fields.insert(field, value.clone());
        }
    }

    /// Snapshot the current values of exactly the fields named in `patch`.
    pub fn capture(&self, patch: &MarkerPatch) -> MarkerPatch {
        patch
            .fields()
            .map(|field| (field, self.value(field)))
            .collect()
    }

    pub fn is_booth(&self) -> bool {
        ownership::is_booth_marker(self.id)
    }

    /// Whether the lock flag of `namespace` is set. Unset locks read as `false`.
    pub fn is_locked(&self, namespace: Namespace) -> bool {
        self.get(namespace.lock_field())
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_parse_back_to_the_same_field() {
        for field in MarkerField::ALL {
            assert_eq!(field.as_str().parse::<MarkerField>().unwrap(), *field);
        }
    }

    #[test]
    fn unknown_field_name_is_rejected() {
        let err = "colour".parse::<MarkerField>().unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&MarkerField::RectWidth).unwrap();
        assert_eq!(json, "\"rectWidth\"");
        let json = serde_json::to_string(&MarkerField::AppearanceLocked).unwrap();
        assert_eq!(json, "\"appearanceLocked\"");
    }

    #[test]
    fn only_lock_fields_are_bool_columns() {
        let locks: Vec<_> = MarkerField::ALL.iter().filter(|f| f.is_lock()).collect();
        assert_eq!(
            locks,
            vec![
                &MarkerField::CoreLocked,
                &MarkerField::AppearanceLocked,
                &MarkerField::ContentLocked
            ]
        );
    }

    #[test]
    fn blank_values() {
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::from("").is_blank());
        assert!(FieldValue::List(vec![]).is_blank());
        assert!(!FieldValue::from(0.0).is_blank());
        assert!(!FieldValue::from(false).is_blank());
        assert!(!FieldValue::from(" ").is_blank());
    }

    #[test]
    fn patch_parses_from_json_object() {
        let patch = MarkerPatch::from_json(serde_json::json!({
            "lat": 10.5,
            "name": "Acme",
            "iconSize": [32, 40],
            "coreLocked": true,
            "logo": null
        }))
        .unwrap();

        assert_eq!(patch.len(), 5);
        assert_eq!(patch.get(MarkerField::Lat), Some(&FieldValue::Number(10.5)));
        assert_eq!(patch.get(MarkerField::Name), Some(&FieldValue::from("Acme")));
        assert_eq!(
            patch.get(MarkerField::IconSize),
            Some(&FieldValue::List(vec![32.0.into(), 40.0.into()]))
        );
        assert_eq!(patch.get(MarkerField::CoreLocked), Some(&FieldValue::Bool(true)));
        assert_eq!(patch.get(MarkerField::Logo), Some(&FieldValue::Null));
    }

    #[test]
    fn patch_with_unknown_key_is_rejected() {
        let result = MarkerPatch::from_json(serde_json::json!({"colour": "red"}));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn apply_merges_only_patched_fields() {
        let mut marker = Marker::new(42)
            .with(MarkerField::Lat, 3.0)
            .with(MarkerField::Lng, 7.0);
        marker.apply(&MarkerPatch::new().with(MarkerField::Lat, 10.5));

        assert_eq!(marker.get(MarkerField::Lat), Some(&FieldValue::Number(10.5)));
        assert_eq!(marker.get(MarkerField::Lng), Some(&FieldValue::Number(7.0)));
    }

    #[test]
    fn capture_reports_absent_fields_as_null() {
        let marker = Marker::new(42).with(MarkerField::Lat, 3.0);
        let patch = MarkerPatch::new()
            .with(MarkerField::Lat, 10.5)
            .with(MarkerField::Name, "Acme");

        let previous = marker.capture(&patch);
        assert_eq!(previous.len(), 2);
        assert_eq!(previous.get(MarkerField::Lat), Some(&FieldValue::Number(3.0)));
        assert_eq!(previous.get(MarkerField::Name), Some(&FieldValue::Null));
    }

    #[test]
    fn capture_reports_absent_lock_as_false() {
        let marker = Marker::new(42);
        let patch = MarkerPatch::new().with(MarkerField::CoreLocked, true);

        let previous = marker.capture(&patch);
        assert_eq!(previous.get(MarkerField::CoreLocked), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn unset_lock_reads_as_unlocked() {
        let marker = Marker::new(1).with(MarkerField::AppearanceLocked, true);
        assert!(!marker.is_locked(Namespace::Core));
        assert!(marker.is_locked(Namespace::Appearance));
    }
}
