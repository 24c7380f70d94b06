//! Joined marker snapshot row.
//!
//! One row per `marker_core` entry, left-joined with the other two namespace
//! tables and, for the requested event year, the assignment and company.

use expo_core::marker::{FieldValue, Marker, MarkerField};
use expo_core::ownership::is_booth_marker;
use expo_core::types::{DbId, MarkerId};
use serde::Serialize;
use sqlx::FromRow;

/// A row of the marker snapshot query.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MarkerRow {
    pub marker_id: MarkerId,
    // core
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub angle: Option<f64>,
    pub rect_width: Option<f64>,
    pub rect_height: Option<f64>,
    pub core_locked: bool,
    // appearance
    pub icon_url: Option<String>,
    pub icon_size: Option<serde_json::Value>,
    pub icon_color: Option<String>,
    pub class_name: Option<String>,
    pub glyph: Option<String>,
    pub glyph_color: Option<String>,
    pub glyph_size: Option<String>,
    pub glyph_anchor: Option<serde_json::Value>,
    pub shadow_scale: Option<f64>,
    pub font_weight: Option<String>,
    pub appearance_locked: Option<bool>,
    // content
    pub name: Option<String>,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub info: Option<String>,
    pub booth_number: Option<String>,
    pub content_locked: Option<bool>,
    // assignment + company for the event year
    pub company_id: Option<DbId>,
    pub assigned_booth_number: Option<String>,
    pub company_name: Option<String>,
    pub company_logo: Option<String>,
    pub company_website: Option<String>,
    pub company_info: Option<String>,
}

impl MarkerRow {
    /// Assemble the in-memory marker.
    ///
    /// Booth markers take name/logo/website/info from the assigned company and
    /// the booth number from the assignment; special markers use their own
    /// content row. Lock flags of missing namespace rows read as `false`.
    pub fn into_marker(self) -> Marker {
        let mut marker = Marker::new(self.marker_id);
        let mut put = |field: MarkerField, value: Option<FieldValue>| {
            if let Some(value) = value {
                marker.fields.insert(field, value);
            }
        };

        put(MarkerField::Lat, self.lat.map(FieldValue::from));
        put(MarkerField::Lng, self.lng.map(FieldValue::from));
        put(MarkerField::Angle, self.angle.map(FieldValue::from));
        put(MarkerField::RectWidth, self.rect_width.map(FieldValue::from));
        put(MarkerField::RectHeight, self.rect_height.map(FieldValue::from));
        put(MarkerField::CoreLocked, Some(self.core_locked.into()));

        put(MarkerField::IconUrl, self.icon_url.map(FieldValue::from));
        put(MarkerField::IconSize, self.icon_size.and_then(json_value));
        put(MarkerField::IconColor, self.icon_color.map(FieldValue::from));
        put(MarkerField::ClassName, self.class_name.map(FieldValue::from));
        put(MarkerField::Glyph, self.glyph.map(FieldValue::from));
        put(MarkerField::GlyphColor, self.glyph_color.map(FieldValue::from));
        put(MarkerField::GlyphSize, self.glyph_size.map(FieldValue::from));
        put(MarkerField::GlyphAnchor, self.glyph_anchor.and_then(json_value));
        put(MarkerField::ShadowScale, self.shadow_scale.map(FieldValue::from));
        put(MarkerField::FontWeight, self.font_weight.map(FieldValue::from));
        put(
            MarkerField::AppearanceLocked,
            Some(self.appearance_locked.unwrap_or(false).into()),
        );

        let (name, logo, website, info, booth_number) = if is_booth_marker(self.marker_id) {
            (
                self.company_name,
                self.company_logo,
                self.company_website,
                self.company_info,
                self.assigned_booth_number,
            )
        } else {
            (
                self.name,
                self.logo,
                self.website,
                self.info,
                self.booth_number,
            )
        };
        put(MarkerField::Name, name.map(FieldValue::from));
        put(MarkerField::Logo, logo.map(FieldValue::from));
        put(MarkerField::Website, website.map(FieldValue::from));
        put(MarkerField::Info, info.map(FieldValue::from));
        put(MarkerField::BoothNumber, booth_number.map(FieldValue::from));
        put(
            MarkerField::ContentLocked,
            Some(self.content_locked.unwrap_or(false).into()),
        );

        marker
    }
}

fn json_value(json: serde_json::Value) -> Option<FieldValue> {
    serde_json::from_value(json).ok()
}
