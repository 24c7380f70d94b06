//! Field ownership map.
//!
//! Marker attributes are split over three namespace tables, but for booth
//! markers the content-like fields live on other entities entirely: the
//! booth number on the marker's [`Assignment`](OwnerTarget::AssignmentField)
//! for the event year, and name/logo/website/info on the assigned company.
//! [`resolve_owner`] is the single place that decides which entity owns a
//! field of a given marker.

use serde::{Deserialize, Serialize};

use crate::marker::{FieldValue, MarkerField};
use crate::types::MarkerId;

/// Markers with an id below this are booth markers; the rest are special markers.
pub const BOOTH_MARKER_ID_LIMIT: MarkerId = 1000;

/// Table holding marker-to-company links per event year.
pub const ASSIGNMENTS_TABLE: &str = "assignments";

/// Table holding company profiles.
pub const COMPANIES_TABLE: &str = "companies";

/// Returns `true` for booth markers (`id < 1000`).
pub fn is_booth_marker(id: MarkerId) -> bool {
    id < BOOTH_MARKER_ID_LIMIT
}

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// A lockable partition of marker fields with its own backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Core,
    Appearance,
    Content,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Self::Core, Self::Appearance, Self::Content];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Appearance => "appearance",
            Self::Content => "content",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Core => "marker_core",
            Self::Appearance => "marker_appearance",
            Self::Content => "marker_content",
        }
    }

    pub fn lock_field(&self) -> MarkerField {
        match self {
            Self::Core => MarkerField::CoreLocked,
            Self::Appearance => MarkerField::AppearanceLocked,
            Self::Content => MarkerField::ContentLocked,
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static field → namespace map.
pub fn namespace_of(field: MarkerField) -> Namespace {
    use MarkerField::*;
    match field {
        Lat | Lng | Angle | RectWidth | RectHeight | CoreLocked => Namespace::Core,
        IconUrl | IconSize | IconColor | ClassName | Glyph | GlyphColor | GlyphSize
        | GlyphAnchor | ShadowScale | FontWeight | AppearanceLocked => Namespace::Appearance,
        Name | Logo | Website | Info | BoothNumber | ContentLocked => Namespace::Content,
    }
}

/// Fields a booth marker reads from its assigned company.
pub fn is_company_field(field: MarkerField) -> bool {
    matches!(
        field,
        MarkerField::Name | MarkerField::Logo | MarkerField::Website | MarkerField::Info
    )
}

/// Fields a booth marker reads from its assignment.
pub fn is_assignment_field(field: MarkerField) -> bool {
    field == MarkerField::BoothNumber
}

// ---------------------------------------------------------------------------
// OwnerTarget
// ---------------------------------------------------------------------------

/// The backend entity that owns a field of a particular marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerTarget {
    CoreTable,
    AppearanceTable,
    ContentTable,
    /// Column on the marker's assignment for the event year.
    AssignmentField,
    /// Column on the company reached through the marker's assignment.
    CompanyField,
}

impl OwnerTarget {
    pub fn from_namespace(namespace: Namespace) -> Self {
        match namespace {
            Namespace::Core => Self::CoreTable,
            Namespace::Appearance => Self::AppearanceTable,
            Namespace::Content => Self::ContentTable,
        }
    }

    /// The namespace table this target writes to, if it is one.
    pub fn namespace(&self) -> Option<Namespace> {
        match self {
            Self::CoreTable => Some(Namespace::Core),
            Self::AppearanceTable => Some(Namespace::Appearance),
            Self::ContentTable => Some(Namespace::Content),
            Self::AssignmentField | Self::CompanyField => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::CoreTable => Namespace::Core.table(),
            Self::AppearanceTable => Namespace::Appearance.table(),
            Self::ContentTable => Namespace::Content.table(),
            Self::AssignmentField => ASSIGNMENTS_TABLE,
            Self::CompanyField => COMPANIES_TABLE,
        }
    }
}

/// Decide which entity owns `field` for the marker `marker_id`.
///
/// Rules, first match wins:
/// 1. booth marker, company field → [`OwnerTarget::CompanyField`]
/// 2. booth marker, booth number → [`OwnerTarget::AssignmentField`]
/// 3. special marker, company or booth-number field → [`OwnerTarget::ContentTable`]
/// 4. anything else → the field's namespace table
pub fn resolve_owner(marker_id: MarkerId, field: MarkerField) -> OwnerTarget {
    let booth = is_booth_marker(marker_id);
    let content_like = is_company_field(field) || is_assignment_field(field);

    if booth && is_company_field(field) {
        OwnerTarget::CompanyField
    } else if booth && is_assignment_field(field) {
        OwnerTarget::AssignmentField
    } else if !booth && content_like {
        OwnerTarget::ContentTable
    } else {
        OwnerTarget::from_namespace(namespace_of(field))
    }
}

/// Normalize a value before it is written.
///
/// Lock flags are passed through untouched. Every other field turns blank
/// values (empty string, empty list, null) into an explicit null.
pub fn normalize_value(field: MarkerField, value: FieldValue) -> FieldValue {
    if field.is_lock() {
        value
    } else if value.is_blank() {
        FieldValue::Null
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
