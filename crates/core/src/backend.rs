//! Query/command interface to the relational store behind the markers.
//!
//! The persistence router and the delete cascade only talk to the backend
//! through [`MarkerBackend`], so the same routing logic runs against
//! PostgreSQL in production and against in-memory doubles in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::marker::{FieldValue, Marker, MarkerField};
use crate::ownership::Namespace;
use crate::types::{DbId, EventYear, MarkerId};

/// Errors reported by a [`MarkerBackend`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Type mismatch for column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

/// The link between a marker and a company for one event year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentLink {
    pub id: DbId,
    pub marker_id: MarkerId,
    pub event_year: EventYear,
    pub company_id: DbId,
}

/// Backend operations used by the persistence router and delete cascade.
///
/// Every method is a single statement against one table. Nothing here is
/// transactional across calls.
#[async_trait]
pub trait MarkerBackend: Send + Sync {
    /// Find the assignment of `marker_id` for `event_year`.
    async fn find_assignment(
        &self,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<Option<AssignmentLink>, BackendError>;

    /// Set one column of a company row.
    async fn update_company_field(
        &self,
        company_id: DbId,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError>;

    /// Set one column of the assignment row for `(marker_id, event_year)`.
    async fn update_assignment_field(
        &self,
        marker_id: MarkerId,
        event_year: EventYear,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError>;

    /// Insert a default row for `marker_id` into the namespace table if none
    /// exists. Existing rows are left untouched.
    async fn ensure_namespace_row(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<(), BackendError>;

    /// Set one column of the namespace row keyed by `marker_id`.
    async fn update_namespace_field(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError>;

    /// Delete every assignment referencing `marker_id`. Returns rows removed.
    async fn delete_assignments(&self, marker_id: MarkerId) -> Result<u64, BackendError>;

    /// Delete the namespace row for `marker_id`. Returns rows removed.
    async fn delete_namespace_row(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
    ) -> Result<u64, BackendError>;

    /// Load the authoritative marker set as seen for `event_year`.
    async fn load_markers(&self, event_year: EventYear) -> Result<Vec<Marker>, BackendError>;
}

/// Notification that the authoritative marker set changed.
///
/// `marker_id` is absent for changes that may affect several markers at once,
/// such as a company rename.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MarkerChange {
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub marker_id: Option<MarkerId>,
}
