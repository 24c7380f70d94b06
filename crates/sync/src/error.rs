use expo_core::backend::BackendError;
use expo_core::marker::MarkerField;
use expo_core::types::{EventYear, MarkerId};

use crate::cascade::DeleteStep;

/// Errors from persisting or deleting markers.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A booth marker's company field was written but the marker has no
    /// assignment for the event year. Nothing was written.
    #[error("no assignment found for marker {marker_id} in {event_year}")]
    NoAssignment {
        marker_id: MarkerId,
        event_year: EventYear,
    },

    /// The assignment lookup itself failed.
    #[error("assignment lookup failed for marker {marker_id}: {source}")]
    Lookup {
        marker_id: MarkerId,
        #[source]
        source: BackendError,
    },

    /// The backend rejected a single-field write.
    #[error("write of {field} to {table} failed for marker {marker_id}: {source}")]
    Write {
        marker_id: MarkerId,
        field: MarkerField,
        table: &'static str,
        #[source]
        source: BackendError,
    },

    /// A step of the delete cascade failed; later steps were not attempted.
    #[error("delete of {step} failed for marker {marker_id}: {source}")]
    DeleteStep {
        marker_id: MarkerId,
        step: DeleteStep,
        #[source]
        source: BackendError,
    },

    /// A background write task panicked or was cancelled.
    #[error("write of {field} for marker {marker_id} did not complete: {message}")]
    TaskFailed {
        marker_id: MarkerId,
        field: MarkerField,
        message: String,
    },
}
