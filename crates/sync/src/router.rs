//! Persistence router: one field of one marker to the entity that owns it.
//!
//! The target comes from [`resolve_owner`]. Writes to namespace tables are
//! preceded by a best-effort ensure-row, because a marker may be edited
//! before all three of its namespace rows exist.

use std::sync::Arc;

use expo_core::backend::{BackendError, MarkerBackend};
use expo_core::marker::{FieldValue, MarkerField};
use expo_core::ownership::{normalize_value, resolve_owner, Namespace, OwnerTarget};
use expo_core::types::{EventYear, MarkerId};
use expo_events::{EventBus, MarkerEvent, MarkerEventKind};

use crate::error::SyncError;

/// Routes single-field writes to the owning backend entity.
pub struct PersistenceRouter {
    backend: Arc<dyn MarkerBackend>,
    events: Arc<EventBus>,
}

impl PersistenceRouter {
    pub fn new(backend: Arc<dyn MarkerBackend>, events: Arc<EventBus>) -> Self {
        Self { backend, events }
    }

    pub fn backend(&self) -> &Arc<dyn MarkerBackend> {
        &self.backend
    }

    /// Persist one field of one marker for `event_year`.
    ///
    /// The value is normalized first (blank → null, lock flags untouched).
    /// Errors are logged, published as [`MarkerEventKind::FieldWriteFailed`],
    /// and returned.
    pub async fn persist_field(
        &self,
        marker_id: MarkerId,
        field: MarkerField,
        value: FieldValue,
        event_year: EventYear,
    ) -> Result<(), SyncError> {
        let value = normalize_value(field, value);
        let target = resolve_owner(marker_id, field);

        let result = self.write(target, marker_id, field, &value, event_year).await;

        match &result {
            Ok(()) => {
                tracing::debug!(
                    marker_id,
                    field = %field,
                    table = target.table(),
                    "Persisted marker field"
                );
                self.events.publish(
                    MarkerEvent::new(MarkerEventKind::FieldPersisted)
                        .with_marker(marker_id)
                        .with_field(field)
                        .with_table(target.table()),
                );
            }
            Err(e) => {
                tracing::error!(
                    marker_id,
                    field = %field,
                    table = target.table(),
                    error = %e,
                    "Failed to persist marker field"
                );
                self.events.publish(
                    MarkerEvent::new(MarkerEventKind::FieldWriteFailed)
                        .with_marker(marker_id)
                        .with_field(field)
                        .with_table(target.table())
                        .with_error(e),
                );
            }
        }

        result
    }

    async fn write(
        &self,
        target: OwnerTarget,
        marker_id: MarkerId,
        field: MarkerField,
        value: &FieldValue,
        event_year: EventYear,
    ) -> Result<(), SyncError> {
        let write_error = |source: BackendError| SyncError::Write {
            marker_id,
            field,
            table: target.table(),
            source,
        };

        match target {
            OwnerTarget::CompanyField => {
                let assignment = self
                    .backend
                    .find_assignment(marker_id, event_year)
                    .await
                    .map_err(|source| SyncError::Lookup { marker_id, source })?
                    .ok_or(SyncError::NoAssignment {
                        marker_id,
                        event_year,
                    })?;

                self.backend
                    .update_company_field(assignment.company_id, field, value)
                    .await
                    .map_err(write_error)
            }
            OwnerTarget::AssignmentField => self
                .backend
                .update_assignment_field(marker_id, event_year, field, value)
                .await
                .map_err(write_error),
            OwnerTarget::CoreTable | OwnerTarget::AppearanceTable | OwnerTarget::ContentTable => {
                let namespace = target.namespace().unwrap_or(Namespace::Core);
                self.ensure_row(namespace, marker_id, event_year).await;

                self.backend
                    .update_namespace_field(namespace, marker_id, field, value)
                    .await
                    .map_err(write_error)
            }
        }
    }

    /// Best-effort row materialization. Failures are logged and swallowed.
    async fn ensure_row(&self, namespace: Namespace, marker_id: MarkerId, event_year: EventYear) {
        if let Err(e) = self
            .backend
            .ensure_namespace_row(namespace, marker_id, event_year)
            .await
        {
            tracing::warn!(
                marker_id,
                table = namespace.table(),
                error = %e,
                "Failed to ensure namespace row, attempting update anyway"
            );
        }
    }
}
