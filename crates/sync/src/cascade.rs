//! Ordered delete of a marker and its dependent rows.
//!
//! The backend has no referential cascade, so children go first:
//! assignments, then appearance, content, and finally the core row. The first
//! failing step aborts the rest. Steps already done are not compensated.

use std::fmt;
use std::sync::Arc;

use expo_core::backend::{BackendError, MarkerBackend};
use expo_core::ownership::{Namespace, ASSIGNMENTS_TABLE};
use expo_core::types::MarkerId;

use crate::error::SyncError;

/// One step of the delete cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStep {
    Assignments,
    Appearance,
    Content,
    Core,
}

impl DeleteStep {
    /// Execution order.
    pub const ORDER: [DeleteStep; 4] = [
        Self::Assignments,
        Self::Appearance,
        Self::Content,
        Self::Core,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Assignments => ASSIGNMENTS_TABLE,
            Self::Appearance => Namespace::Appearance.table(),
            Self::Content => Namespace::Content.table(),
            Self::Core => Namespace::Core.table(),
        }
    }
}

impl fmt::Display for DeleteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Runs the delete cascade against a backend.
pub struct DeleteCascade {
    backend: Arc<dyn MarkerBackend>,
}

impl DeleteCascade {
    pub fn new(backend: Arc<dyn MarkerBackend>) -> Self {
        Self { backend }
    }

    /// Delete `marker_id` everywhere, stopping at the first failing step.
    pub async fn delete_marker_remote(&self, marker_id: MarkerId) -> Result<(), SyncError> {
        for step in DeleteStep::ORDER {
            match self.run_step(step, marker_id).await {
                Ok(removed) => {
                    tracing::debug!(marker_id, step = %step, removed, "Delete step completed");
                }
                Err(source) => {
                    tracing::error!(
                        marker_id,
                        step = %step,
                        error = %source,
                        "Delete step failed, aborting cascade"
                    );
                    return Err(SyncError::DeleteStep {
                        marker_id,
                        step,
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    async fn run_step(&self, step: DeleteStep, marker_id: MarkerId) -> Result<u64, BackendError> {
        match step {
            DeleteStep::Assignments => self.backend.delete_assignments(marker_id).await,
            DeleteStep::Appearance => {
                self.backend
                    .delete_namespace_row(Namespace::Appearance, marker_id)
                    .await
            }
            DeleteStep::Content => {
                self.backend
                    .delete_namespace_row(Namespace::Content, marker_id)
                    .await
            }
            DeleteStep::Core => {
                self.backend
                    .delete_namespace_row(Namespace::Core, marker_id)
                    .await
            }
        }
    }
}
