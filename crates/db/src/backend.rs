//! [`MarkerBackend`] over PostgreSQL.

use async_trait::async_trait;
use expo_core::backend::{AssignmentLink, BackendError, MarkerBackend};
use expo_core::marker::{FieldValue, Marker, MarkerField};
use expo_core::ownership::Namespace;
use expo_core::types::{DbId, EventYear, MarkerId};

use crate::models::column_value::ColumnValue;
use crate::repositories::{AssignmentRepo, CompanyRepo, MarkerRepo, NamespaceRepo};
use crate::DbPool;

/// Marker backend issuing one statement per call through the repositories.
#[derive(Clone)]
pub struct PgMarkerBackend {
    pool: DbPool,
}

impl PgMarkerBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn db_error(err: sqlx::Error) -> BackendError {
    BackendError::Database(err.to_string())
}

#[async_trait]
impl MarkerBackend for PgMarkerBackend {
    async fn find_assignment(
        &self,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<Option<AssignmentLink>, BackendError> {
        let row = AssignmentRepo::find_for_marker(&self.pool, marker_id, event_year)
            .await
            .map_err(db_error)?;
        Ok(row.map(AssignmentLink::from))
    }

    async fn update_company_field(
        &self,
        company_id: DbId,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError> {
        let value = ColumnValue::for_field(field, value)?;
        let updated = CompanyRepo::update_field(&self.pool, company_id, field, value)
            .await
            .map_err(db_error)?;
        if updated == 0 {
            tracing::debug!(company_id, %field, "Company update matched no rows");
        }
        Ok(())
    }

    async fn update_assignment_field(
        &self,
        marker_id: MarkerId,
        event_year: EventYear,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError> {
        let value = ColumnValue::for_field(field, value)?;
        let updated =
            AssignmentRepo::update_field(&self.pool, marker_id, event_year, field, value)
                .await
                .map_err(db_error)?;
        if updated == 0 {
            tracing::debug!(marker_id, event_year, %field, "Assignment update matched no rows");
        }
        Ok(())
    }

    async fn ensure_namespace_row(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<(), BackendError> {
        let inserted = NamespaceRepo::ensure_row(&self.pool, namespace, marker_id, event_year)
            .await
            .map_err(db_error)?;
        if inserted {
            tracing::debug!(marker_id, table = namespace.table(), "Created missing namespace row");
        }
        Ok(())
    }

    async fn update_namespace_field(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
        field: MarkerField,
        value: &FieldValue,
    ) -> Result<(), BackendError> {
        let value = ColumnValue::for_field(field, value)?;
        NamespaceRepo::update_field(&self.pool, namespace, marker_id, field, value)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn delete_assignments(&self, marker_id: MarkerId) -> Result<u64, BackendError> {
        AssignmentRepo::delete_for_marker(&self.pool, marker_id)
            .await
            .map_err(db_error)
    }

    async fn delete_namespace_row(
        &self,
        namespace: Namespace,
        marker_id: MarkerId,
    ) -> Result<u64, BackendError> {
        NamespaceRepo::delete_row(&self.pool, namespace, marker_id)
            .await
            .map_err(db_error)
    }

    async fn load_markers(&self, event_year: EventYear) -> Result<Vec<Marker>, BackendError> {
        let rows = MarkerRepo::list_for_year(&self.pool, event_year)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(|row| row.into_marker()).collect())
    }
}
