//! Repository for the `assignments` table.

use expo_core::marker::MarkerField;
use expo_core::types::{EventYear, MarkerId};
use sqlx::PgPool;

use crate::models::assignment::{Assignment, CreateAssignment};
use crate::models::column_value::ColumnValue;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, marker_id, event_year, company_id, booth_number, created_at, updated_at";

/// Provides operations on marker-to-company assignments.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Insert a new assignment, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAssignment,
    ) -> Result<Assignment, sqlx::Error> {
        let query = format!(
            "INSERT INTO assignments (marker_id, event_year, company_id, booth_number) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(input.marker_id)
            .bind(input.event_year)
            .bind(input.company_id)
            .bind(&input.booth_number)
            .fetch_one(pool)
            .await
    }

    /// Find the assignment of a marker for one event year.
    pub async fn find_for_marker(
        pool: &PgPool,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assignments WHERE marker_id = $1 AND event_year = $2"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(marker_id)
            .bind(event_year)
            .fetch_optional(pool)
            .await
    }

    /// Set one column on the assignment for `(marker_id, event_year)`.
    /// Returns the number of rows updated.
    pub async fn update_field(
        pool: &PgPool,
        marker_id: MarkerId,
        event_year: EventYear,
        field: MarkerField,
        value: ColumnValue,
    ) -> Result<u64, sqlx::Error> {
        let sql = format!(
            "UPDATE assignments SET {} = $3 WHERE marker_id = $1 AND event_year = $2",
            field.column()
        );
        let query = sqlx::query(&sql).bind(marker_id).bind(event_year);
        let result = value.bind(query).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete every assignment of a marker, across all event years.
    pub async fn delete_for_marker(pool: &PgPool, marker_id: MarkerId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assignments WHERE marker_id = $1")
            .bind(marker_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
