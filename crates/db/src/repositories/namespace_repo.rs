//! Repository for the marker namespace tables
//! (`marker_core`, `marker_appearance`, `marker_content`).
//!
//! Table and column names come from [`Namespace`] and [`MarkerField`], never
//! from caller-supplied strings.

use expo_core::marker::MarkerField;
use expo_core::ownership::Namespace;
use expo_core::types::{EventYear, MarkerId};
use sqlx::PgPool;

use crate::models::column_value::ColumnValue;

/// Single-row operations on the three namespace tables.
pub struct NamespaceRepo;

impl NamespaceRepo {
    /// Insert a default row (lock flag `false`) for `marker_id` unless one
    /// already exists. Returns `true` if a row was inserted.
    pub async fn ensure_row(
        pool: &PgPool,
        namespace: Namespace,
        marker_id: MarkerId,
        event_year: EventYear,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "INSERT INTO {table} (marker_id, event_year, {lock}) \
             VALUES ($1, $2, false) \
             ON CONFLICT (marker_id) DO NOTHING",
            table = namespace.table(),
            lock = namespace.lock_field().column(),
        );
        let result = sqlx::query(&sql)
            .bind(marker_id)
            .bind(event_year)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set one column on the row keyed by `marker_id`.
    /// Returns the number of rows updated.
    pub async fn update_field(
        pool: &PgPool,
        namespace: Namespace,
        marker_id: MarkerId,
        field: MarkerField,
        value: ColumnValue,
    ) -> Result<u64, sqlx::Error> {
        let sql = format!(
            "UPDATE {table} SET {column} = $2 WHERE marker_id = $1",
            table = namespace.table(),
            column = field.column(),
        );
        let query = sqlx::query(&sql).bind(marker_id);
        let result = value.bind(query).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete the row keyed by `marker_id`. Returns the number of rows removed.
    pub async fn delete_row(
        pool: &PgPool,
        namespace: Namespace,
        marker_id: MarkerId,
    ) -> Result<u64, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE marker_id = $1", namespace.table());
        let result = sqlx::query(&sql).bind(marker_id).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
