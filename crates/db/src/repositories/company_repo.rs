//! Repository for the `companies` table.

use expo_core::marker::MarkerField;
use expo_core::types::DbId;
use sqlx::PgPool;

use crate::models::column_value::ColumnValue;
use crate::models::company::{Company, CreateCompany};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, logo, website, info, created_at, updated_at";

/// Provides operations on company profiles.
pub struct CompanyRepo;

impl CompanyRepo {
    /// Insert a new company, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCompany) -> Result<Company, sqlx::Error> {
        let query = format!(
            "INSERT INTO companies (name, logo, website, info) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(&input.name)
            .bind(&input.logo)
            .bind(&input.website)
            .bind(&input.info)
            .fetch_one(pool)
            .await
    }

    /// Find a company by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Company>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM companies WHERE id = $1");
        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set one column on a company. Returns the number of rows updated.
    pub async fn update_field(
        pool: &PgPool,
        id: DbId,
        field: MarkerField,
        value: ColumnValue,
    ) -> Result<u64, sqlx::Error> {
        let sql = format!("UPDATE companies SET {} = $2 WHERE id = $1", field.column());
        let query = sqlx::query(&sql).bind(id);
        let result = value.bind(query).execute(pool).await?;
        Ok(result.rows_affected())
    }
}
