//! Company entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use expo_core::types::{DbId, Timestamp};

/// A row from the `companies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Company {
    pub id: DbId,
    pub name: String,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub info: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new company.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub logo: Option<String>,
    pub website: Option<String>,
    pub info: Option<String>,
}
