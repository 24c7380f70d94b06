//! Assignment entity model and DTOs.
//!
//! An assignment places one company on one booth marker for one event year.

use expo_core::backend::AssignmentLink;
use expo_core::types::{DbId, EventYear, MarkerId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub id: DbId,
    pub marker_id: MarkerId,
    pub event_year: EventYear,
    pub company_id: DbId,
    pub booth_number: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Assignment> for AssignmentLink {
    fn from(row: Assignment) -> Self {
        Self {
            id: row.id,
            marker_id: row.marker_id,
            event_year: row.event_year,
            company_id: row.company_id,
        }
    }
}

/// DTO for creating a new assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssignment {
    pub marker_id: MarkerId,
    pub event_year: EventYear,
    pub company_id: DbId,
    pub booth_number: Option<String>,
}
