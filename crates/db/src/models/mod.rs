//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts, where rows are created directly

pub mod assignment;
pub mod column_value;
pub mod company;
pub mod marker_row;
