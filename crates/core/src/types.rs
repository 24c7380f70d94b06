/// Marker ids share the BIGINT key space of the backing tables.
pub type MarkerId = i64;

/// Primary keys of companies and assignments are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Exhibition edition, e.g. `2025`.
pub type EventYear = i32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
