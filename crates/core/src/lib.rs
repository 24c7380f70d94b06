//! Domain types shared by every marker sync crate.
//!
//! - [`marker`]: the marker model, its closed field catalogue, and patches.
//! - [`ownership`]: which backend entity owns a given field of a given marker.
//! - [`history`]: undo/redo stacks of field-level diffs.
//! - [`backend`]: the query/command interface a persistence backend implements.

pub mod backend;
pub mod error;
pub mod history;
pub mod marker;
pub mod ownership;
pub mod types;
