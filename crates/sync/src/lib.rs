//! Marker state and synchronization engine.
//!
//! [`MarkerStore`] holds the in-memory markers, applies edits optimistically,
//! and keeps an undo/redo history of field-level diffs. Every changed field is
//! handed to the [`PersistenceRouter`], which decides which backend entity
//! owns it and writes it in the background. Deletes run through the
//! [`DeleteCascade`] and are rolled back locally if any step fails.
//! [`MarkerFeed`] keeps the store in line with the authoritative backend
//! state.

pub mod cascade;
pub mod error;
pub mod feed;
pub mod router;
pub mod store;

pub use cascade::{DeleteCascade, DeleteStep};
pub use error::SyncError;
pub use feed::MarkerFeed;
pub use router::PersistenceRouter;
pub use store::{MarkerStore, PendingWrites};
