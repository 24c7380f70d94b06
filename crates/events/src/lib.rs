//! Marker sync event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MarkerEvent`]: what happened to which marker, field, and table.
//!
//! Persistence outcomes are fire-and-forget from the store's point of view;
//! subscribing to the bus is how a consuming layer learns that a field write
//! failed.

pub mod bus;

pub use bus::{EventBus, MarkerEvent, MarkerEventKind};
