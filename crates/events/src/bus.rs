//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`MarkerEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the store, the
//! persistence router, and whoever wants to observe them.

use chrono::{DateTime, Utc};
use expo_core::marker::MarkerField;
use expo_core::types::MarkerId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// MarkerEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerEventKind {
    /// A single field write reached the backend.
    FieldPersisted,
    /// A single field write failed. The optimistic value stays in memory.
    FieldWriteFailed,
    /// The delete cascade completed for a marker.
    MarkerDeleted,
    /// The delete cascade failed and the local collection was restored.
    DeleteRolledBack,
    /// The in-memory collection was replaced by an authoritative snapshot.
    SnapshotReplaced,
}

impl MarkerEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FieldPersisted => "field_persisted",
            Self::FieldWriteFailed => "field_write_failed",
            Self::MarkerDeleted => "marker_deleted",
            Self::DeleteRolledBack => "delete_rolled_back",
            Self::SnapshotReplaced => "snapshot_replaced",
        }
    }
}

impl std::fmt::Display for MarkerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A marker sync event.
///
/// Constructed via [`MarkerEvent::new`] and enriched with the builder
/// methods [`with_marker`](MarkerEvent::with_marker),
/// [`with_field`](MarkerEvent::with_field),
/// [`with_table`](MarkerEvent::with_table), and
/// [`with_error`](MarkerEvent::with_error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerEvent {
    pub kind: MarkerEventKind,

    /// Marker the event concerns, if any.
    pub marker_id: Option<MarkerId>,

    /// Field the event concerns, for field writes.
    pub field: Option<MarkerField>,

    /// Backend table written to, for field writes.
    pub table: Option<String>,

    /// Rendered error for failure events.
    pub error: Option<String>,

    /// Number of markers, for snapshot events.
    pub count: Option<usize>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl MarkerEvent {
    /// Create a new event with only the required `kind`.
    pub fn new(kind: MarkerEventKind) -> Self {
        Self {
            kind,
            marker_id: None,
            field: None,
            table: None,
            error: None,
            count: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_marker(mut self, marker_id: MarkerId) -> Self {
        self.marker_id = Some(marker_id);
        self
    }

    pub fn with_field(mut self, field: MarkerField) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`MarkerEvent`].
///
/// # Usage
///
/// ```rust
/// use expo_events::bus::{EventBus, MarkerEvent, MarkerEventKind};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MarkerEvent::new(MarkerEventKind::SnapshotReplaced).with_count(3));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<MarkerEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: MarkerEvent) {
        // A send error only means there are no receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<MarkerEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
