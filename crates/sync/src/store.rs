//! Marker state store.
//!
//! The store owns the in-memory marker collection and both history stacks.
//! Edits are merged synchronously and persisted field by field in spawned
//! tasks; a failed write never reverts the local value. Deletes are
//! optimistic too, but are rolled back if the remote cascade fails.
//!
//! [`MarkerStore::replace_all`] overwrites the collection wholesale. Local
//! edits whose writes have not landed yet are lost when that happens.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use expo_core::backend::MarkerBackend;
use expo_core::history::{CommandHistory, HistoryEntry};
use expo_core::marker::{Marker, MarkerField, MarkerPatch};
use expo_core::ownership::Namespace;
use expo_core::types::{EventYear, MarkerId};
use expo_events::{EventBus, MarkerEvent, MarkerEventKind};
use tokio::task::JoinHandle;

use crate::cascade::DeleteCascade;
use crate::error::SyncError;
use crate::router::PersistenceRouter;

// ---------------------------------------------------------------------------
// PendingWrites
// ---------------------------------------------------------------------------

/// Outcome of one background field write.
pub type WriteOutcome = (MarkerField, Result<(), SyncError>);

/// Handles to the background writes started by one `update_marker` call.
///
/// Dropping this detaches the writes; they still run to completion.
#[derive(Debug)]
pub struct PendingWrites {
    marker_id: MarkerId,
    handles: Vec<(MarkerField, JoinHandle<Result<(), SyncError>>)>,
}

impl PendingWrites {
    pub fn marker_id(&self) -> MarkerId {
        self.marker_id
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every write and collect the per-field outcomes.
    pub async fn settle(self) -> Vec<WriteOutcome> {
        let marker_id = self.marker_id;
        let (fields, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        let joined = futures::future::join_all(handles).await;

        fields
            .into_iter()
            .zip(joined)
            .map(|(field, result)| {
                let outcome = result.unwrap_or_else(|e| {
                    Err(SyncError::TaskFailed {
                        marker_id,
                        field,
                        message: e.to_string(),
                    })
                });
                (field, outcome)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// MarkerStore
// ---------------------------------------------------------------------------

struct StoreState {
    markers: Vec<Marker>,
    history: CommandHistory,
    event_year: EventYear,
}

struct Inner {
    state: Mutex<StoreState>,
    router: Arc<PersistenceRouter>,
    cascade: DeleteCascade,
    events: Arc<EventBus>,
}

/// The authoritative in-memory marker collection.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct MarkerStore {
    inner: Arc<Inner>,
}

impl MarkerStore {
    /// Create an empty store.
    ///
    /// `history_limit` caps the undo stack; `None` keeps it unbounded.
    pub fn new(
        backend: Arc<dyn MarkerBackend>,
        events: Arc<EventBus>,
        event_year: EventYear,
        history_limit: Option<usize>,
    ) -> Self {
        let router = Arc::new(PersistenceRouter::new(
            Arc::clone(&backend),
            Arc::clone(&events),
        ));
        let cascade = DeleteCascade::new(backend);

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState {
                    markers: Vec::new(),
                    history: CommandHistory::with_max_depth(history_limit),
                    event_year,
                }),
                router,
                cascade,
                events,
            }),
        }
    }

    // The lock is never held across an await and no code path panics while
    // holding it, so a poisoned lock still guards consistent state.
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn backend(&self) -> Arc<dyn MarkerBackend> {
        Arc::clone(self.inner.router.backend())
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.inner.events
    }

    // --- Reads ---

    /// Snapshot of the current collection, in collection order.
    pub fn markers(&self) -> Vec<Marker> {
        self.state().markers.clone()
    }

    pub fn marker(&self, id: MarkerId) -> Option<Marker> {
        self.state().markers.iter().find(|m| m.id == id).cloned()
    }

    pub fn event_year(&self) -> EventYear {
        self.state().event_year
    }

    /// Switch the event year used for subsequent writes.
    pub fn set_event_year(&self, event_year: EventYear) {
        self.state().event_year = event_year;
    }

    pub fn can_undo(&self) -> bool {
        self.state().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state().history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.state().history.undo_len()
    }

    pub fn redo_len(&self) -> usize {
        self.state().history.redo_len()
    }

    /// Most recently recorded history entry.
    pub fn last_entry(&self) -> Option<HistoryEntry> {
        self.state().history.last().cloned()
    }

    // --- Feed ---

    /// Overwrite the collection with an authoritative snapshot.
    /// History and redo stacks are kept.
    pub fn replace_all(&self, markers: Vec<Marker>) {
        let count = markers.len();
        self.state().markers = markers;
        tracing::debug!(count, "Replaced marker collection");
        self.inner
            .events
            .publish(MarkerEvent::new(MarkerEventKind::SnapshotReplaced).with_count(count));
    }

    // --- Mutations ---

    /// Apply `patch` to marker `id` and persist every field in the background.
    ///
    /// With `record_history`, the current values of the patched fields are
    /// recorded for undo and the redo stack is cleared. The local merge
    /// happens before this returns. An unknown `id` is neither merged nor
    /// recorded, but its fields are still persisted.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn update_marker(
        &self,
        id: MarkerId,
        patch: MarkerPatch,
        record_history: bool,
    ) -> PendingWrites {
        let event_year = {
            let mut state = self.state();
            Self::merge(&mut state, id, &patch, record_history);
            state.event_year
        };
        self.spawn_writes(id, patch, event_year)
    }

    /// Merge `patch` into marker `id` under the state lock.
    fn merge(state: &mut StoreState, id: MarkerId, patch: &MarkerPatch, record_history: bool) {
        match state.markers.iter_mut().find(|m| m.id == id) {
            Some(marker) => {
                if record_history {
                    state.history.record(HistoryEntry::capture(marker, patch));
                }
                marker.apply(patch);
            }
            None => {
                tracing::debug!(marker_id = id, "Marker not in collection, persisting only");
            }
        }
    }

    fn spawn_writes(&self, id: MarkerId, patch: MarkerPatch, event_year: EventYear) -> PendingWrites {
        let handles = patch
            .into_iter()
            .map(|(field, value)| {
                let router = Arc::clone(&self.inner.router);
                let handle = tokio::spawn(async move {
                    router.persist_field(id, field, value, event_year).await
                });
                (field, handle)
            })
            .collect();

        PendingWrites {
            marker_id: id,
            handles,
        }
    }

    /// Flip the lock flag of `namespace` on marker `id`.
    ///
    /// Unset locks count as unlocked, so the first toggle locks.
    pub fn toggle_lock(&self, id: MarkerId, namespace: Namespace) -> PendingWrites {
        let locked = self
            .marker(id)
            .map(|m| m.is_locked(namespace))
            .unwrap_or(false);
        let patch = MarkerPatch::new().with(namespace.lock_field(), !locked);
        self.update_marker(id, patch, true)
    }

    /// Revert the most recent recorded mutation.
    ///
    /// Returns `false` if there is nothing to undo. The stack move and the
    /// local merge happen in one critical section; the replayed writes are
    /// then awaited and their failures logged by the router.
    pub async fn undo(&self) -> bool {
        let replay = {
            let mut guard = self.state();
            let state = &mut *guard;
            state.history.pop_undo().map(|entry| {
                let id = entry.marker_id;
                let patch = entry.previous.clone();
                Self::merge(state, id, &patch, false);
                state.history.push_redo(entry);
                (id, patch, state.event_year)
            })
        };
        self.replay(replay).await
    }

    /// Re-apply the most recently undone mutation.
    ///
    /// Returns `false` if there is nothing to redo.
    pub async fn redo(&self) -> bool {
        let replay = {
            let mut guard = self.state();
            let state = &mut *guard;
            state.history.pop_redo().map(|entry| {
                let id = entry.marker_id;
                let patch = entry.next.clone();
                Self::merge(state, id, &patch, false);
                state.history.push_undo(entry);
                (id, patch, state.event_year)
            })
        };
        self.replay(replay).await
    }

    async fn replay(&self, replay: Option<(MarkerId, MarkerPatch, EventYear)>) -> bool {
        let Some((id, patch, event_year)) = replay else {
            return false;
        };
        self.spawn_writes(id, patch, event_year).settle().await;
        true
    }

    /// Remove marker `id` locally, then delete it remotely.
    ///
    /// The marker disappears from [`markers`](Self::markers) before the first
    /// backend call. If any cascade step fails, the collection is restored to
    /// its exact pre-delete state and the error is returned.
    pub async fn delete_marker(&self, id: MarkerId) -> Result<(), SyncError> {
        let snapshot = self.take_marker(id);

        match self.inner.cascade.delete_marker_remote(id).await {
            Ok(()) => {
                tracing::info!(marker_id = id, "Deleted marker");
                self.inner
                    .events
                    .publish(MarkerEvent::new(MarkerEventKind::MarkerDeleted).with_marker(id));
                Ok(())
            }
            Err(e) => {
                self.restore(snapshot);
                tracing::warn!(marker_id = id, error = %e, "Delete failed, restored markers");
                self.inner.events.publish(
                    MarkerEvent::new(MarkerEventKind::DeleteRolledBack)
                        .with_marker(id)
                        .with_error(&e),
                );
                Err(e)
            }
        }
    }

    /// Remove `id` and return the collection as it was before.
    fn take_marker(&self, id: MarkerId) -> Vec<Marker> {
        let mut state = self.state();
        let snapshot = state.markers.clone();
        state.markers.retain(|m| m.id != id);
        snapshot
    }

    fn restore(&self, snapshot: Vec<Marker>) {
        self.state().markers = snapshot;
    }
}
