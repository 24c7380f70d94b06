//! Feed refresher: reloads the authoritative marker set on change signals.
//!
//! Each received [`MarkerChange`] triggers one reload through
//! [`MarkerBackend::load_markers`] followed by [`MarkerStore::replace_all`].
//! Signals that pile up while a reload is running are coalesced into the
//! next one.
//!
//! [`MarkerBackend::load_markers`]: expo_core::backend::MarkerBackend::load_markers

use expo_core::backend::{BackendError, MarkerChange};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::store::MarkerStore;

/// Background service keeping a [`MarkerStore`] in line with the backend.
pub struct MarkerFeed {
    store: MarkerStore,
}

impl MarkerFeed {
    pub fn new(store: MarkerStore) -> Self {
        Self { store }
    }

    /// Load the markers for the store's event year and replace the
    /// collection. Returns the number of markers loaded.
    pub async fn refresh(&self) -> Result<usize, BackendError> {
        let event_year = self.store.event_year();
        let markers = self.store.backend().load_markers(event_year).await?;
        let count = markers.len();
        self.store.replace_all(markers);
        Ok(count)
    }

    /// Run until `cancel` fires or the change channel closes.
    pub async fn run(self, mut changes: mpsc::Receiver<MarkerChange>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Marker feed cancelled");
                    break;
                }
                received = changes.recv() => {
                    let Some(change) = received else {
                        tracing::info!("Marker change channel closed, feed stopping");
                        break;
                    };

                    let mut coalesced = 0usize;
                    while changes.try_recv().is_ok() {
                        coalesced += 1;
                    }
                    tracing::debug!(
                        table = %change.table,
                        marker_id = ?change.marker_id,
                        coalesced,
                        "Marker change received"
                    );

                    match self.refresh().await {
                        Ok(count) => tracing::debug!(count, "Marker feed refreshed"),
                        Err(e) => tracing::error!(error = %e, "Failed to reload markers"),
                    }
                }
            }
        }
    }
}
