//! `LISTEN/NOTIFY` adapter for the marker change feed.
//!
//! The schema's triggers publish a small JSON payload on
//! [`MARKER_CHANGES_CHANNEL`] for every insert, update, or delete on the
//! marker, assignment, and company tables. [`MarkerChangeListener`] forwards
//! each notification as a [`MarkerChange`] into an mpsc channel.

use std::time::Duration;

use expo_core::backend::MarkerChange;
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::DbPool;

/// Channel name used by the bundled notification triggers.
pub const MARKER_CHANGES_CHANNEL: &str = "marker_changes";

/// Pause after a failed receive before `PgListener` reconnects.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Background task forwarding database notifications.
pub struct MarkerChangeListener {
    pool: DbPool,
}

impl MarkerChangeListener {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Listen until `cancel` fires or the receiving side of `sender` is dropped.
    ///
    /// Connection errors while receiving are logged; `PgListener` reconnects
    /// on the next `recv`. Only failing to set up the listener is returned.
    pub async fn run(
        self,
        sender: mpsc::Sender<MarkerChange>,
        cancel: CancellationToken,
    ) -> Result<(), sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(MARKER_CHANGES_CHANNEL).await?;
        tracing::info!(channel = MARKER_CHANGES_CHANNEL, "Listening for marker changes");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Marker change listener cancelled");
                    break;
                }
                received = listener.recv() => match received {
                    Ok(notification) => {
                        let change = parse_payload(notification.payload());
                        if sender.send(change).await.is_err() {
                            tracing::info!("Marker change receiver dropped, listener stopping");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Marker change listener receive failed");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Parse a trigger payload. Malformed payloads still count as a change.
pub fn parse_payload(payload: &str) -> MarkerChange {
    serde_json::from_str(payload).unwrap_or_else(|e| {
        tracing::warn!(error = %e, payload, "Unparseable marker change payload");
        MarkerChange::default()
    })
}
