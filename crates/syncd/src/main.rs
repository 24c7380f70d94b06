//! `expo-syncd` -- keeps an in-memory marker store in line with PostgreSQL.
//!
//! Loads the markers of one event year, then reloads them whenever the
//! database reports a change on the `marker_changes` channel. Failed field
//! writes and delete rollbacks are logged from the event bus.
//!
//! See [`config::SyncConfig::from_env`] for the environment variables read.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use expo_core::backend::MarkerBackend;
use expo_db::listener::MarkerChangeListener;
use expo_db::PgMarkerBackend;
use expo_events::{EventBus, MarkerEvent, MarkerEventKind};
use expo_sync::{MarkerFeed, MarkerStore};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::SyncConfig;

/// Buffered feed signals between the listener and the refresher.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// How long each background task gets to stop after shutdown starts.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expo_syncd=debug,expo_sync=debug,expo_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = SyncConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        event_year = config.event_year,
        max_connections = config.max_connections,
        history_limit = ?config.history_limit,
        "Loaded sync configuration"
    );

    // --- Database ---
    let pool = expo_db::create_pool(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    expo_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    expo_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Store ---
    let event_bus = Arc::new(EventBus::default());
    let backend: Arc<dyn MarkerBackend> = Arc::new(PgMarkerBackend::new(pool.clone()));
    let store = MarkerStore::new(
        backend,
        Arc::clone(&event_bus),
        config.event_year,
        config.history_limit,
    );

    // Spawn the event logger before the first snapshot so nothing is missed.
    let logger_handle = tokio::spawn(log_events(event_bus.subscribe()));

    let feed = MarkerFeed::new(store.clone());
    let count = feed
        .refresh()
        .await
        .context("Failed to load initial markers")?;
    tracing::info!(count, event_year = config.event_year, "Initial markers loaded");

    // --- Feed ---
    let cancel = CancellationToken::new();
    let (change_tx, change_rx) = mpsc::channel(CHANGE_CHANNEL_CAPACITY);

    let listener = MarkerChangeListener::new(pool.clone());
    let listener_cancel = cancel.clone();
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run(change_tx, listener_cancel).await {
            tracing::error!(error = %e, "Marker change listener failed to start");
        }
    });

    let feed_handle = tokio::spawn(feed.run(change_rx, cancel.clone()));
    tracing::info!("Marker feed started");

    shutdown_signal().await;

    // --- Shutdown ---
    cancel.cancel();
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, listener_handle).await;
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, feed_handle).await;
    tracing::info!("Marker feed stopped");

    // The store holds the last sender clone; dropping both closes the bus.
    drop(store);
    drop(event_bus);
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, logger_handle).await;

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Log failure events until the bus closes.
async fn log_events(mut rx: broadcast::Receiver<MarkerEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match event.kind {
                MarkerEventKind::FieldWriteFailed => tracing::warn!(
                    marker_id = ?event.marker_id,
                    field = ?event.field,
                    table = ?event.table,
                    error = ?event.error,
                    "Marker field write failed"
                ),
                MarkerEventKind::DeleteRolledBack => tracing::warn!(
                    marker_id = ?event.marker_id,
                    error = ?event.error,
                    "Marker delete rolled back"
                ),
                MarkerEventKind::SnapshotReplaced => {
                    tracing::debug!(count = ?event.count, "Marker snapshot replaced")
                }
                MarkerEventKind::FieldPersisted | MarkerEventKind::MarkerDeleted => {}
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event logger lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
