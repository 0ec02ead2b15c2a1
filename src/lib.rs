pub mod appointment;
pub mod chat;
pub mod config;
pub mod db;
pub mod directory;
pub mod events;
pub mod family;
pub mod follow_up;
pub mod models;
pub mod notifications;
pub mod prescriptions;
pub mod profile;
pub mod schedule;

use std::sync::Arc;

use chrono::Local;
use tracing_subscriber::EnvFilter;

pub use db::{LocalStore, StorageError};
use events::StoreEvent;

/// Install the global tracing subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Open the local store from the environment and log a summary of what it holds.
pub fn run() -> Result<(), StorageError> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::StoreConfig::from_env();
    let store = LocalStore::open_with_config(&config)?;

    let profile = profile::load_profile(&store)?;
    let buckets = appointment::bucket_appointments(appointment::list_appointments(&store)?);
    let urgency = follow_up::refresh_urgency(&store, Local::now().naive_local())?;
    let unread = notifications::unread_count(&store)?;

    tracing::info!(
        patient = %profile.name,
        upcoming = buckets.upcoming.len(),
        completed = buckets.completed.len(),
        cancelled = buckets.cancelled.len(),
        overdue_follow_ups = urgency.overdue,
        due_soon_follow_ups = urgency.due_soon,
        unread_notifications = unread,
        "Store ready"
    );
    Ok(())
}

/// Long-running mode: keep the store open with the urgency refresher running
/// on the configured period, logging store events until Ctrl-C.
pub fn watch() -> Result<(), StorageError> {
    init_tracing();
    tracing::info!("{} watching v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::StoreConfig::from_env();
    let store = Arc::new(LocalStore::open_with_config(&config)?);
    let mut events = store.subscribe();
    let watcher = follow_up::UrgencyWatcher::from_config(store.clone(), &config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Some(StoreEvent::UrgencyRefreshed { overdue, due_soon }) => {
                        tracing::info!(overdue, due_soon, "Follow-up urgency refreshed");
                    }
                    Some(other) => tracing::debug!(event = ?other, "Store changed"),
                    None => break,
                },
            }
        }
    });

    watcher.shutdown();
    drop(watcher);
    tracing::info!("Stopped watching");
    Ok(())
}
