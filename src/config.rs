use std::path::PathBuf;
use std::time::Duration;

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::follow_up::DEFAULT_REFRESH_PERIOD;

/// Application-level constants
pub const APP_NAME: &str = "Careline";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_DATA_DIR: &str = "CARELINE_DATA_DIR";
pub const ENV_URGENCY_REFRESH_SECS: &str = "CARELINE_URGENCY_REFRESH_SECS";
pub const ENV_EVENT_CAPACITY: &str = "CARELINE_EVENT_CAPACITY";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,careline_lib=debug"
}

/// Get the application data directory
/// ~/Careline/ on all platforms, or ./Careline when no home directory exists.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the local store directory
pub fn store_dir() -> PathBuf {
    app_data_dir().join("store")
}

/// Runtime settings for opening a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Directory holding one JSON file per collection.
    pub data_dir: PathBuf,
    /// Period of the follow-up urgency refresher.
    pub urgency_refresh: Duration,
    /// Per-subscriber event channel capacity.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: store_dir(),
            urgency_refresh: DEFAULT_REFRESH_PERIOD,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `CARELINE_*` environment variables.
    /// Values that do not parse are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENV_URGENCY_REFRESH_SECS).filter(|s| *s > 0) {
            config.urgency_refresh = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, ENV_EVENT_CAPACITY).filter(|c| *c > 0) {
            config.event_capacity = capacity;
        }
        config
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {name}={raw:?}: not a valid number");
            None
        }
    }
}
