// Engine configuration.
//
// An `EngineConfig` is built once at startup and handed to the UCI front
// end, which passes it on to the search controller.

use log::warn;
use std::env;
use std::time::Duration;

pub const ENGINE_NAME: &str = "Hikarlsen";
pub const ENGINE_AUTHOR: &str = "Qamar et. al.";

/// Depth used by `go` without an explicit `depth` argument
pub const DEFAULT_DEPTH: u8 = 5;

/// Environment variable overriding [`EngineConfig::default_depth`]
pub const DEPTH_ENV: &str = "HIKARLSEN_DEPTH";
/// Environment variable overriding [`EngineConfig::stop_timeout`], in milliseconds
pub const STOP_TIMEOUT_ENV: &str = "HIKARLSEN_STOP_TIMEOUT_MS";

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reported in reply to `uci`
    pub name: String,
    pub author: String,
    /// Plies searched when `go` does not say otherwise
    pub default_depth: u8,
    /// How long a new `go`/`position` waits for the previous search to stop
    pub stop_timeout: Duration,
    /// How long `quit` waits for the running search before giving up on it
    pub quit_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: ENGINE_NAME.to_string(),
            author: ENGINE_AUTHOR.to_string(),
            default_depth: DEFAULT_DEPTH,
            stop_timeout: Duration::from_secs(1),
            quit_timeout: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    /// Defaults with overrides from the environment.
    ///
    /// Unparseable or out-of-range values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = env::var(DEPTH_ENV) {
            match value.trim().parse::<u8>() {
                Ok(depth) if depth > 0 => config.default_depth = depth,
                _ => warn!("ignoring {}={:?}: expected a depth of at least 1", DEPTH_ENV, value),
            }
        }

        if let Ok(value) = env::var(STOP_TIMEOUT_ENV) {
            match value.trim().parse::<u64>() {
                Ok(ms) => config.stop_timeout = Duration::from_millis(ms),
                Err(_) => warn!("ignoring {}={:?}: expected milliseconds", STOP_TIMEOUT_ENV, value),
            }
        }

        config
    }

    pub fn with_default_depth(mut self, depth: u8) -> Self {
        self.default_depth = depth;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn with_quit_timeout(mut self, timeout: Duration) -> Self {
        self.quit_timeout = timeout;
        self
    }
}
