//! Persistent engine configuration.
//!
//! Stores timeouts and budgets in `~/.swipehound/config.json`. Every field is
//! optional in the file; missing fields take their defaults, so an empty `{}`
//! is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use swipehound_core::config::EngineConfig;
//!
//! // Load (returns defaults if the file doesn't exist)
//! let config = EngineConfig::load();
//! println!("implicit wait: {:?}", config.implicit_timeout());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = ".swipehound";
const CONFIG_FILENAME: &str = "config.json";

fn default_implicit_timeout_secs() -> u64 {
    10
}

fn default_explicit_timeout_secs() -> u64 {
    20
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_swipe_attempts() -> u32 {
    20
}

/// Persistent swipehound configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The session's usual implicit wait. Restored whenever the current value
    /// cannot be read back before an override.
    #[serde(default = "default_implicit_timeout_secs")]
    pub implicit_timeout_secs: u64,

    /// Default timeout for explicit waits such as disappearance.
    #[serde(default = "default_explicit_timeout_secs")]
    pub explicit_timeout_secs: u64,

    /// Upper bound on any single remote call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Default attempt budget for swipe searches.
    #[serde(default = "default_swipe_attempts")]
    pub swipe_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            implicit_timeout_secs: default_implicit_timeout_secs(),
            explicit_timeout_secs: default_explicit_timeout_secs(),
            call_timeout_ms: default_call_timeout_ms(),
            swipe_attempts: default_swipe_attempts(),
        }
    }
}

/// Returns `~/.swipehound`, or `None` when there is no home directory.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR))
}

impl EngineConfig {
    /// Load config from `~/.swipehound/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        config_dir()
            .map(|dir| Self::load_from(dir.join(CONFIG_FILENAME)))
            .unwrap_or_default()
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        std::fs::read_to_string(path.as_ref())
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.swipehound/config.json`.
    pub fn save(&self) -> std::io::Result<()> {
        let dir = config_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "could not determine home directory")
        })?;
        std::fs::create_dir_all(&dir)?;
        self.save_to(dir.join(CONFIG_FILENAME))
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn implicit_timeout(&self) -> Duration {
        Duration::from_secs(self.implicit_timeout_secs)
    }

    pub fn explicit_timeout(&self) -> Duration {
        Duration::from_secs(self.explicit_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
