//! Debounce configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! wait_ms = 250
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default quiet period (milliseconds)
pub const DEFAULT_WAIT_MS: u64 = 300;

/// Debounce configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period before a debounced call runs (default: 300)
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

impl DebounceConfig {
    /// Quiet period as a `Duration`
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse debounce config")
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read debounce config: {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            wait_ms: DEFAULT_WAIT_MS,
        }
    }
}

fn default_wait_ms() -> u64 {
    DEFAULT_WAIT_MS
}

/// Convert a numeric millisecond delay into a `Duration`
///
/// Negative, zero and NaN delays run as soon as possible, as host timers
/// treat them. Delays too large for a `Duration` saturate to `Duration::MAX`;
/// host timers differ here (some wrap oversized delays to 1ms), this crate
/// never fires them early.
pub fn wait_from_millis(millis: f64) -> Duration {
    if millis.is_nan() || millis <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX)
}
