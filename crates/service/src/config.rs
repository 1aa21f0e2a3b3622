//! Message bus configuration.

use std::time::Duration;

/// Tuning knobs for the message bus.
///
/// Reads from environment variables:
/// - `BUS_MAX_RETRIES` — attempts per event handler (default: `3`)
/// - `BUS_BASE_BACKOFF_MS` — first retry delay, doubled per attempt
///   (default: `100`)
/// - `BUS_MAX_MESSAGES` — messages one dispatch may process before the
///   cascade is considered runaway (default: `256`)
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_messages: usize,
}

impl BusConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: std::env::var("BUS_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            base_backoff: std::env::var("BUS_BASE_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_backoff),
            max_messages: std::env::var("BUS_MAX_MESSAGES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_messages),
        }
    }

    /// A configuration with near-zero backoff, for tests exercising the
    /// retry path.
    pub fn fast() -> Self {
        Self {
            base_backoff: Duration::from_millis(1),
            ..Self::default()
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
            max_messages: 256,
        }
    }
}
