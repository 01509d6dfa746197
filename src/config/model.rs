// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::TransportErrorPolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [executor]
/// min_delay_ms = 3000
/// max_delay_ms = 5000
/// failure_rate = 0.1
///
/// [retention]
/// max_age_secs = 3600
/// sweep_interval_secs = 300
///
/// [observer]
/// initial_delay_ms = 500
/// initial_interval_ms = 1000
/// max_interval_ms = 5000
/// backoff_factor = 1.5
/// on_transport_error = "retry"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub executor: ExecutorSection,

    #[serde(default)]
    pub retention: RetentionSection,

    #[serde(default)]
    pub observer: ObserverSection,
}

/// Validated configuration. Obtain one via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub executor: ExecutorSection,
    pub retention: RetentionSection,
    pub observer: ObserverSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        executor: ExecutorSection,
        retention: RetentionSection,
        observer: ObserverSection,
    ) -> Self {
        Self {
            executor,
            retention,
            observer,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.executor, raw.retention, raw.observer)
    }
}

/// `[executor]` section: the simulated node executor.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Probability in `[0, 1]` that a prompted node fails.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
}

fn default_min_delay_ms() -> u64 {
    3000
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_failure_rate() -> f64 {
    0.1
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            failure_rate: default_failure_rate(),
        }
    }
}

impl ExecutorSection {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// `[retention]` section: age-based eviction of finished and stale runs.
#[derive(Debug, Clone, Deserialize)]
pub struct RetentionSection {
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_age_secs() -> u64 {
    60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RetentionSection {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// `[observer]` section: status polling with backoff.
#[derive(Debug, Clone, Deserialize)]
pub struct ObserverSection {
    /// Delay before the first poll.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Interval that the first backoff step multiplies.
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default)]
    pub on_transport_error: TransportErrorPolicy,
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_initial_interval_ms() -> u64 {
    1000
}

fn default_max_interval_ms() -> u64 {
    5000
}

fn default_backoff_factor() -> f64 {
    1.5
}

impl Default for ObserverSection {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            backoff_factor: default_backoff_factor(),
            on_transport_error: TransportErrorPolicy::default(),
        }
    }
}
