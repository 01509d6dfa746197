// src/config/validate.rs

use crate::config::model::{
    ConfigFile, ExecutorSection, ObserverSection, RawConfigFile, RetentionSection,
};
use crate::errors::{NodeflowError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::NodeflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.executor, raw.retention, raw.observer))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_executor(&cfg.executor)?;
    validate_retention(&cfg.retention)?;
    validate_observer(&cfg.observer)?;
    Ok(())
}

const MAX_BACKOFF_FACTOR: f64 = 10.0;

/// One hundred years.
const MAX_RETENTION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

fn config_error(msg: String) -> NodeflowError {
    NodeflowError::ConfigError(msg)
}

fn validate_executor(cfg: &ExecutorSection) -> Result<()> {
    if cfg.min_delay_ms > cfg.max_delay_ms {
        return Err(config_error(format!(
            "[executor].min_delay_ms ({}) must be <= max_delay_ms ({})",
            cfg.min_delay_ms, cfg.max_delay_ms
        )));
    }

    if !(0.0..=1.0).contains(&cfg.failure_rate) {
        return Err(config_error(format!(
            "[executor].failure_rate must be within 0.0..=1.0 (got {})",
            cfg.failure_rate
        )));
    }

    Ok(())
}

fn validate_retention(cfg: &RetentionSection) -> Result<()> {
    if !(1..=MAX_RETENTION_SECS).contains(&cfg.max_age_secs) {
        return Err(config_error(format!(
            "[retention].max_age_secs must be within 1..={MAX_RETENTION_SECS} (got {})",
            cfg.max_age_secs
        )));
    }
    if cfg.sweep_interval_secs == 0 {
        return Err(config_error(
            "[retention].sweep_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_observer(cfg: &ObserverSection) -> Result<()> {
    if cfg.initial_interval_ms == 0 {
        return Err(config_error(
            "[observer].initial_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.max_interval_ms < cfg.initial_interval_ms {
        return Err(config_error(format!(
            "[observer].max_interval_ms ({}) must be >= initial_interval_ms ({})",
            cfg.max_interval_ms, cfg.initial_interval_ms
        )));
    }

    // Also rejects NaN.
    if !(1.0..=MAX_BACKOFF_FACTOR).contains(&cfg.backoff_factor) {
        return Err(config_error(format!(
            "[observer].backoff_factor must be within 1.0..={MAX_BACKOFF_FACTOR} (got {})",
            cfg.backoff_factor
        )));
    }

    Ok(())
}
