//! Configuration validation.
//!
//! File values are checked through [`validate_config`]; the effective values
//! after command-line overrides go through [`validate_pipeline_config`].

use crate::domain::correlation::DEFAULT_MIN_SAMPLES;
use crate::domain::error::MarketGraphError;
use crate::domain::graph::DEFAULT_MIN_CORRELATION;
use crate::domain::history::DEFAULT_WINDOW_MAX;
use crate::domain::pipeline::PipelineConfig;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MarketGraphError> {
    check_window_max(config.get_int("history", "window_max", DEFAULT_WINDOW_MAX as i64))?;
    check_min_samples(config.get_int("history", "min_samples", DEFAULT_MIN_SAMPLES as i64))?;
    check_min_correlation(config.get_double("graph", "min_correlation", DEFAULT_MIN_CORRELATION))?;
    validate_path(config, "history")?;
    validate_path(config, "graph")?;
    validate_path(config, "snapshot")?;
    Ok(())
}

pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), MarketGraphError> {
    check_window_max(i64::try_from(config.window_max).unwrap_or(i64::MAX))?;
    check_min_samples(i64::try_from(config.min_samples).unwrap_or(i64::MAX))?;
    check_min_correlation(config.min_correlation)?;
    Ok(())
}

fn check_window_max(value: i64) -> Result<(), MarketGraphError> {
    if value < 1 {
        return Err(MarketGraphError::ConfigInvalid {
            section: "history".to_string(),
            key: "window_max".to_string(),
            reason: "window_max must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn check_min_samples(value: i64) -> Result<(), MarketGraphError> {
    if value < 2 {
        return Err(MarketGraphError::ConfigInvalid {
            section: "history".to_string(),
            key: "min_samples".to_string(),
            reason: "min_samples must be at least 2".to_string(),
        });
    }
    Ok(())
}

fn check_min_correlation(value: f64) -> Result<(), MarketGraphError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MarketGraphError::ConfigInvalid {
            section: "graph".to_string(),
            key: "min_correlation".to_string(),
            reason: "min_correlation must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_path(config: &dyn ConfigPort, section: &str) -> Result<(), MarketGraphError> {
    match config.get_string(section, "path") {
        Some(s) if s.trim().is_empty() => Err(MarketGraphError::ConfigInvalid {
            section: section.to_string(),
            key: "path".to_string(),
            reason: "path must not be blank".to_string(),
        }),
        _ => Ok(()),
    }
}
