//! Config validation.

use super::{
    GuttmanThresholds, PersonFitConfig, SeverityWeights, TimingThresholds, ValidityConfig,
};
use crate::error::ConfigError;

/// Validate every section of a configuration.
pub fn validate_config(config: &ValidityConfig) -> Result<(), ConfigError> {
    validate_person_fit(&config.person_fit)?;
    validate_timing(&config.timing)?;
    validate_guttman(&config.guttman)?;
    validate_severity(&config.severity)?;
    Ok(())
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ValidationFailed(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::ValidationFailed(format!(
            "{} must be a positive number of seconds, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Expected rates in [0, 1]; percentile cut points ordered; band and ratio in (0, 1].
pub fn validate_person_fit(config: &PersonFitConfig) -> Result<(), ConfigError> {
    for (percentile, difficulty, rate) in config.expected_rates.cells() {
        check_unit_interval(
            &format!("expected rate for {}/{}", percentile, difficulty),
            rate,
        )?;
    }

    check_unit_interval("low_percentile_max", config.low_percentile_max)?;
    check_unit_interval("high_percentile_min", config.high_percentile_min)?;
    if config.low_percentile_max > config.high_percentile_min {
        return Err(ConfigError::ValidationFailed(format!(
            "low_percentile_max ({}) must not exceed high_percentile_min ({})",
            config.low_percentile_max, config.high_percentile_min
        )));
    }

    for (name, value) in [
        ("deviation_band", config.deviation_band),
        ("aberrant_fit_ratio", config.aberrant_fit_ratio),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(ConfigError::ValidationFailed(format!(
                "{} must be within (0, 1], got {}",
                name, value
            )));
        }
    }

    Ok(())
}

/// Second thresholds positive, totals ordered, counts at least one.
pub fn validate_timing(config: &TimingThresholds) -> Result<(), ConfigError> {
    check_positive("rapid_response_secs", config.rapid_response_secs)?;
    check_positive("fast_hard_secs", config.fast_hard_secs)?;
    check_positive("extended_pause_secs", config.extended_pause_secs)?;
    check_positive("total_too_fast_secs", config.total_too_fast_secs)?;
    check_positive("total_excessive_secs", config.total_excessive_secs)?;

    if config.total_excessive_secs <= config.total_too_fast_secs {
        return Err(ConfigError::ValidationFailed(format!(
            "total_excessive_secs ({}) must be greater than total_too_fast_secs ({})",
            config.total_excessive_secs, config.total_too_fast_secs
        )));
    }

    for (name, count) in [
        ("rapid_count_small_session", config.rapid_count_small_session),
        ("rapid_count_default", config.rapid_count_default),
        ("fast_hard_min_count", config.fast_hard_min_count),
        ("extended_pause_min_count", config.extended_pause_min_count),
    ] {
        if count == 0 {
            return Err(ConfigError::ValidationFailed(format!(
                "{} must be at least 1",
                name
            )));
        }
    }

    Ok(())
}

/// Both rates in [0, 1], elevated not above aberrant.
pub fn validate_guttman(config: &GuttmanThresholds) -> Result<(), ConfigError> {
    check_unit_interval("elevated_error_rate", config.elevated_error_rate)?;
    check_unit_interval("aberrant_error_rate", config.aberrant_error_rate)?;
    if config.elevated_error_rate > config.aberrant_error_rate {
        return Err(ConfigError::ValidationFailed(format!(
            "elevated_error_rate ({}) must not exceed aberrant_error_rate ({})",
            config.elevated_error_rate, config.aberrant_error_rate
        )));
    }
    Ok(())
}

/// Status cut-offs ordered; confidence step non-negative.
pub fn validate_severity(config: &SeverityWeights) -> Result<(), ConfigError> {
    if config.suspect_threshold > config.invalid_threshold {
        return Err(ConfigError::ValidationFailed(format!(
            "suspect_threshold ({}) must not exceed invalid_threshold ({})",
            config.suspect_threshold, config.invalid_threshold
        )));
    }
    if !(config.confidence_step.is_finite() && config.confidence_step >= 0.0) {
        return Err(ConfigError::ValidationFailed(format!(
            "confidence_step must be a non-negative number, got {}",
            config.confidence_step
        )));
    }
    Ok(())
}
