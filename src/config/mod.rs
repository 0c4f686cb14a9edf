//! Configuration for the validity engine.
//!
//! Every threshold the analyzers and the aggregator use lives in one immutable
//! [`ValidityConfig`], injected at construction time, so thresholds can be tuned
//! without touching decision logic.
//!
//! # Module Structure
//!
//! - `loader`: Reads and writes configuration files (TOML or JSON)
//! - `validator`: Range and ordering checks on a loaded configuration
//!
//! The expected-correct-rate table has no built-in default. It is calibration
//! data owned by the deployment and must always be supplied.

pub mod loader;
pub mod validator;

use crate::models::{Difficulty, ScorePercentile};
use serde::{Deserialize, Serialize};

/// Expected correct rate for each difficulty, for one ability band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRates {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl DifficultyRates {
    pub fn new(easy: f64, medium: f64, hard: f64) -> Self {
        DifficultyRates { easy, medium, hard }
    }

    pub fn get(&self, difficulty: Difficulty) -> f64 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Expected correct rate indexed by `(score percentile, difficulty)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRateTable {
    pub low: DifficultyRates,
    pub medium: DifficultyRates,
    pub high: DifficultyRates,
}

impl ExpectedRateTable {
    pub fn new(low: DifficultyRates, medium: DifficultyRates, high: DifficultyRates) -> Self {
        ExpectedRateTable { low, medium, high }
    }

    pub fn rates_for(&self, percentile: ScorePercentile) -> &DifficultyRates {
        match percentile {
            ScorePercentile::Low => &self.low,
            ScorePercentile::Medium => &self.medium,
            ScorePercentile::High => &self.high,
        }
    }

    pub fn rate(&self, percentile: ScorePercentile, difficulty: Difficulty) -> f64 {
        self.rates_for(percentile).get(difficulty)
    }

    /// All nine cells in `(percentile, difficulty, rate)` form.
    pub fn cells(&self) -> impl Iterator<Item = (ScorePercentile, Difficulty, f64)> + '_ {
        ScorePercentile::ALL.into_iter().flat_map(move |p| {
            Difficulty::ALL
                .into_iter()
                .map(move |d| (p, d, self.rate(p, d)))
        })
    }
}

fn default_low_percentile_max() -> f64 {
    0.40
}

fn default_high_percentile_min() -> f64 {
    0.70
}

fn default_deviation_band() -> f64 {
    0.30
}

fn default_aberrant_fit_ratio() -> f64 {
    0.25
}

/// Person-fit settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonFitConfig {
    /// Calibrated expected correct rates (required)
    pub expected_rates: ExpectedRateTable,
    /// Score ratios strictly below this are `low`
    #[serde(default = "default_low_percentile_max")]
    pub low_percentile_max: f64,
    /// Score ratios strictly above this are `high`
    #[serde(default = "default_high_percentile_min")]
    pub high_percentile_min: f64,
    /// Half-width of the expected performance band around each expected rate
    #[serde(default = "default_deviation_band")]
    pub deviation_band: f64,
    /// Fit ratios at or above this are aberrant
    #[serde(default = "default_aberrant_fit_ratio")]
    pub aberrant_fit_ratio: f64,
}

impl PersonFitConfig {
    pub fn new(expected_rates: ExpectedRateTable) -> Self {
        PersonFitConfig {
            expected_rates,
            low_percentile_max: default_low_percentile_max(),
            high_percentile_min: default_high_percentile_min(),
            deviation_band: default_deviation_band(),
            aberrant_fit_ratio: default_aberrant_fit_ratio(),
        }
    }
}

/// Response-time thresholds (all in seconds unless noted).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingThresholds {
    /// Responses strictly faster than this are rapid
    pub rapid_response_secs: f64,
    /// Sessions with fewer timed responses than this use the small-session count
    pub small_session_size: usize,
    /// Rapid responses needed to flag a small session
    pub rapid_count_small_session: usize,
    /// Rapid responses needed to flag any other session
    pub rapid_count_default: usize,
    /// Correct hard answers strictly faster than this are suspicious
    pub fast_hard_secs: f64,
    pub fast_hard_min_count: usize,
    /// Responses strictly slower than this are extended pauses
    pub extended_pause_secs: f64,
    pub extended_pause_min_count: usize,
    /// Session totals strictly below this are too fast
    pub total_too_fast_secs: f64,
    /// Session totals strictly above this are excessive
    pub total_excessive_secs: f64,
}

impl Default for TimingThresholds {
    fn default() -> Self {
        TimingThresholds {
            rapid_response_secs: 3.0,
            small_session_size: 5,
            rapid_count_small_session: 2,
            rapid_count_default: 3,
            fast_hard_secs: 10.0,
            fast_hard_min_count: 2,
            extended_pause_secs: 300.0,
            extended_pause_min_count: 1,
            total_too_fast_secs: 300.0,   // 5 minutes
            total_excessive_secs: 7200.0, // 2 hours
        }
    }
}

/// Guttman error-rate cut points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuttmanThresholds {
    /// Error rates strictly above this are at least elevated
    pub elevated_error_rate: f64,
    /// Error rates strictly above this are aberrant
    pub aberrant_error_rate: f64,
}

impl Default for GuttmanThresholds {
    fn default() -> Self {
        GuttmanThresholds {
            elevated_error_rate: 0.20,
            aberrant_error_rate: 0.30,
        }
    }
}

/// Severity points and status cut-offs used by the aggregator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub aberrant_person_fit: u32,
    /// Added once per high-severity timing flag
    pub high_timing_flag: u32,
    /// Added once per medium-severity timing flag
    pub medium_timing_flag: u32,
    pub high_guttman_errors: u32,
    pub elevated_guttman_errors: u32,
    /// Severity at or above this is `invalid`
    pub invalid_threshold: u32,
    /// Severity at or above this (and below invalid) is `suspect`
    pub suspect_threshold: u32,
    /// Confidence lost per severity point
    pub confidence_step: f64,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        SeverityWeights {
            aberrant_person_fit: 2,
            high_timing_flag: 2,
            medium_timing_flag: 0,
            high_guttman_errors: 2,
            elevated_guttman_errors: 1,
            invalid_threshold: 4,
            suspect_threshold: 2,
            confidence_step: 0.15,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidityConfig {
    pub person_fit: PersonFitConfig,
    #[serde(default)]
    pub timing: TimingThresholds,
    #[serde(default)]
    pub guttman: GuttmanThresholds,
    #[serde(default)]
    pub severity: SeverityWeights,
}

impl ValidityConfig {
    /// Configuration with the given calibration table and default thresholds.
    pub fn new(expected_rates: ExpectedRateTable) -> Self {
        ValidityConfig {
            person_fit: PersonFitConfig::new(expected_rates),
            timing: TimingThresholds::default(),
            guttman: GuttmanThresholds::default(),
            severity: SeverityWeights::default(),
        }
    }
}
