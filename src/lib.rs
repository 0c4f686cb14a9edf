//! Session Validity Engine
//!
//! Decides whether a completed cognitive-test session can be trusted, using three
//! independent detectors whose outputs are combined into one severity-weighted
//! verdict.
//!
//! The crate is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Response records and shared enums
//! - **config**: Injectable thresholds and the expected-rate calibration table
//! - **validity**: Person-fit, timing, Guttman analyzers and the aggregator
//! - **review**: Audited reviewer overrides on top of engine verdicts
//! - **input**: Session response file loading
//! - **log_collector**: `log` backend used by the CLI
//!
//! ```ignore
//! let config = session_validity::config::loader::load_config_from_file(path)?;
//! let validator = SessionValidator::new(config);
//! let report = validator.assess_session(&responses);
//! println!("{}", report.verdict.validity_status);
//! ```

// Core foundational modules
pub mod error;
pub mod models;

pub mod config;
pub mod validity;

pub mod input;
pub mod log_collector;
pub mod review;

// Re-export the log crate for macro usage
pub use log;

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{ConfigError, InputError, Result, ValidityError};

pub use models::{Difficulty, ResponseRecord, ScorePercentile, Severity};

pub use config::{
    DifficultyRates, ExpectedRateTable, GuttmanThresholds, PersonFitConfig, SeverityWeights,
    TimingThresholds, ValidityConfig,
};

pub use validity::{
    FitFlag, FlagDetail, FlagKind, FlagSource, GuttmanErrorCounter, GuttmanInterpretation,
    GuttmanResult, PersonFitAnalyzer, PersonFitResult, SessionReport, SessionValidator, TimeFlag,
    TimingFlagKind, TimingPlausibilityAnalyzer, TimingResult, ValidityAggregator, ValidityStatus,
    ValidityVerdict,
};

pub use review::{ReviewedSession, ValidityOverride};

pub use log_collector::LogCollector;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
