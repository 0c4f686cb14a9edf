//! Session Validity Detection Engine
//!
//! Decides whether a completed test session's responses can be trusted for scoring
//! and population statistics.
//!
//! ## Architecture
//! - **PersonFit**: answer pattern by difficulty vs. the band expected for the score
//! - **Timing**: per-item and whole-session response time plausibility
//! - **Guttman**: inversions of the empirical difficulty ordering
//! - **Aggregator**: integer severity points → status, confidence and flags
//! - **Session**: runs the three detectors (concurrently) and the aggregator
//!
//! Every component is a pure function of its inputs and configuration.

pub mod aggregator;
pub mod guttman;
pub mod person_fit;
pub mod session;
pub mod timing;

pub use aggregator::{
    FlagDetail, FlagKind, FlagSource, ValidityAggregator, ValidityComponents, ValidityStatus,
    ValidityVerdict,
};
pub use guttman::{GuttmanErrorCounter, GuttmanInterpretation, GuttmanResult};
pub use person_fit::{DifficultyBreakdown, FitFlag, PersonFitAnalyzer, PersonFitResult};
pub use session::{SessionReport, SessionValidator};
pub use timing::{
    TimeFlag, TimingFlagKind, TimingPlausibilityAnalyzer, TimingResult, TimingStatistics,
};
