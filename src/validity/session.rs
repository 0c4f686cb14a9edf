//! Whole-session validity assessment.
//!
//! `SessionValidator` owns one instance of each analyzer plus the aggregator, all
//! built from a single [`ValidityConfig`]. The three analyzers share no state, so
//! `assess_session` runs them on scoped threads and joins before aggregating.

use super::aggregator::{ValidityAggregator, ValidityVerdict};
use super::guttman::{GuttmanErrorCounter, GuttmanResult};
use super::person_fit::{PersonFitAnalyzer, PersonFitResult};
use super::timing::{TimingPlausibilityAnalyzer, TimingResult};
use crate::config::ValidityConfig;
use crate::models::ResponseRecord;
use serde::{Deserialize, Serialize};
use std::thread;

/// Verdict together with the analyzer outputs it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub verdict: ValidityVerdict,
    pub person_fit: PersonFitResult,
    pub timing: TimingResult,
    pub guttman: GuttmanResult,
}

/// Runs all three detectors and the aggregator over a session's responses.
#[derive(Debug, Clone)]
pub struct SessionValidator {
    person_fit: PersonFitAnalyzer,
    timing: TimingPlausibilityAnalyzer,
    guttman: GuttmanErrorCounter,
    aggregator: ValidityAggregator,
}

impl SessionValidator {
    pub fn new(config: ValidityConfig) -> Self {
        let ValidityConfig {
            person_fit,
            timing,
            guttman,
            severity,
        } = config;

        SessionValidator {
            person_fit: PersonFitAnalyzer::new(person_fit),
            timing: TimingPlausibilityAnalyzer::new(timing),
            guttman: GuttmanErrorCounter::new(guttman),
            aggregator: ValidityAggregator::new(severity),
        }
    }

    pub fn person_fit_analyzer(&self) -> &PersonFitAnalyzer {
        &self.person_fit
    }

    pub fn timing_analyzer(&self) -> &TimingPlausibilityAnalyzer {
        &self.timing
    }

    pub fn guttman_counter(&self) -> &GuttmanErrorCounter {
        &self.guttman
    }

    pub fn aggregator(&self) -> &ValidityAggregator {
        &self.aggregator
    }

    /// Raw score used for person-fit: the number of correct responses.
    pub fn total_score(responses: &[ResponseRecord]) -> usize {
        responses.iter().filter(|r| r.is_correct).count()
    }

    /// Assess a session, running the analyzers concurrently.
    pub fn assess_session(&self, responses: &[ResponseRecord]) -> SessionReport {
        let total_score = Self::total_score(responses);

        let (person_fit, timing, guttman) = thread::scope(|scope| {
            let fit_handle = scope.spawn(|| self.person_fit.analyze(responses, total_score));
            let timing_handle = scope.spawn(|| self.timing.analyze(responses));
            let guttman = self.guttman.count(responses);

            let person_fit = fit_handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            let timing = timing_handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (person_fit, timing, guttman)
        });

        self.report(person_fit, timing, guttman)
    }

    /// Assess a session on the calling thread. Same result as `assess_session`.
    pub fn assess_session_sequential(&self, responses: &[ResponseRecord]) -> SessionReport {
        let total_score = Self::total_score(responses);
        let person_fit = self.person_fit.analyze(responses, total_score);
        let timing = self.timing.analyze(responses);
        let guttman = self.guttman.count(responses);
        self.report(person_fit, timing, guttman)
    }

    fn report(
        &self,
        person_fit: PersonFitResult,
        timing: TimingResult,
        guttman: GuttmanResult,
    ) -> SessionReport {
        let verdict = self.aggregator.assess(&person_fit, &timing, &guttman);
        SessionReport {
            verdict,
            person_fit,
            timing,
            guttman,
        }
    }
}
