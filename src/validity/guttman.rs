//! Guttman scalogram error counting
//!
//! In a perfect Guttman pattern a test-taker who answers an item correctly also
//! answers every easier item correctly. Each (correct, incorrect) pair where the
//! missed item is strictly easier (higher p-value) than the solved one is an
//! inversion. The share of inversions among all such pairs is the error rate.

use crate::config::GuttmanThresholds;
use crate::models::ResponseRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Guttman error-rate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuttmanInterpretation {
    #[default]
    Normal,
    ElevatedErrors,
    HighErrorsAberrant,
}

impl GuttmanInterpretation {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuttmanInterpretation::Normal => "normal",
            GuttmanInterpretation::ElevatedErrors => "elevated_errors",
            GuttmanInterpretation::HighErrorsAberrant => "high_errors_aberrant",
        }
    }
}

impl fmt::Display for GuttmanInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guttman outcome for one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuttmanResult {
    pub error_count: usize,
    /// `correct_count * incorrect_count`
    pub max_possible_errors: usize,
    /// Within [0, 1]
    pub error_rate: f64,
    pub interpretation: GuttmanInterpretation,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub details: String,
}

/// Guttman error counter with injected cut points.
#[derive(Debug, Clone, Default)]
pub struct GuttmanErrorCounter {
    thresholds: GuttmanThresholds,
}

impl GuttmanErrorCounter {
    pub fn new(thresholds: GuttmanThresholds) -> Self {
        GuttmanErrorCounter { thresholds }
    }

    pub fn thresholds(&self) -> &GuttmanThresholds {
        &self.thresholds
    }

    /// Map an error rate to its band. The aberrant check is strictly greater-than.
    pub fn interpret(&self, error_rate: f64) -> GuttmanInterpretation {
        if error_rate > self.thresholds.aberrant_error_rate {
            GuttmanInterpretation::HighErrorsAberrant
        } else if error_rate > self.thresholds.elevated_error_rate {
            GuttmanInterpretation::ElevatedErrors
        } else {
            GuttmanInterpretation::Normal
        }
    }

    /// Count scalogram inversions. Records without a finite p-value are discarded.
    pub fn count(&self, responses: &[ResponseRecord]) -> GuttmanResult {
        let mut correct_p = Vec::new();
        let mut incorrect_p = Vec::new();
        for response in responses {
            match response.valid_p_value() {
                Some(p) if response.is_correct => correct_p.push(p),
                Some(p) => incorrect_p.push(p),
                None => {}
            }
        }

        let discarded = responses.len() - correct_p.len() - incorrect_p.len();
        if discarded > 0 {
            log::warn!(
                "[Guttman] Discarding {} of {} responses without a usable p-value",
                discarded,
                responses.len()
            );
        }

        let correct_count = correct_p.len();
        let incorrect_count = incorrect_p.len();
        let max_possible_errors = correct_count * incorrect_count;

        if max_possible_errors == 0 {
            return GuttmanResult {
                correct_count,
                incorrect_count,
                details: format!(
                    "No correct/incorrect pairs to compare ({} correct, {} incorrect)",
                    correct_count, incorrect_count
                ),
                ..GuttmanResult::default()
            };
        }

        let error_count: usize = correct_p
            .iter()
            .map(|&solved| incorrect_p.iter().filter(|&&missed| missed > solved).count())
            .sum();

        let error_rate = (error_count as f64 / max_possible_errors as f64).clamp(0.0, 1.0);
        let interpretation = self.interpret(error_rate);

        log::debug!(
            "[Guttman] {} inversions of {} pairs (rate {:.3}) -> {}",
            error_count,
            max_possible_errors,
            error_rate,
            interpretation
        );

        GuttmanResult {
            error_count,
            max_possible_errors,
            error_rate,
            interpretation,
            correct_count,
            incorrect_count,
            details: format!(
                "{} of {} correct/incorrect pairs are difficulty inversions ({:.1}%)",
                error_count,
                max_possible_errors,
                error_rate * 100.0
            ),
        }
    }
}
