//! Person-fit analysis
//!
//! Compares how often a test-taker answered each difficulty level correctly with
//! the rate expected for someone of their overall score band. Large deviations in
//! either direction (unexpected successes on hard items, unexpected misses on easy
//! ones) make the answer pattern inconsistent with the total score.
//!
//! ## Algorithm
//! 1. `score_ratio = total_score / responses` picks the band (low / medium / high)
//! 2. Responses are bucketed by difficulty label
//! 3. Per bucket, `deviation = actual_rate - expected_rate`
//! 4. Deviations outside `±deviation_band` add `round(|deviation| * bucket_total)`
//!    unexpected responses
//! 5. `fit_ratio = unexpected / total_responses`; aberrant when `>= aberrant_fit_ratio`

use crate::config::PersonFitConfig;
use crate::models::{Difficulty, ResponseRecord, ScorePercentile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Person-fit classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitFlag {
    #[default]
    Normal,
    Aberrant,
}

impl FitFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitFlag::Normal => "normal",
            FitFlag::Aberrant => "aberrant",
        }
    }
}

impl fmt::Display for FitFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-difficulty tally.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub correct: usize,
    pub total: usize,
    /// Expected correct rate for the session's score band
    pub expected_rate: f64,
}

impl DifficultyBreakdown {
    /// Observed correct rate, `None` for an empty bucket.
    pub fn actual_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }
}

/// Person-fit outcome for one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonFitResult {
    /// Share of responses that deviate from expectation, within [0, 1]
    pub fit_ratio: f64,
    pub fit_flag: FitFlag,
    pub unexpected_correct: usize,
    pub unexpected_incorrect: usize,
    /// All responses, including those with unknown difficulty labels
    pub total_responses: usize,
    pub score_percentile: ScorePercentile,
    pub by_difficulty: BTreeMap<Difficulty, DifficultyBreakdown>,
    pub details: String,
}

impl PersonFitResult {
    pub fn is_aberrant(&self) -> bool {
        self.fit_flag == FitFlag::Aberrant
    }

    pub fn unexpected_total(&self) -> usize {
        self.unexpected_correct + self.unexpected_incorrect
    }
}

/// Person-fit analyzer with an injected expected-rate table.
#[derive(Debug, Clone)]
pub struct PersonFitAnalyzer {
    config: PersonFitConfig,
}

impl PersonFitAnalyzer {
    pub fn new(config: PersonFitConfig) -> Self {
        PersonFitAnalyzer { config }
    }

    pub fn config(&self) -> &PersonFitConfig {
        &self.config
    }

    /// Analyze a session's difficulty-labelled responses against its total score.
    pub fn analyze(&self, responses: &[ResponseRecord], total_score: usize) -> PersonFitResult {
        if responses.is_empty() {
            return PersonFitResult {
                details: "No responses to analyze; person-fit not assessed".to_string(),
                ..PersonFitResult::default()
            };
        }

        let total_responses = responses.len();
        let score_ratio = total_score as f64 / total_responses as f64;
        let score_percentile = ScorePercentile::classify(
            score_ratio,
            self.config.low_percentile_max,
            self.config.high_percentile_min,
        );
        let expected = self.config.expected_rates.rates_for(score_percentile);

        let mut by_difficulty: BTreeMap<Difficulty, DifficultyBreakdown> = Difficulty::ALL
            .into_iter()
            .map(|d| {
                (
                    d,
                    DifficultyBreakdown {
                        expected_rate: expected.get(d),
                        ..DifficultyBreakdown::default()
                    },
                )
            })
            .collect();

        let mut unlabelled = 0usize;
        for response in responses {
            match response.difficulty() {
                Some(difficulty) => {
                    if let Some(bucket) = by_difficulty.get_mut(&difficulty) {
                        bucket.total += 1;
                        if response.is_correct {
                            bucket.correct += 1;
                        }
                    }
                }
                None => unlabelled += 1,
            }
        }
        if unlabelled > 0 {
            log::debug!(
                "[PersonFit] {} of {} responses have no usable difficulty label",
                unlabelled,
                total_responses
            );
        }

        let band = self.config.deviation_band;
        let mut unexpected_correct = 0usize;
        let mut unexpected_incorrect = 0usize;

        for (difficulty, bucket) in &by_difficulty {
            let Some(actual_rate) = bucket.actual_rate() else {
                continue;
            };
            let deviation = actual_rate - bucket.expected_rate;
            // Ties round to even
            let magnitude = (deviation.abs() * bucket.total as f64).round_ties_even() as usize;

            if deviation > band {
                unexpected_correct += magnitude;
            } else if deviation < -band {
                unexpected_incorrect += magnitude;
            } else {
                continue;
            }

            log::debug!(
                "[PersonFit] {}: actual {:.2} vs expected {:.2} (deviation {:+.2})",
                difficulty,
                actual_rate,
                bucket.expected_rate,
                deviation
            );
        }

        let fit_ratio = ((unexpected_correct + unexpected_incorrect) as f64
            / total_responses as f64)
            .clamp(0.0, 1.0);
        let fit_flag = if fit_ratio >= self.config.aberrant_fit_ratio {
            FitFlag::Aberrant
        } else {
            FitFlag::Normal
        };

        let details = match fit_flag {
            FitFlag::Aberrant => format!(
                "Response pattern inconsistent with a {} score: {} unexpectedly correct, {} unexpectedly incorrect of {} responses (fit ratio {:.2})",
                score_percentile,
                unexpected_correct,
                unexpected_incorrect,
                total_responses,
                fit_ratio
            ),
            FitFlag::Normal => format!(
                "Response pattern consistent with a {} score (fit ratio {:.2})",
                score_percentile, fit_ratio
            ),
        };

        PersonFitResult {
            fit_ratio,
            fit_flag,
            unexpected_correct,
            unexpected_incorrect,
            total_responses,
            score_percentile,
            by_difficulty,
            details,
        }
    }
}
