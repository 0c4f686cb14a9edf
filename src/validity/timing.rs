//! Response-time plausibility checks
//!
//! Five independent checks run over the responses that carry a usable time:
//! - **Rapid responses**: answers faster than a human can read the item
//! - **Fast on hard**: correct answers to hard items in implausibly short time
//! - **Extended pauses**: single items left open for a long time
//! - **Total too fast / excessive**: whole-session duration outside the plausible range
//!
//! Only high-severity flags raise `validity_concern`.

use crate::config::TimingThresholds;
use crate::models::{Difficulty, ResponseRecord, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of timing flags. Serialized names are stable for review tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingFlagKind {
    MultipleRapidResponses,
    SuspiciouslyFastOnHard,
    ExtendedPauses,
    TotalTimeTooFast,
    TotalTimeExcessive,
}

impl TimingFlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimingFlagKind::MultipleRapidResponses => "multiple_rapid_responses",
            TimingFlagKind::SuspiciouslyFastOnHard => "suspiciously_fast_on_hard",
            TimingFlagKind::ExtendedPauses => "extended_pauses",
            TimingFlagKind::TotalTimeTooFast => "total_time_too_fast",
            TimingFlagKind::TotalTimeExcessive => "total_time_excessive",
        }
    }

    /// Severity each kind is emitted with.
    pub fn severity(&self) -> Severity {
        match self {
            TimingFlagKind::MultipleRapidResponses
            | TimingFlagKind::SuspiciouslyFastOnHard
            | TimingFlagKind::TotalTimeTooFast => Severity::High,
            TimingFlagKind::ExtendedPauses | TimingFlagKind::TotalTimeExcessive => {
                Severity::Medium
            }
        }
    }
}

impl fmt::Display for TimingFlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emitted timing flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFlag {
    #[serde(rename = "type")]
    pub kind: TimingFlagKind,
    pub severity: Severity,
    /// Items behind the flag (timed responses for the whole-session checks)
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub details: String,
}

impl TimeFlag {
    fn new(kind: TimingFlagKind, count: usize, details: String) -> Self {
        TimeFlag {
            kind,
            severity: kind.severity(),
            count,
            details,
        }
    }

    pub fn is_high(&self) -> bool {
        self.severity == Severity::High
    }
}

/// Summary statistics over the timed responses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingStatistics {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub total_responses: usize,
}

/// Timing outcome for one session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingResult {
    pub flags: Vec<TimeFlag>,
    /// True iff at least one flag is high severity
    pub validity_concern: bool,
    pub total_time_seconds: f64,
    pub rapid_response_count: usize,
    pub extended_pause_count: usize,
    pub fast_hard_correct_count: usize,
    pub statistics: TimingStatistics,
    pub details: String,
}

impl TimingResult {
    pub fn has_flag(&self, kind: TimingFlagKind) -> bool {
        self.flags.iter().any(|f| f.kind == kind)
    }

    pub fn high_severity_count(&self) -> usize {
        self.flags.iter().filter(|f| f.is_high()).count()
    }
}

/// Timing analyzer with injected thresholds.
#[derive(Debug, Clone, Default)]
pub struct TimingPlausibilityAnalyzer {
    thresholds: TimingThresholds,
}

impl TimingPlausibilityAnalyzer {
    pub fn new(thresholds: TimingThresholds) -> Self {
        TimingPlausibilityAnalyzer { thresholds }
    }

    pub fn thresholds(&self) -> &TimingThresholds {
        &self.thresholds
    }

    /// Analyze response times. Records without a finite time are skipped.
    pub fn analyze(&self, responses: &[ResponseRecord]) -> TimingResult {
        let t = &self.thresholds;

        let timed: Vec<(f64, &ResponseRecord)> = responses
            .iter()
            .filter_map(|r| r.valid_time().map(|secs| (secs, r)))
            .collect();

        let skipped = responses.len() - timed.len();
        if skipped > 0 {
            log::warn!(
                "[Timing] Skipping {} of {} responses without a usable time",
                skipped,
                responses.len()
            );
        }

        if timed.is_empty() {
            return TimingResult {
                details: "No timed responses; timing not assessed".to_string(),
                ..TimingResult::default()
            };
        }

        let n = timed.len();
        let total_time_seconds: f64 = timed.iter().map(|(secs, _)| secs).sum();
        let statistics = TimingStatistics {
            mean: total_time_seconds / n as f64,
            min: timed.iter().map(|(secs, _)| *secs).fold(f64::INFINITY, f64::min),
            max: timed
                .iter()
                .map(|(secs, _)| *secs)
                .fold(f64::NEG_INFINITY, f64::max),
            total_responses: n,
        };

        let rapid_response_count = timed
            .iter()
            .filter(|(secs, _)| *secs < t.rapid_response_secs)
            .count();
        let fast_hard_correct_count = timed
            .iter()
            .filter(|(secs, r)| {
                let difficulty = r.difficulty().unwrap_or(Difficulty::Medium);
                difficulty == Difficulty::Hard && r.is_correct && *secs < t.fast_hard_secs
            })
            .count();
        let extended_pause_count = timed
            .iter()
            .filter(|(secs, _)| *secs > t.extended_pause_secs)
            .count();

        let mut flags = Vec::new();

        let rapid_threshold = if n < t.small_session_size {
            t.rapid_count_small_session
        } else {
            t.rapid_count_default
        };
        if rapid_response_count >= rapid_threshold {
            flags.push(TimeFlag::new(
                TimingFlagKind::MultipleRapidResponses,
                rapid_response_count,
                format!(
                    "{} responses faster than {}s",
                    rapid_response_count, t.rapid_response_secs
                ),
            ));
        }

        if fast_hard_correct_count >= t.fast_hard_min_count {
            flags.push(TimeFlag::new(
                TimingFlagKind::SuspiciouslyFastOnHard,
                fast_hard_correct_count,
                format!(
                    "{} hard items answered correctly in under {}s",
                    fast_hard_correct_count, t.fast_hard_secs
                ),
            ));
        }

        if extended_pause_count >= t.extended_pause_min_count {
            flags.push(TimeFlag::new(
                TimingFlagKind::ExtendedPauses,
                extended_pause_count,
                format!(
                    "{} responses took longer than {}s",
                    extended_pause_count, t.extended_pause_secs
                ),
            ));
        }

        if total_time_seconds < t.total_too_fast_secs {
            flags.push(TimeFlag::new(
                TimingFlagKind::TotalTimeTooFast,
                n,
                format!(
                    "Session completed in {:.1}s, below the {}s minimum",
                    total_time_seconds, t.total_too_fast_secs
                ),
            ));
        }

        if total_time_seconds > t.total_excessive_secs {
            flags.push(TimeFlag::new(
                TimingFlagKind::TotalTimeExcessive,
                n,
                format!(
                    "Session took {:.1}s, above the {}s maximum",
                    total_time_seconds, t.total_excessive_secs
                ),
            ));
        }

        let validity_concern = flags.iter().any(TimeFlag::is_high);

        for flag in &flags {
            log::debug!("[Timing] {} ({}): {}", flag.kind, flag.severity, flag.details);
        }

        let details = if flags.is_empty() {
            format!(
                "{} timed responses, {:.1}s total; no timing anomalies",
                n, total_time_seconds
            )
        } else {
            format!(
                "{} timed responses, {:.1}s total; {} timing flag(s)",
                n,
                total_time_seconds,
                flags.len()
            )
        };

        TimingResult {
            flags,
            validity_concern,
            total_time_seconds,
            rapid_response_count,
            extended_pause_count,
            fast_hard_correct_count,
            statistics,
            details,
        }
    }
}
