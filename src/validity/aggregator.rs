//! Severity aggregation and the final validity verdict
//!
//! ## Severity points (defaults)
//! | Source     | Condition               | Points |
//! |------------|-------------------------|--------|
//! | person-fit | aberrant                | 2      |
//! | timing     | each high flag          | 2      |
//! | timing     | each medium flag        | 0      |
//! | guttman    | high_errors_aberrant    | 2      |
//! | guttman    | elevated_errors         | 1      |
//!
//! Status: `>= 4` invalid, `>= 2` suspect, otherwise valid.
//! Confidence: `max(0, 1 - severity * 0.15)`.

use super::guttman::{GuttmanInterpretation, GuttmanResult};
use super::person_fit::{FitFlag, PersonFitResult};
use super::timing::{TimingFlagKind, TimingResult};
use crate::config::SeverityWeights;
use crate::models::Severity;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Session validity status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValidityStatus {
    #[default]
    Valid,
    Suspect,
    Invalid,
}

impl ValidityStatus {
    /// Status for a severity score. Checked from the most severe cut-off down.
    pub fn from_severity(severity_score: u32, weights: &SeverityWeights) -> Self {
        if severity_score >= weights.invalid_threshold {
            ValidityStatus::Invalid
        } else if severity_score >= weights.suspect_threshold {
            ValidityStatus::Suspect
        } else {
            ValidityStatus::Valid
        }
    }

    /// Whether a session with this status feeds population statistics.
    pub fn counts_toward_population(&self) -> bool {
        !matches!(self, ValidityStatus::Invalid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidityStatus::Valid => "valid",
            ValidityStatus::Suspect => "suspect",
            ValidityStatus::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(ValidityStatus::Valid),
            "suspect" => Ok(ValidityStatus::Suspect),
            "invalid" => Ok(ValidityStatus::Invalid),
            _ => Err(format!("Unknown validity status: {}", s)),
        }
    }
}

/// Detector that raised a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSource {
    PersonFit,
    TimeCheck,
    GuttmanCheck,
}

/// Every flag the engine can raise, grouped by source.
///
/// Serialized as its flat snake_case name (e.g. `"multiple_rapid_responses"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    AberrantResponsePattern,
    Timing(TimingFlagKind),
    HighGuttmanErrors,
    ElevatedGuttmanErrors,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::AberrantResponsePattern => "aberrant_response_pattern",
            FlagKind::Timing(kind) => kind.as_str(),
            FlagKind::HighGuttmanErrors => "high_guttman_errors",
            FlagKind::ElevatedGuttmanErrors => "elevated_guttman_errors",
        }
    }

    pub fn source(&self) -> FlagSource {
        match self {
            FlagKind::AberrantResponsePattern => FlagSource::PersonFit,
            FlagKind::Timing(_) => FlagSource::TimeCheck,
            FlagKind::HighGuttmanErrors | FlagKind::ElevatedGuttmanErrors => {
                FlagSource::GuttmanCheck
            }
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlagKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "aberrant_response_pattern" => FlagKind::AberrantResponsePattern,
            "multiple_rapid_responses" => FlagKind::Timing(TimingFlagKind::MultipleRapidResponses),
            "suspiciously_fast_on_hard" => FlagKind::Timing(TimingFlagKind::SuspiciouslyFastOnHard),
            "extended_pauses" => FlagKind::Timing(TimingFlagKind::ExtendedPauses),
            "total_time_too_fast" => FlagKind::Timing(TimingFlagKind::TotalTimeTooFast),
            "total_time_excessive" => FlagKind::Timing(TimingFlagKind::TotalTimeExcessive),
            "high_guttman_errors" => FlagKind::HighGuttmanErrors,
            "elevated_guttman_errors" => FlagKind::ElevatedGuttmanErrors,
            other => return Err(format!("Unknown validity flag: {}", other)),
        };
        Ok(kind)
    }
}

impl Serialize for FlagKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FlagKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// One flag with its provenance and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDetail {
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub severity: Severity,
    pub source: FlagSource,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,
}

/// Per-detector classifications echoed into the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityComponents {
    pub person_fit: FitFlag,
    /// `timing.validity_concern`, passed through unchanged
    pub time_check: bool,
    pub guttman_check: GuttmanInterpretation,
}

/// Final validity decision for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityVerdict {
    pub validity_status: ValidityStatus,
    pub severity_score: u32,
    /// Within [0, 1]
    pub confidence: f64,
    /// Unique flag names in emission order
    pub flags: Vec<FlagKind>,
    pub flag_details: Vec<FlagDetail>,
    pub components: ValidityComponents,
}

impl ValidityVerdict {
    pub fn has_flag(&self, kind: FlagKind) -> bool {
        self.flags.contains(&kind)
    }
}

/// Combines the three detector outputs into a verdict.
#[derive(Debug, Clone, Default)]
pub struct ValidityAggregator {
    weights: SeverityWeights,
}

impl ValidityAggregator {
    pub fn new(weights: SeverityWeights) -> Self {
        ValidityAggregator { weights }
    }

    pub fn weights(&self) -> &SeverityWeights {
        &self.weights
    }

    /// Confidence for a severity score, clamped to [0, 1].
    pub fn confidence_for(&self, severity_score: u32) -> f64 {
        (1.0 - severity_score as f64 * self.weights.confidence_step).clamp(0.0, 1.0)
    }

    /// Combine analyzer outputs. Pure; never fails.
    pub fn assess(
        &self,
        person_fit: &PersonFitResult,
        timing: &TimingResult,
        guttman: &GuttmanResult,
    ) -> ValidityVerdict {
        let w = &self.weights;
        let mut severity_score = 0u32;
        let mut flag_details = Vec::new();

        if person_fit.fit_flag == FitFlag::Aberrant {
            severity_score = severity_score.saturating_add(w.aberrant_person_fit);
            flag_details.push(FlagDetail {
                kind: FlagKind::AberrantResponsePattern,
                severity: Severity::High,
                source: FlagSource::PersonFit,
                details: format!(
                    "Response pattern inconsistent with overall score (fit ratio {:.2})",
                    person_fit.fit_ratio
                ),
                count: Some(person_fit.unexpected_total()),
                error_rate: None,
            });
        }

        for flag in &timing.flags {
            let points = match flag.severity {
                Severity::High => w.high_timing_flag,
                Severity::Medium => w.medium_timing_flag,
            };
            severity_score = severity_score.saturating_add(points);
            flag_details.push(FlagDetail {
                kind: FlagKind::Timing(flag.kind),
                severity: flag.severity,
                source: FlagSource::TimeCheck,
                details: flag.details.clone(),
                count: Some(flag.count),
                error_rate: None,
            });
        }

        let guttman_flag = match guttman.interpretation {
            GuttmanInterpretation::HighErrorsAberrant => Some((
                FlagKind::HighGuttmanErrors,
                Severity::High,
                w.high_guttman_errors,
                "High Guttman error rate",
            )),
            GuttmanInterpretation::ElevatedErrors => Some((
                FlagKind::ElevatedGuttmanErrors,
                Severity::Medium,
                w.elevated_guttman_errors,
                "Elevated Guttman error rate",
            )),
            GuttmanInterpretation::Normal => None,
        };
        if let Some((kind, severity, points, label)) = guttman_flag {
            severity_score = severity_score.saturating_add(points);
            flag_details.push(FlagDetail {
                kind,
                severity,
                source: FlagSource::GuttmanCheck,
                details: format!(
                    "{}: {:.1}% of item pairs answered against difficulty order",
                    label,
                    guttman.error_rate * 100.0
                ),
                count: Some(guttman.error_count),
                error_rate: Some(guttman.error_rate),
            });
        }

        let mut flags: Vec<FlagKind> = Vec::with_capacity(flag_details.len());
        for detail in &flag_details {
            if !flags.contains(&detail.kind) {
                flags.push(detail.kind);
            }
        }

        let validity_status = ValidityStatus::from_severity(severity_score, w);
        let confidence = self.confidence_for(severity_score);

        log::info!(
            "[Validity] status={} severity={} confidence={:.2} flags=[{}]",
            validity_status,
            severity_score,
            confidence,
            flags
                .iter()
                .map(FlagKind::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        ValidityVerdict {
            validity_status,
            severity_score,
            confidence,
            flags,
            flag_details,
            components: ValidityComponents {
                person_fit: person_fit.fit_flag,
                time_check: timing.validity_concern,
                guttman_check: guttman.interpretation,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validity::timing::TimeFlag;

    fn timing_with(kinds: &[TimingFlagKind]) -> TimingResult {
        let flags: Vec<TimeFlag> = kinds
            .iter()
            .map(|&kind| TimeFlag {
                kind,
                severity: kind.severity(),
                count: 3,
                details: String::new(),
            })
            .collect();
        TimingResult {
            validity_concern: flags.iter().any(|f| f.is_high()),
            flags,
            ..TimingResult::default()
        }
    }

    fn aberrant_fit() -> PersonFitResult {
        PersonFitResult {
            fit_flag: FitFlag::Aberrant,
            fit_ratio: 0.4,
            ..PersonFitResult::default()
        }
    }

    fn guttman(interpretation: GuttmanInterpretation, error_rate: f64) -> GuttmanResult {
        GuttmanResult {
            interpretation,
            error_rate,
            ..GuttmanResult::default()
        }
    }

    #[test]
    fn test_clean_inputs_are_valid() {
        let verdict = ValidityAggregator::default().assess(
            &PersonFitResult::default(),
            &TimingResult::default(),
            &GuttmanResult::default(),
        );
        assert_eq!(verdict.validity_status, ValidityStatus::Valid);
        assert_eq!(verdict.severity_score, 0);
        assert_eq!(verdict.confidence, 1.0);
        assert!(verdict.flags.is_empty());
        assert!(verdict.flag_details.is_empty());
    }

    #[test]
    fn test_aberrant_fit_plus_one_high_timing_flag_is_invalid() {
        let verdict = ValidityAggregator::default().assess(
            &aberrant_fit(),
            &timing_with(&[TimingFlagKind::MultipleRapidResponses]),
            &guttman(GuttmanInterpretation::Normal, 0.0),
        );
        assert_eq!(verdict.severity_score, 4);
        assert_eq!(verdict.validity_status, ValidityStatus::Invalid);
        assert!((verdict.confidence - 0.40).abs() < 1e-9);
        assert_eq!(
            verdict.flags,
            vec![
                FlagKind::AberrantResponsePattern,
                FlagKind::Timing(TimingFlagKind::MultipleRapidResponses)
            ]
        );
    }

    #[test]
    fn test_medium_timing_flags_record_without_points() {
        let verdict = ValidityAggregator::default().assess(
            &PersonFitResult::default(),
            &timing_with(&[TimingFlagKind::ExtendedPauses, TimingFlagKind::TotalTimeExcessive]),
            &GuttmanResult::default(),
        );
        assert_eq!(verdict.severity_score, 0);
        assert_eq!(verdict.validity_status, ValidityStatus::Valid);
        assert_eq!(verdict.flags.len(), 2);
        assert!(!verdict.components.time_check);
    }

    #[test]
    fn test_high_timing_flags_stack() {
        let verdict = ValidityAggregator::default().assess(
            &PersonFitResult::default(),
            &timing_with(&[
                TimingFlagKind::MultipleRapidResponses,
                TimingFlagKind::TotalTimeTooFast,
            ]),
            &GuttmanResult::default(),
        );
        assert_eq!(verdict.severity_score, 4);
        assert_eq!(verdict.validity_status, ValidityStatus::Invalid);
    }

    #[test]
    fn test_elevated_guttman_alone_stays_valid() {
        let verdict = ValidityAggregator::default().assess(
            &PersonFitResult::default(),
            &TimingResult::default(),
            &guttman(GuttmanInterpretation::ElevatedErrors, 0.25),
        );
        assert_eq!(verdict.severity_score, 1);
        assert_eq!(verdict.validity_status, ValidityStatus::Valid);
        assert!((verdict.confidence - 0.85).abs() < 1e-9);
        let detail = &verdict.flag_details[0];
        assert_eq!(detail.kind, FlagKind::ElevatedGuttmanErrors);
        assert_eq!(detail.severity, Severity::Medium);
        assert_eq!(detail.error_rate, Some(0.25));
    }

    #[test]
    fn test_high_guttman_is_suspect() {
        let verdict = ValidityAggregator::default().assess(
            &PersonFitResult::default(),
            &TimingResult::default(),
            &guttman(GuttmanInterpretation::HighErrorsAberrant, 0.5),
        );
        assert_eq!(verdict.severity_score, 2);
        assert_eq!(verdict.validity_status, ValidityStatus::Suspect);
        assert_eq!(verdict.components.guttman_check, GuttmanInterpretation::HighErrorsAberrant);
    }

    #[test]
    fn test_time_check_is_passed_through() {
        // Concern set without any flag: echoed as-is, not recomputed
        let timing = TimingResult {
            validity_concern: true,
            ..TimingResult::default()
        };
        let verdict = ValidityAggregator::default().assess(
            &PersonFitResult::default(),
            &timing,
            &GuttmanResult::default(),
        );
        assert!(verdict.components.time_check);
        assert_eq!(verdict.severity_score, 0);
    }

    #[test]
    fn test_confidence_floor() {
        let verdict = ValidityAggregator::default().assess(
            &aberrant_fit(),
            &timing_with(&[
                TimingFlagKind::MultipleRapidResponses,
                TimingFlagKind::SuspiciouslyFastOnHard,
                TimingFlagKind::TotalTimeTooFast,
            ]),
            &guttman(GuttmanInterpretation::HighErrorsAberrant, 1.0),
        );
        assert_eq!(verdict.severity_score, 10);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_duplicate_flags_are_listed_once() {
        let verdict = ValidityAggregator::default().assess(
            &PersonFitResult::default(),
            &timing_with(&[
                TimingFlagKind::ExtendedPauses,
                TimingFlagKind::ExtendedPauses,
            ]),
            &GuttmanResult::default(),
        );
        assert_eq!(verdict.flags.len(), 1);
        assert_eq!(verdict.flag_details.len(), 2);
    }

    #[test]
    fn test_verdict_serialization_names() {
        let verdict = ValidityAggregator::default().assess(
            &aberrant_fit(),
            &timing_with(&[TimingFlagKind::SuspiciouslyFastOnHard]),
            &guttman(GuttmanInterpretation::ElevatedErrors, 0.25),
        );
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["validity_status"], "invalid");
        assert_eq!(json["flags"][0], "aberrant_response_pattern");
        assert_eq!(json["flags"][1], "suspiciously_fast_on_hard");
        assert_eq!(json["flags"][2], "elevated_guttman_errors");
        assert_eq!(json["flag_details"][1]["source"], "time_check");
        assert_eq!(json["components"]["person_fit"], "aberrant");
        assert_eq!(json["components"]["guttman_check"], "elevated_errors");

        let back: ValidityVerdict = serde_json::from_value(json).unwrap();
        assert_eq!(back, verdict);
    }

    #[test]
    fn test_partial_inputs_default_to_no_concern() {
        let fit: PersonFitResult = serde_json::from_str(r#"{"fit_flag": "aberrant"}"#).unwrap();
        let timing: TimingResult = serde_json::from_str("{}").unwrap();
        let guttman: GuttmanResult = serde_json::from_str(r#"{"error_rate": 0.1}"#).unwrap();

        let verdict = ValidityAggregator::default().assess(&fit, &timing, &guttman);
        assert_eq!(verdict.severity_score, 2);
        assert_eq!(verdict.validity_status, ValidityStatus::Suspect);
    }

    #[test]
    fn test_population_eligibility() {
        assert!(ValidityStatus::Valid.counts_toward_population());
        assert!(ValidityStatus::Suspect.counts_toward_population());
        assert!(!ValidityStatus::Invalid.counts_toward_population());
        assert_eq!("SUSPECT".parse::<ValidityStatus>(), Ok(ValidityStatus::Suspect));
    }
}
