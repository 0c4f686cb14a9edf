//! End-to-end scenarios for the validity engine.
//!
//! Covers the detectors individually, the aggregator's point table and the
//! combined session validator:
//! - Person-fit classification (3 tests)
//! - Timing plausibility incl. threshold boundaries (4 tests)
//! - Guttman reversals (3 tests)
//! - Aggregation and status decision (4 tests)
//! - Whole-session assessment (3 tests)

use session_validity::input::parse_responses;
use session_validity::{
    DifficultyRates, ExpectedRateTable, FitFlag, FlagKind, FlagSource, GuttmanErrorCounter,
    GuttmanInterpretation, GuttmanResult, PersonFitAnalyzer, PersonFitConfig, PersonFitResult,
    ResponseRecord, ScorePercentile, SessionValidator, Severity, TimeFlag, TimingFlagKind,
    TimingPlausibilityAnalyzer, TimingResult, ValidityAggregator, ValidityConfig, ValidityStatus,
};

fn calibrated_table() -> ExpectedRateTable {
    ExpectedRateTable::new(
        DifficultyRates::new(0.60, 0.35, 0.15),
        DifficultyRates::new(0.80, 0.55, 0.30),
        DifficultyRates::new(0.95, 0.80, 0.60),
    )
}

fn person_fit() -> PersonFitAnalyzer {
    PersonFitAnalyzer::new(PersonFitConfig::new(calibrated_table()))
}

fn repeat(record: ResponseRecord, n: usize) -> Vec<ResponseRecord> {
    vec![record; n]
}

fn timed(seconds: &[f64]) -> Vec<ResponseRecord> {
    seconds
        .iter()
        .map(|&s| ResponseRecord::new(true).with_time(s))
        .collect()
}

fn high_timing_flag(kind: TimingFlagKind) -> TimeFlag {
    TimeFlag {
        kind,
        severity: Severity::High,
        count: 3,
        details: String::new(),
    }
}

// ============================================================================
// Person-fit
// ============================================================================

#[test]
fn test_high_scorer_with_missed_hard_items_fits() {
    let mut responses = repeat(ResponseRecord::graded(true, "easy"), 5);
    responses.extend(repeat(ResponseRecord::graded(true, "medium"), 5));
    responses.extend(repeat(ResponseRecord::graded(true, "hard"), 5));
    responses.extend(repeat(ResponseRecord::graded(false, "hard"), 5));

    let result = person_fit().analyze(&responses, 15);

    assert_eq!(result.score_percentile, ScorePercentile::High);
    assert_eq!(result.fit_flag, FitFlag::Normal);
    assert_eq!(result.total_responses, 20);
}

#[test]
fn test_medium_scorer_acing_hard_items_is_aberrant() {
    // 4/10 correct is medium; all four correct answers are on hard items
    let mut responses = repeat(ResponseRecord::graded(true, "hard"), 4);
    responses.extend(repeat(ResponseRecord::graded(false, "easy"), 6));

    let result = person_fit().analyze(&responses, 4);

    assert_eq!(result.score_percentile, ScorePercentile::Medium);
    // hard: 1.0 vs 0.30 -> +0.70 * 4 = 2.8 -> 3; easy: 0.0 vs 0.80 -> 0.80 * 6 = 4.8 -> 5
    assert_eq!(result.unexpected_correct, 3);
    assert_eq!(result.unexpected_incorrect, 5);
    assert!((result.fit_ratio - 0.8).abs() < 1e-9);
    assert!(result.is_aberrant());
}

#[test]
fn test_unknown_labels_count_toward_total_only() {
    let responses = vec![
        ResponseRecord::graded(true, "EASY"),
        ResponseRecord::graded(true, "expert"),
        ResponseRecord::new(false),
    ];
    let result = person_fit().analyze(&responses, 2);

    assert_eq!(result.total_responses, 3);
    let bucketed: usize = result.by_difficulty.values().map(|b| b.total).sum();
    assert_eq!(bucketed, 1);
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn test_rapid_responses_flagged() {
    let result =
        TimingPlausibilityAnalyzer::default().analyze(&timed(&[1.0, 2.0, 1.5, 60.0, 90.0]));

    assert_eq!(result.rapid_response_count, 3);
    assert!(result.has_flag(TimingFlagKind::MultipleRapidResponses));
    assert!(result.validity_concern);
}

#[test]
fn test_threshold_boundaries_are_exclusive() {
    let analyzer = TimingPlausibilityAnalyzer::default();

    let single = analyzer.analyze(&timed(&[3.0]));
    assert_eq!(single.rapid_response_count, 0);

    let exactly_five_minutes = analyzer.analyze(&timed(&[3.0; 100]));
    assert_eq!(exactly_five_minutes.total_time_seconds, 300.0);
    assert!(!exactly_five_minutes.has_flag(TimingFlagKind::TotalTimeTooFast));
    assert!(exactly_five_minutes.flags.is_empty());

    let exactly_two_hours = analyzer.analyze(&timed(&[300.0; 24]));
    assert_eq!(exactly_two_hours.total_time_seconds, 7200.0);
    assert!(!exactly_two_hours.has_flag(TimingFlagKind::TotalTimeExcessive));
    assert_eq!(exactly_two_hours.extended_pause_count, 0);
    assert!(!exactly_two_hours.validity_concern);
}

#[test]
fn test_fast_correct_hard_items() {
    let responses = vec![
        ResponseRecord::graded(true, "hard").with_time(5.0),
        ResponseRecord::graded(true, "Hard").with_time(8.0),
        ResponseRecord::graded(false, "hard").with_time(4.0),
        ResponseRecord::graded(true, "easy").with_time(4.0),
        ResponseRecord::new(true).with_time(4.0),
        ResponseRecord::graded(true, "medium").with_time(400.0),
    ];
    let result = TimingPlausibilityAnalyzer::default().analyze(&responses);

    assert_eq!(result.fast_hard_correct_count, 2);
    assert!(result.has_flag(TimingFlagKind::SuspiciouslyFastOnHard));
    assert!(result.has_flag(TimingFlagKind::ExtendedPauses));
}

#[test]
fn test_medium_flags_alone_raise_no_concern() {
    let result = TimingPlausibilityAnalyzer::default().analyze(&timed(&[400.0; 20]));

    assert!(result.has_flag(TimingFlagKind::ExtendedPauses));
    assert!(result.has_flag(TimingFlagKind::TotalTimeExcessive));
    assert!(!result.validity_concern);
    assert_eq!(result.high_severity_count(), 0);
}

// ============================================================================
// Guttman
// ============================================================================

#[test]
fn test_guttman_reversal() {
    let responses = vec![
        ResponseRecord::new(false).with_p_value(0.80),
        ResponseRecord::new(true).with_p_value(0.20),
    ];
    let result = GuttmanErrorCounter::default().count(&responses);

    assert_eq!(result.error_count, 1);
    assert_eq!(result.max_possible_errors, 1);
    assert_eq!(result.error_rate, 1.0);
    assert_eq!(result.interpretation, GuttmanInterpretation::HighErrorsAberrant);
}

#[test]
fn test_guttman_ordered_pattern() {
    let responses = vec![
        ResponseRecord::new(true).with_p_value(0.80),
        ResponseRecord::new(false).with_p_value(0.20),
    ];
    let result = GuttmanErrorCounter::default().count(&responses);

    assert_eq!(result.error_count, 0);
    assert_eq!(result.error_rate, 0.0);
    assert_eq!(result.interpretation, GuttmanInterpretation::Normal);
}

#[test]
fn test_guttman_ignores_missing_p_values_and_ties() {
    let responses = vec![
        ResponseRecord::new(true).with_p_value(0.5),
        ResponseRecord::new(false).with_p_value(0.5),
        ResponseRecord::new(false),
        ResponseRecord::new(true).with_p_value(f64::NAN),
    ];
    let result = GuttmanErrorCounter::default().count(&responses);

    assert_eq!(result.correct_count, 1);
    assert_eq!(result.incorrect_count, 1);
    assert_eq!(result.error_count, 0);
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_aberrant_fit_plus_high_timing_flag_is_invalid() {
    let pf = PersonFitResult {
        fit_flag: FitFlag::Aberrant,
        fit_ratio: 0.4,
        ..PersonFitResult::default()
    };
    let timing = TimingResult {
        flags: vec![high_timing_flag(TimingFlagKind::MultipleRapidResponses)],
        validity_concern: true,
        ..TimingResult::default()
    };

    let verdict = ValidityAggregator::default().assess(&pf, &timing, &GuttmanResult::default());

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
    assert!(verdict.components.time_check);
}

#[test]
fn test_elevated_guttman_alone_stays_valid() {
    let guttman = GuttmanResult {
        interpretation: GuttmanInterpretation::ElevatedErrors,
        error_rate: 0.25,
        ..GuttmanResult::default()
    };
    let verdict = ValidityAggregator::default().assess(
        &PersonFitResult::default(),
        &TimingResult::default(),
        &guttman,
    );

    assert_eq!(verdict.severity_score, 1);
    assert_eq!(verdict.validity_status, ValidityStatus::Valid);
    assert_eq!(verdict.flag_details[0].source, FlagSource::GuttmanCheck);
    assert_eq!(verdict.flag_details[0].error_rate, Some(0.25));
}

#[test]
fn test_confidence_floor() {
    let timing = TimingResult {
        flags: vec![
            high_timing_flag(TimingFlagKind::MultipleRapidResponses),
            high_timing_flag(TimingFlagKind::SuspiciouslyFastOnHard),
            high_timing_flag(TimingFlagKind::TotalTimeTooFast),
        ],
        validity_concern: true,
        ..TimingResult::default()
    };
    let pf = PersonFitResult {
        fit_flag: FitFlag::Aberrant,
        ..PersonFitResult::default()
    };
    let guttman = GuttmanResult {
        interpretation: GuttmanInterpretation::HighErrorsAberrant,
        ..GuttmanResult::default()
    };

    let verdict = ValidityAggregator::default().assess(&pf, &timing, &guttman);

    assert_eq!(verdict.severity_score, 10);
    assert_eq!(verdict.confidence, 0.0);
    assert_eq!(verdict.validity_status, ValidityStatus::Invalid);
}

#[test]
fn test_verdict_json_uses_flat_flag_names() {
    let timing = TimingResult {
        flags: vec![high_timing_flag(TimingFlagKind::TotalTimeTooFast)],
        validity_concern: true,
        ..TimingResult::default()
    };
    let verdict = ValidityAggregator::default().assess(
        &PersonFitResult::default(),
        &timing,
        &GuttmanResult::default(),
    );
    let json = serde_json::to_value(&verdict).unwrap();

    assert_eq!(json["validity_status"], "suspect");
    assert_eq!(json["flags"][0], "total_time_too_fast");
    assert_eq!(json["flag_details"][0]["type"], "total_time_too_fast");
    assert_eq!(json["flag_details"][0]["source"], "time_check");
    assert_eq!(json["components"]["person_fit"], "normal");
    assert_eq!(json["components"]["guttman_check"], "normal");
}

// ============================================================================
// Whole session
// ============================================================================

#[test]
fn test_empty_inputs_are_normal() {
    let pf = person_fit().analyze(&[], 0);
    assert_eq!(pf.fit_flag, FitFlag::Normal);
    assert_eq!(pf.fit_ratio, 0.0);
    assert!(!pf.details.is_empty());

    let timing = TimingPlausibilityAnalyzer::default().analyze(&[]);
    assert!(timing.flags.is_empty());
    assert!(!timing.validity_concern);

    let guttman = GuttmanErrorCounter::default().count(&[]);
    assert_eq!(guttman.interpretation, GuttmanInterpretation::Normal);
    assert_eq!(guttman.max_possible_errors, 0);
}

#[test]
fn test_rushed_session_is_invalid() {
    let mut responses: Vec<ResponseRecord> = (0..10)
        .map(|i| {
            ResponseRecord::graded(i % 2 == 0, "hard")
                .with_p_value(0.2 + i as f64 * 0.05)
                .with_time(2.0)
        })
        .collect();
    responses.push(ResponseRecord::graded(false, "easy").with_time(30.0));

    let report = SessionValidator::new(ValidityConfig::new(calibrated_table()))
        .assess_session(&responses);

    assert!(report.timing.has_flag(TimingFlagKind::MultipleRapidResponses));
    assert!(report.timing.has_flag(TimingFlagKind::SuspiciouslyFastOnHard));
    assert!(report.timing.has_flag(TimingFlagKind::TotalTimeTooFast));
    assert_eq!(report.verdict.validity_status, ValidityStatus::Invalid);
    assert!(!report.verdict.validity_status.counts_toward_population());
}

#[test]
fn test_partial_analyzer_json_defaults_to_no_concern() {
    let pf: PersonFitResult = serde_json::from_str(r#"{"fit_flag": "normal"}"#).unwrap();
    let timing: TimingResult = serde_json::from_str("{}").unwrap();
    let guttman: GuttmanResult =
        serde_json::from_str(r#"{"interpretation": "elevated_errors"}"#).unwrap();

    let verdict = ValidityAggregator::default().assess(&pf, &timing, &guttman);

    assert_eq!(verdict.severity_score, 1);
    assert_eq!(verdict.flags, vec![FlagKind::ElevatedGuttmanErrors]);
}

#[test]
fn test_non_string_difficulty_only_drops_out_of_bucketing() {
    let responses = parse_responses(
        r#"[
            {"is_correct": true, "difficulty_level": 3, "p_value": 0.4, "time_seconds": 10},
            {"is_correct": false, "difficulty_level": "easy", "p_value": 0.8, "time_seconds": 20}
        ]"#,
    )
    .unwrap();

    let report = SessionValidator::new(ValidityConfig::new(calibrated_table()))
        .assess_session(&responses);

    assert_eq!(report.person_fit.total_responses, 2);
    let bucketed: usize = report.person_fit.by_difficulty.values().map(|b| b.total).sum();
    assert_eq!(bucketed, 1);
    assert_eq!(report.guttman.correct_count, 1);
    assert_eq!(report.guttman.incorrect_count, 1);
    assert_eq!(report.guttman.error_count, 1);
    assert_eq!(report.timing.statistics.total_responses, 2);
    assert_eq!(report.timing.total_time_seconds, 30.0);
}
