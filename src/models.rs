//! Core data types for the session validity engine.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse item difficulty label used by person-fit and timing checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Case-insensitive label lookup. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::from_label(s).ok_or_else(|| format!("Unknown difficulty level: {}", s))
    }
}

/// Ability band derived from the session's raw score ratio.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScorePercentile {
    Low,
    #[default]
    Medium,
    High,
}

impl ScorePercentile {
    pub const ALL: [ScorePercentile; 3] = [
        ScorePercentile::Low,
        ScorePercentile::Medium,
        ScorePercentile::High,
    ];

    /// Classify a score ratio. Both bounds are inclusive of `Medium`.
    pub fn classify(score_ratio: f64, low_max: f64, high_min: f64) -> Self {
        if score_ratio < low_max {
            ScorePercentile::Low
        } else if score_ratio <= high_min {
            ScorePercentile::Medium
        } else {
            ScorePercentile::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScorePercentile::Low => "low",
            ScorePercentile::Medium => "medium",
            ScorePercentile::High => "high",
        }
    }
}

impl fmt::Display for ScorePercentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag severity. Only `High` flags contribute timing severity points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answered item as supplied by the session store.
///
/// Every field except `is_correct` is optional; each analyzer silently skips the
/// records it cannot use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub is_correct: bool,
    /// Coarse difficulty label ("easy" / "medium" / "hard", any case)
    #[serde(default, alias = "difficulty", deserialize_with = "deserialize_lenient_label")]
    pub difficulty_level: Option<String>,
    /// Empirical proportion of test-takers answering this item correctly
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub p_value: Option<f64>,
    /// Seconds spent on the item
    #[serde(default, alias = "response_time", deserialize_with = "deserialize_lenient_number")]
    pub time_seconds: Option<f64>,
}

impl ResponseRecord {
    /// Record with only correctness known.
    pub fn new(is_correct: bool) -> Self {
        ResponseRecord {
            is_correct,
            difficulty_level: None,
            p_value: None,
            time_seconds: None,
        }
    }

    /// Record with a difficulty label, as used by person-fit.
    pub fn graded(is_correct: bool, difficulty: impl Into<String>) -> Self {
        ResponseRecord::new(is_correct).with_difficulty(difficulty)
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty_level = Some(difficulty.into());
        self
    }

    pub fn with_p_value(mut self, p_value: f64) -> Self {
        self.p_value = Some(p_value);
        self
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.time_seconds = Some(seconds);
        self
    }

    /// Parsed difficulty, `None` when missing or unrecognized.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty_level.as_deref().and_then(Difficulty::from_label)
    }

    /// Usable response time (finite), if any.
    pub fn valid_time(&self) -> Option<f64> {
        self.time_seconds.filter(|t| t.is_finite())
    }

    /// Usable p-value (finite), if any.
    pub fn valid_p_value(&self) -> Option<f64> {
        self.p_value.filter(|p| p.is_finite())
    }
}

/// Accept any JSON number; treat strings, booleans, null and containers as missing.
fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};

    struct LenientNumberVisitor;

    impl<'de> Visitor<'de> for LenientNumberVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or any non-numeric placeholder")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, _value: &str) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientNumberVisitor)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientNumberVisitor)
}

/// Accept any JSON string; treat numbers, booleans, null and containers as missing.
fn deserialize_lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};

    struct LenientLabelVisitor;

    impl<'de> Visitor<'de> for LenientLabelVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a difficulty label or any non-string placeholder")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_f64<E: de::Error>(self, _value: f64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E: de::Error>(self, _value: i64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, _value: u64) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientLabelVisitor)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientLabelVisitor)
}
