//! Reviewer overrides on top of engine verdicts.
//!
//! The engine's verdict is never mutated. A human reviewer's decision is appended
//! as a [`ValidityOverride`] carrying the previous status, the reason and a
//! timestamp; the latest override wins. Storage is the caller's concern.

use crate::error::{Result, ValidityError};
use crate::validity::{ValidityStatus, ValidityVerdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One audited status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityOverride {
    pub previous_status: ValidityStatus,
    pub new_status: ValidityStatus,
    pub reason: String,
    pub reviewer: String,
    pub overridden_at: DateTime<Utc>,
}

/// Engine verdict plus its override history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewedSession {
    pub verdict: ValidityVerdict,
    #[serde(default)]
    pub overrides: Vec<ValidityOverride>,
}

impl ReviewedSession {
    pub fn new(verdict: ValidityVerdict) -> Self {
        ReviewedSession {
            verdict,
            overrides: Vec::new(),
        }
    }

    /// Status after overrides: the latest override, else the engine status.
    pub fn effective_status(&self) -> ValidityStatus {
        self.overrides
            .last()
            .map(|o| o.new_status)
            .unwrap_or(self.verdict.validity_status)
    }

    pub fn is_overridden(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// Whether the session feeds population statistics after review.
    pub fn counts_toward_population(&self) -> bool {
        self.effective_status().counts_toward_population()
    }

    /// Record an override stamped with the current time.
    pub fn apply_override(
        &mut self,
        new_status: ValidityStatus,
        reason: &str,
        reviewer: &str,
    ) -> Result<&ValidityOverride> {
        self.apply_override_at(new_status, reason, reviewer, Utc::now())
    }

    /// Record an override with an explicit timestamp.
    pub fn apply_override_at(
        &mut self,
        new_status: ValidityStatus,
        reason: &str,
        reviewer: &str,
        at: DateTime<Utc>,
    ) -> Result<&ValidityOverride> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidityError::InvalidInput(
                "An override reason is required".to_string(),
            ));
        }
        let reviewer = reviewer.trim();
        if reviewer.is_empty() {
            return Err(ValidityError::InvalidInput(
                "An override must name the reviewer".to_string(),
            ));
        }

        let previous_status = self.effective_status();
        log::info!(
            "[Review] {} -> {} by {}: {}",
            previous_status,
            new_status,
            reviewer,
            reason
        );

        self.overrides.push(ValidityOverride {
            previous_status,
            new_status,
            reason: reason.to_string(),
            reviewer: reviewer.to_string(),
            overridden_at: at,
        });

        let latest = self.overrides.len() - 1;
        Ok(&self.overrides[latest])
    }
}
