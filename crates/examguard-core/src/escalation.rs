//! Strike counting and escalation decisions.

use serde::{Deserialize, Serialize};

use crate::monitor::ViolationKind;

/// Default number of strikes that forces submission.
pub const DEFAULT_STRIKE_THRESHOLD: u32 = 3;

/// Reason recorded when the Escape channel ends an attempt.
pub const ESCAPE_REASON: &str = "Escape key pressed";

/// A warning shown to the test-taker. Must be acknowledged before they can
/// interact with the assessment again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: ViolationKind,
    /// Running strike count including this one.
    pub strike: u32,
    /// Strikes left before the attempt is submitted automatically.
    pub remaining: u32,
    pub message: String,
}

/// The policy's verdict on a single violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Warn(Warning),
    ForceSubmit { reason: String },
}

/// Channel-agnostic strike counter with a fixed threshold.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    threshold: u32,
    count: u32,
}

impl EscalationPolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            count: 0,
        }
    }

    /// Count one violation and decide. Never decrements.
    pub fn on_violation(&mut self, kind: &ViolationKind) -> Decision {
        self.count = self.count.saturating_add(1);

        if self.count >= self.threshold {
            return Decision::ForceSubmit {
                reason: format!(
                    "Integrity violation limit reached ({} of {}): {kind}",
                    self.count, self.threshold
                ),
            };
        }

        let remaining = self.threshold - self.count;
        Decision::Warn(Warning {
            kind: kind.clone(),
            strike: self.count,
            remaining,
            message: format!(
                "Warning {} of {}: {kind} detected. {remaining} more violation(s) will submit your test automatically.",
                self.count,
                self.threshold - 1
            ),
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STRIKE_THRESHOLD)
    }
}
