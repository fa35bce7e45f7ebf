//! Session error types.
//!
//! Every rejection the state machine can produce is one of these variants.
//! A rejected command never mutates the session.

use thiserror::Error;

use crate::model::Lifecycle;

/// Errors returned by [`AssessmentSession`](crate::session::AssessmentSession)
/// commands and by construction-time validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start()` was called before the rules were acknowledged.
    #[error("rules must be acknowledged before the assessment can start")]
    RulesNotAcknowledged,

    /// The command is not valid in the current lifecycle state.
    #[error("cannot {operation} while the session is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: Lifecycle,
    },

    /// The selected option does not exist on the current question.
    #[error("option {index} is out of range (question has {option_count} options)")]
    OptionOutOfRange { index: usize, option_count: usize },

    /// A warning is on screen and has not been acknowledged yet.
    #[error("an integrity warning must be acknowledged first")]
    WarningPending,

    /// The question set cannot be used for an attempt.
    #[error("invalid question set: {0}")]
    InvalidQuestionSet(String),

    /// The engine configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SessionError {
    /// Returns `true` for input validation failures, as opposed to commands
    /// issued in the wrong lifecycle state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SessionError::RulesNotAcknowledged
                | SessionError::OptionOutOfRange { .. }
                | SessionError::InvalidQuestionSet(_)
                | SessionError::InvalidConfig(_)
        )
    }
}
