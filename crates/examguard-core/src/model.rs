//! Core data model types for examguard.
//!
//! Questions and question sets are supplied by the host and never change
//! during an attempt. Answers are created once per question by the session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier carried into the recorded answer.
    pub id: u32,
    /// Text shown to the test-taker.
    pub prompt: String,
    /// Answer options in presentation order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_option: usize,
}

impl Question {
    /// Returns `true` if `selected` is this question's correct option.
    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct_option)
    }
}

/// An ordered, fixed-length set of questions with a display title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Unique identifier for this question set.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Description shown alongside the rules.
    #[serde(default)]
    pub description: String,
    /// Questions in presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Reject sets that cannot be presented: no questions, fewer than two
    /// options, or a correct option that does not exist.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.questions.is_empty() {
            return Err(SessionError::InvalidQuestionSet(format!(
                "'{}' has no questions",
                self.id
            )));
        }
        for q in &self.questions {
            if q.options.len() < 2 {
                return Err(SessionError::InvalidQuestionSet(format!(
                    "question {} has {} option(s), at least 2 required",
                    q.id,
                    q.options.len()
                )));
            }
            if q.correct_option >= q.options.len() {
                return Err(SessionError::InvalidQuestionSet(format!(
                    "question {} marks option {} correct but has only {} options",
                    q.id,
                    q.correct_option,
                    q.options.len()
                )));
            }
        }
        Ok(())
    }
}

/// The finalized response to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: u32,
    /// `None` when the question was finalized with nothing selected.
    pub selected_option: Option<usize>,
    /// Seconds the question was on screen. Audit data only.
    pub time_spent_secs: u32,
}

/// Lifecycle of one attempt. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    NotStarted,
    InProgress,
    Submitted,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::NotStarted => write!(f, "not started"),
            Lifecycle::InProgress => write!(f, "in progress"),
            Lifecycle::Submitted => write!(f, "submitted"),
        }
    }
}

/// How a submitted attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// The last question was finalized.
    Completed,
    /// The escalation policy or the Escape channel ended the attempt.
    Forced { reason: String },
    /// The host cancelled the attempt.
    Aborted,
}

impl Termination {
    pub fn forced_reason(&self) -> Option<&str> {
        match self {
            Termination::Forced { reason } => Some(reason),
            _ => None,
        }
    }
}
