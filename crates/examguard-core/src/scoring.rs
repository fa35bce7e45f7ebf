//! Result computation.
//!
//! A result is derived from the answers and the question set every time it
//! is asked for; nothing here is cached.

use serde::{Deserialize, Serialize};

use crate::model::{Answer, QuestionSet, Termination};

/// Final score and audit summary of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub correct_count: usize,
    pub total_count: usize,
    /// Answers recorded, including those with nothing selected.
    pub answered_count: usize,
    /// Questions finalized with no selection plus questions never reached.
    pub unanswered_count: usize,
    /// `correct / total`, rounded to the nearest whole percent.
    pub percentage: u32,
    /// Sum of per-question time spent.
    pub time_taken_secs: u64,
    pub violation_count: u32,
    pub forced_submission_reason: Option<String>,
}

/// Per-question breakdown for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: u32,
    pub selected_option: Option<usize>,
    pub correct_option: usize,
    pub correct: bool,
    pub time_spent_secs: u32,
}

impl AssessmentResult {
    /// Score `answers` against `questions`. Answers are matched to questions
    /// by presentation order.
    pub fn compute(
        questions: &QuestionSet,
        answers: &[Answer],
        violation_count: u32,
        termination: Option<&Termination>,
    ) -> Self {
        let total_count = questions.len();
        let correct_count = questions
            .questions
            .iter()
            .zip(answers)
            .filter(|(q, a)| q.is_correct(a.selected_option))
            .count();
        let selected = answers
            .iter()
            .filter(|a| a.selected_option.is_some())
            .count();
        let time_taken_secs = answers.iter().map(|a| u64::from(a.time_spent_secs)).sum();

        Self {
            correct_count,
            total_count,
            answered_count: answers.len(),
            unanswered_count: total_count.saturating_sub(selected),
            percentage: percentage(correct_count, total_count),
            time_taken_secs,
            violation_count,
            forced_submission_reason: termination
                .and_then(Termination::forced_reason)
                .map(str::to_string),
        }
    }

    pub fn passed(&self, pass_mark: u32) -> bool {
        self.percentage >= pass_mark
    }
}

/// Per-question outcomes, in presentation order, for recorded answers.
pub fn outcomes(questions: &QuestionSet, answers: &[Answer]) -> Vec<QuestionOutcome> {
    questions
        .questions
        .iter()
        .zip(answers)
        .map(|(q, a)| QuestionOutcome {
            question_id: q.id,
            selected_option: a.selected_option,
            correct_option: q.correct_option,
            correct: q.is_correct(a.selected_option),
            time_spent_secs: a.time_spent_secs,
        })
        .collect()
}

fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 * 100.0 / total as f64).round() as u32
}
