//! Attempt reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Answer, Termination};
use crate::scoring::{outcomes, AssessmentResult, QuestionOutcome};
use crate::session::AssessmentSession;

/// The audit record of one finished attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Unique attempt identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub question_set: QuestionSetSummary,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub termination: Option<Termination>,
    pub answers: Vec<Answer>,
    pub outcomes: Vec<QuestionOutcome>,
    pub result: AssessmentResult,
}

/// Summary of a question set (without the questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSetSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
}

impl AttemptReport {
    /// Build a report from a session in its current state.
    pub fn from_session(session: &AssessmentSession) -> Self {
        let set = session.question_set();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            question_set: QuestionSetSummary {
                id: set.id.clone(),
                title: set.title.clone(),
                question_count: set.len(),
            },
            started_at: session.started_at(),
            submitted_at: session.submitted_at(),
            termination: session.termination().cloned(),
            answers: session.answers().to_vec(),
            outcomes: outcomes(set, session.answers()),
            result: session.compute_result(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AttemptReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// How the attempt ended, in words.
    pub fn status(&self) -> String {
        match &self.termination {
            Some(Termination::Completed) => "completed".to_string(),
            Some(Termination::Forced { reason }) => format!("force-submitted ({reason})"),
            Some(Termination::Aborted) => "aborted".to_string(),
            None => "not submitted".to_string(),
        }
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let r = &self.result;
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.question_set.title));
        md.push_str(&format!(
            "**Score:** {}/{} ({}%)  \n**Status:** {}  \n**Time taken:** {}s  \n**Violations:** {}\n\n",
            r.correct_count,
            r.total_count,
            r.percentage,
            self.status(),
            r.time_taken_secs,
            r.violation_count
        ));

        if !self.outcomes.is_empty() {
            md.push_str("| Question | Selected | Correct | Result | Time |\n");
            md.push_str("|----------|----------|---------|--------|------|\n");
            for o in &self.outcomes {
                let selected = o
                    .selected_option
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "-".to_string());
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {}s |\n",
                    o.question_id,
                    selected,
                    o.correct_option,
                    if o.correct { "correct" } else { "wrong" },
                    o.time_spent_secs
                ));
            }
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::model::fixtures::question_set;

    fn finished_session() -> AssessmentSession {
        let mut s =
            AssessmentSession::new(Arc::new(question_set(3)), EngineConfig::default()).unwrap();
        s.acknowledge_rules().unwrap();
        s.start().unwrap();
        s.select_option(0).unwrap();
        s.tick();
        s.advance().unwrap();
        s.select_option(3).unwrap();
        s.advance().unwrap();
        s.escape();
        s
    }

    #[test]
    fn report_from_session() {
        let report = AttemptReport::from_session(&finished_session());
        assert_eq!(report.question_set.question_count, 3);
        assert_eq!(report.answers.len(), 3);
        assert_eq!(report.result.correct_count, 1);
        assert!(report.outcomes[0].correct);
        assert!(!report.outcomes[1].correct);
        assert_eq!(report.status(), "force-submitted (Escape key pressed)");
    }

    #[test]
    fn json_roundtrip() {
        let report = AttemptReport::from_session(&finished_session());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("attempt.json");

        report.save_json(&path).unwrap();
        let loaded = AttemptReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.result, report.result);
        assert_eq!(loaded.termination, report.termination);
    }

    #[test]
    fn load_missing_file() {
        let err = AttemptReport::load_json(Path::new("/nonexistent/attempt.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read report"));
    }

    #[test]
    fn markdown_output() {
        let md = AttemptReport::from_session(&finished_session()).to_markdown();
        assert!(md.contains("Fixture Assessment"));
        assert!(md.contains("1/3"));
        assert!(md.contains("| 0 | 0 | 0 | correct | 1s |"));
    }
}
