//! TOML question set parser.
//!
//! Loads question sets from TOML files and directories, and validates them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Question, QuestionSet};

/// Intermediate TOML structure for parsing question set files.
#[derive(Debug, Deserialize)]
struct TomlQuestionFile {
    question_set: TomlQuestionSetHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestionSetHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    #[serde(default)]
    id: Option<u32>,
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
}

/// Parse a single TOML file into a `QuestionSet`.
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set file: {}", path.display()))?;

    parse_question_set_str(&content, path)
}

/// Parse a TOML string into a `QuestionSet`.
///
/// Questions without an explicit `id` are numbered by position, starting at 1.
/// Structural problems (too few options, correct option out of range) are
/// errors; softer issues are reported by [`validate_question_set`].
pub fn parse_question_set_str(content: &str, source_path: &Path) -> Result<QuestionSet> {
    let parsed: TomlQuestionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| Question {
            id: q.id.unwrap_or(i as u32 + 1),
            prompt: q.prompt,
            options: q.options,
            correct_option: q.correct_option,
        })
        .collect();

    let set = QuestionSet {
        id: parsed.question_set.id,
        title: parsed.question_set.title,
        description: parsed.question_set.description,
        questions,
    };

    set.validate()
        .with_context(|| format!("invalid question set: {}", source_path.display()))?;

    Ok(set)
}

/// Recursively list the `.toml` files under `dir`, sorted by path.
pub fn question_set_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            paths.extend(question_set_paths(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Recursively load all `.toml` question set files from a directory.
/// Files that fail to parse are skipped with a warning.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionSet>> {
    let mut sets = Vec::new();
    for path in question_set_paths(dir)? {
        match parse_question_set(&path) {
            Ok(set) => sets.push(set),
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", path.display(), e);
            }
        }
    }
    Ok(sets)
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Check a question set for issues that do not prevent an attempt.
pub fn validate_question_set(set: &QuestionSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.title.trim().is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "title is empty".into(),
        });
    }

    // Check for duplicate question IDs
    let mut seen_ids = std::collections::HashSet::new();
    for q in &set.questions {
        if !seen_ids.insert(q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &set.questions {
        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "prompt is empty".into(),
            });
        }

        let mut seen_options = std::collections::HashSet::new();
        for option in &q.options {
            if !seen_options.insert(option.trim()) {
                warnings.push(ValidationWarning {
                    question_id: Some(q.id),
                    message: format!("duplicate option text: '{}'", option.trim()),
                });
            }
        }
    }

    if set.len() >= 3 {
        let first = set.questions[0].correct_option;
        if set.questions.iter().all(|q| q.correct_option == first) {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("every correct answer is option {}", first + 1),
            });
        }
    }

    warnings
}
