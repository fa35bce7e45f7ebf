//! The `examguard validate` command.
//!
//! A set that fails to load is an error and makes the command fail. Problems
//! that still allow an attempt are reported as warnings.

use std::path::PathBuf;

use anyhow::Result;

use examguard_core::model::QuestionSet;
use examguard_core::parser::{parse_question_set, question_set_paths, validate_question_set};

pub fn execute(question_set_path: PathBuf) -> Result<()> {
    if !question_set_path.is_dir() {
        let set = parse_question_set(&question_set_path)?;
        let warnings = report_set(&set);
        print_totals(warnings);
        return Ok(());
    }

    let paths = question_set_paths(&question_set_path)?;
    let mut errors = 0;
    let mut warnings = 0;

    for path in &paths {
        match parse_question_set(path) {
            Ok(set) => warnings += report_set(&set),
            Err(e) => {
                errors += 1;
                println!("{}: ERROR: {e:#}", path.display());
            }
        }
    }

    if errors > 0 {
        anyhow::bail!(
            "{errors} of {} question set(s) failed to load, {warnings} warning(s) found",
            paths.len()
        );
    }
    print_totals(warnings);

    Ok(())
}

/// Print one loaded set and its warnings. Returns the warning count.
fn report_set(set: &QuestionSet) -> usize {
    println!("Question set: {} ({} questions)", set.title, set.len());

    let found = validate_question_set(set);
    for w in &found {
        let prefix = w
            .question_id
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
    found.len()
}

fn print_totals(warnings: usize) {
    if warnings == 0 {
        println!("All question sets valid.");
    } else {
        println!("\n{warnings} warning(s) found.");
    }
}
