//! The `examguard replay` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use examguard_core::config::load_config_from;
use examguard_core::parser::parse_question_set;
use examguard_core::report::AttemptReport;
use examguard_core::script::{parse_script, replay, Rejection};

use super::{print_report, print_verdict, save_report};

pub fn execute(
    question_set_path: PathBuf,
    script_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    no_save: bool,
    config_path: Option<PathBuf>,
    pass_mark: Option<u32>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let question_set = Arc::new(parse_question_set(&question_set_path)?);
    let script = parse_script(&script_path)?;

    let outcome = replay(question_set, config.engine(), &script)?;
    print_rejections(&outcome.rejections);

    let report = AttemptReport::from_session(&outcome.session);
    print_report(&report, &format)?;
    print_verdict(&report, &format, pass_mark);

    if !no_save {
        let dir = output.unwrap_or(config.output_dir);
        let path = save_report(&report, &dir)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

/// Rejections go to stderr, invalid input first, then commands the session
/// refused in its current state.
fn print_rejections(rejections: &[Rejection]) {
    if rejections.is_empty() {
        return;
    }
    let (invalid, refused): (Vec<&Rejection>, Vec<&Rejection>) =
        rejections.iter().partition(|r| r.error.is_validation());

    for (label, group) in [("invalid input", &invalid), ("refused in state", &refused)] {
        if group.is_empty() {
            continue;
        }
        eprintln!("{} {label}:", group.len());
        for rejection in group {
            eprintln!(
                "  step {}: {:?} rejected: {}",
                rejection.step, rejection.command, rejection.error
            );
        }
    }
}
