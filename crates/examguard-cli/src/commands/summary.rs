//! The `examguard summary` command.

use std::path::PathBuf;

use anyhow::Result;

use examguard_core::report::AttemptReport;

pub fn execute(report_path: PathBuf, format: String, pass_mark: Option<u32>) -> Result<()> {
    let report = AttemptReport::load_json(&report_path)?;
    super::print_report(&report, &format)?;
    super::print_verdict(&report, &format, pass_mark);

    if format == "text" && !report.answers.is_empty() {
        println!(
            "Answered {} of {} questions, {} left blank or unreached.",
            report.result.answered_count,
            report.result.total_count,
            report.result.unanswered_count
        );
    }

    Ok(())
}
