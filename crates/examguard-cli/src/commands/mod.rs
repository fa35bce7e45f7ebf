pub mod init;
pub mod replay;
pub mod summary;
pub mod take;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use examguard_core::report::AttemptReport;

/// Print a report in the requested format: text, json, or markdown.
pub fn print_report(report: &AttemptReport, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_summary(report),
    }
    Ok(())
}

fn print_summary(report: &AttemptReport) {
    let r = &report.result;

    let mut table = Table::new();
    table.set_header(vec![
        "Question Set",
        "Score",
        "Percent",
        "Time",
        "Violations",
        "Status",
    ]);
    table.add_row(vec![
        Cell::new(&report.question_set.title),
        Cell::new(format!("{}/{}", r.correct_count, r.total_count)),
        Cell::new(format!("{}%", r.percentage)),
        Cell::new(format!("{}s", r.time_taken_secs)),
        Cell::new(r.violation_count),
        Cell::new(report.status()),
    ]);

    println!("{table}");
}

/// Print whether the attempt reached `pass_mark` percent. Skipped for JSON so
/// the output stays machine-readable.
pub fn print_verdict(report: &AttemptReport, format: &str, pass_mark: Option<u32>) {
    let Some(pass_mark) = pass_mark else {
        return;
    };
    if format == "json" {
        return;
    }
    let verdict = if report.result.passed(pass_mark) {
        "PASSED"
    } else {
        "FAILED"
    };
    println!(
        "{verdict}: scored {}% against a pass mark of {pass_mark}%",
        report.result.percentage
    );
}

/// Write the report as `attempt-<timestamp>.json` under `output`.
pub fn save_report(report: &AttemptReport, output: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output)?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("attempt-{timestamp}-{}.json", report.id.simple()));
    report.save_json(&path)?;
    Ok(path)
}
