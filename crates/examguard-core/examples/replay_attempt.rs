//! Replay example: drive an attempt programmatically with examguard-core.
//!
//! Loads a question set, replays a short attempt script against it, then
//! prints the events the session produced and the final result.
//!
//! ```bash
//! cargo run -p examguard-core --example replay_attempt
//! ```

use std::sync::Arc;

use examguard_core::config::EngineConfig;
use examguard_core::parser;
use examguard_core::report::AttemptReport;
use examguard_core::script::{parse_script_str, replay};
use examguard_core::session::SessionEvent;

const SCRIPT: &str = r#"
[[steps]]
action = "select"
option = 0

[[steps]]
action = "advance"

[[steps]]
action = "signal"
signal = "blur"

[[steps]]
action = "ack-warning"

[[steps]]
action = "select"
option = 1

[[steps]]
action = "wait"
seconds = 4

[[steps]]
action = "key"
combo = "Ctrl+Shift+I"
"#;

fn main() -> anyhow::Result<()> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../question-sets/rust-basics.toml");
    let questions = Arc::new(parser::parse_question_set(path.as_ref())?);
    println!("Loaded: {} ({} questions)", questions.title, questions.len());

    let script = parse_script_str(SCRIPT)?;
    let outcome = replay(Arc::clone(&questions), EngineConfig::default(), &script)?;

    for event in &outcome.events {
        match event {
            SessionEvent::QuestionPresented { index, .. } => {
                println!("question {} presented", index + 1)
            }
            SessionEvent::AnswerRecorded { answer, timed_out } => println!(
                "answer for {}: {:?} after {}s{}",
                answer.question_id,
                answer.selected_option,
                answer.time_spent_secs,
                if *timed_out { " (timed out)" } else { "" }
            ),
            SessionEvent::WarningIssued { warning } => println!("warning: {}", warning.message),
            SessionEvent::Submitted { termination, .. } => println!("submitted: {termination:?}"),
            _ => {}
        }
    }

    let report = AttemptReport::from_session(&outcome.session);
    println!("\n{}", report.to_markdown());

    Ok(())
}
