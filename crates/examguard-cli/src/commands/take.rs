//! The `examguard take` command: a live attempt on the terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use examguard_core::config::load_config_from;
use examguard_core::driver::{run_session, SessionObserver};
use examguard_core::error::SessionError;
use examguard_core::model::{QuestionSet, Termination};
use examguard_core::monitor::{EnvironmentSignal, KeyCombo};
use examguard_core::parser::parse_question_set;
use examguard_core::report::AttemptReport;
use examguard_core::session::{AssessmentSession, Command, SessionEvent, Snapshot};

use super::{print_report, save_report};

const RULES: &str = "\
Rules:
  - Each question has a fixed time limit; unanswered questions score zero.
  - Leaving the window, hiding the tab, exiting fullscreen, the context menu,
    clipboard actions, and developer shortcuts are integrity violations.
  - Two warnings are given. The third violation submits your test.
  - Pressing Escape submits your test immediately.

Controls: <n> select option, Enter/'n' next, 'ack' dismiss a warning, 'quit' abort.
Simulated signals: blur, hidden, exit-fs, ctx, copy, cut, paste, esc, key <combo>.";

/// Console observer that renders session events.
struct ConsoleObserver {
    questions: Arc<QuestionSet>,
}

impl SessionObserver for ConsoleObserver {
    fn on_event(&self, event: &SessionEvent, snapshot: &Snapshot) {
        match event {
            SessionEvent::QuestionPresented {
                index, time_budget, ..
            } => {
                if let Some(q) = self.questions.questions.get(*index) {
                    println!(
                        "\nQuestion {}/{} ({time_budget}s)\n{}",
                        index + 1,
                        self.questions.len(),
                        q.prompt
                    );
                    for (i, option) in q.options.iter().enumerate() {
                        println!("  {}. {option}", i + 1);
                    }
                }
            }
            SessionEvent::Ticked { remaining } if *remaining <= 3 => {
                println!("  ... {remaining}s left");
            }
            SessionEvent::OptionSelected { index } => {
                println!("  selected option {}", index + 1);
            }
            SessionEvent::AnswerRecorded {
                timed_out: true, ..
            } => {
                println!("  time is up");
            }
            SessionEvent::WarningIssued { warning } => {
                println!("\n!! {}\n   Type 'ack' to continue.", warning.message);
            }
            SessionEvent::SuppressDefault { signal } => {
                tracing::debug!(?signal, "default action suppressed");
            }
            SessionEvent::Submitted { termination, .. } => {
                let note = match termination {
                    Termination::Completed => "Test submitted.".to_string(),
                    Termination::Forced { reason } => {
                        format!("Test submitted automatically: {reason}")
                    }
                    Termination::Aborted => "Attempt aborted.".to_string(),
                };
                println!(
                    "\n{note} ({} violation(s))",
                    snapshot.violation_count
                );
            }
            _ => {}
        }
    }

    fn on_rejected(&self, _: &Command, error: &SessionError) {
        println!("  {error}");
    }
}

/// Map one line of terminal input to a session command.
pub fn parse_input(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if let Ok(n) = line.parse::<usize>() {
        if n == 0 {
            return Err("options are numbered from 1".into());
        }
        return Ok(Command::Select { index: n - 1 });
    }

    let command = match line.to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Command::Advance,
        "ack" | "ok" => Command::AcknowledgeWarning,
        "quit" | "exit" => Command::Abort,
        "esc" | "escape" => Command::Signal {
            signal: EnvironmentSignal::KeyDown {
                combo: KeyCombo::key("Escape"),
            },
        },
        "exit-fs" => Command::Signal {
            signal: EnvironmentSignal::FullscreenChanged { active: false },
        },
        "ctx" => Command::Signal {
            signal: EnvironmentSignal::ContextMenu,
        },
        other => {
            if let Some(combo) = other.strip_prefix("key ") {
                let combo: KeyCombo = combo.parse()?;
                Command::Signal {
                    signal: EnvironmentSignal::KeyDown { combo },
                }
            } else {
                Command::Signal {
                    signal: other.parse()?,
                }
            }
        }
    };
    Ok(command)
}

pub async fn execute(
    question_set_path: PathBuf,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let questions = Arc::new(parse_question_set(&question_set_path)?);
    let session = AssessmentSession::new(Arc::clone(&questions), config.engine())?;

    println!("{}", questions.title);
    if !questions.description.is_empty() {
        println!("{}", questions.description);
    }
    println!(
        "{} questions, {}s each.\n\n{RULES}\n",
        questions.len(),
        config.question_secs
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (tx, rx) = mpsc::channel(32);

    if config.require_rules_ack {
        println!("Type 'yes' to acknowledge the rules and begin.");
        let reply = lines
            .next_line()
            .await
            .context("failed to read from stdin")?
            .unwrap_or_default();
        if !reply.trim().eq_ignore_ascii_case("yes") {
            anyhow::bail!("rules were not acknowledged");
        }
        tx.send(Command::AcknowledgeRules).await?;
    }
    tx.send(Command::Start).await?;

    let observer = Arc::new(ConsoleObserver {
        questions: Arc::clone(&questions),
    });
    let mut driver = tokio::spawn(run_session(
        session,
        rx,
        Duration::from_secs(1),
        observer,
    ));

    let session = loop {
        tokio::select! {
            finished = &mut driver => break finished?,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    // EOF: hang up, the driver aborts the attempt.
                    drop(tx);
                    break driver.await?;
                };
                match parse_input(&line) {
                    Ok(command) => {
                        if tx.send(command).await.is_err() {
                            break driver.await?;
                        }
                    }
                    Err(e) => println!("  {e}"),
                }
            }
        }
    };

    if session.termination() == Some(&Termination::Aborted) {
        return Ok(());
    }

    let report = AttemptReport::from_session(&session);
    print_report(&report, "text")?;
    let dir = output.unwrap_or(config.output_dir);
    let path = save_report(&report, &dir)?;
    eprintln!("Report saved to: {}", path.display());

    Ok(())
}
