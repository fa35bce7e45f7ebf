//! Scripted attempts.
//!
//! An attempt script is a TOML list of test-taker actions and environment
//! signals. Replaying it drives a session through the same command path a
//! live host uses, with time advanced by explicit `wait` steps, so the
//! outcome is fully deterministic.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::model::{Lifecycle, QuestionSet};
use crate::monitor::{EnvironmentSignal, KeyCombo};
use crate::session::{AssessmentSession, Command, SessionEvent};

/// A parsed attempt script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptScript {
    /// Acknowledge the rules before starting.
    #[serde(default = "default_true")]
    pub acknowledge_rules: bool,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

fn default_true() -> bool {
    true
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ScriptStep {
    Select { option: usize },
    Advance,
    /// Let the clock run for this many seconds.
    Wait { seconds: u32 },
    /// A named environment signal, e.g. `blur` or `exit-fullscreen`.
    Signal { signal: String },
    Key { combo: KeyCombo },
    AckWarning,
    Escape,
    Abort,
}

/// What one step asks of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Dispatch(Command),
    /// Let this many seconds elapse, one tick at a time.
    Wait(u32),
}

impl ScriptStep {
    /// Resolve the step without expanding waits.
    pub fn action(&self) -> Result<StepAction> {
        let command = match self {
            ScriptStep::Wait { seconds } => return Ok(StepAction::Wait(*seconds)),
            ScriptStep::Select { option } => Command::Select { index: *option },
            ScriptStep::Advance => Command::Advance,
            ScriptStep::Signal { signal } => {
                let signal: EnvironmentSignal =
                    signal.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                Command::Signal { signal }
            }
            ScriptStep::Key { combo } => Command::Signal {
                signal: EnvironmentSignal::KeyDown {
                    combo: combo.clone(),
                },
            },
            ScriptStep::AckWarning => Command::AcknowledgeWarning,
            ScriptStep::Escape => Command::Escape,
            ScriptStep::Abort => Command::Abort,
        };
        Ok(StepAction::Dispatch(command))
    }
}

/// Parse a script file.
pub fn parse_script(path: &Path) -> Result<AttemptScript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script: {}", path.display()))?;
    parse_script_str(&content).with_context(|| format!("invalid script: {}", path.display()))
}

/// Parse a script and check that every step can be turned into commands.
pub fn parse_script_str(content: &str) -> Result<AttemptScript> {
    let script: AttemptScript = toml::from_str(content).context("failed to parse script TOML")?;
    for (i, step) in script.steps.iter().enumerate() {
        step.action()
            .with_context(|| format!("step {} ({step:?})", i + 1))?;
    }
    Ok(script)
}

/// A command the session refused during replay.
#[derive(Debug, Clone)]
pub struct Rejection {
    /// 1-based script step.
    pub step: usize,
    pub command: Command,
    pub error: SessionError,
}

/// Everything a replay produced.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub session: AssessmentSession,
    pub events: Vec<SessionEvent>,
    pub rejections: Vec<Rejection>,
}

/// Replay `script` against a fresh session.
///
/// Rejected commands are collected rather than aborting the replay. When the
/// script runs out while the attempt is still in progress, the clock keeps
/// ticking until the session submits itself.
pub fn replay(
    questions: Arc<QuestionSet>,
    config: EngineConfig,
    script: &AttemptScript,
) -> Result<ReplayOutcome> {
    let mut session = AssessmentSession::new(questions, config)?;
    let mut events = Vec::new();
    let mut rejections = Vec::new();

    if script.acknowledge_rules {
        events.extend(session.dispatch(Command::AcknowledgeRules)?);
    }
    events.extend(session.dispatch(Command::Start)?);

    for (i, step) in script.steps.iter().enumerate() {
        match step.action()? {
            StepAction::Wait(seconds) => {
                for _ in 0..seconds {
                    if session.lifecycle() != Lifecycle::InProgress {
                        break;
                    }
                    events.extend(session.dispatch(Command::Tick)?);
                }
            }
            StepAction::Dispatch(command) => match session.dispatch(command.clone()) {
                Ok(produced) => events.extend(produced),
                Err(error) => {
                    tracing::debug!(step = i + 1, ?command, %error, "scripted command rejected");
                    rejections.push(Rejection {
                        step: i + 1,
                        command,
                        error,
                    });
                }
            },
        }
    }

    while session.lifecycle() == Lifecycle::InProgress {
        events.extend(session.dispatch(Command::Tick)?);
    }

    Ok(ReplayOutcome {
        session,
        events,
        rejections,
    })
}
