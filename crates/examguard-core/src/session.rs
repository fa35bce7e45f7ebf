//! The assessment state machine.
//!
//! [`AssessmentSession`] is the single owner and single writer of one
//! attempt. Every input (user action, clock tick, environment signal) is a
//! [`Command`] applied to completion by [`AssessmentSession::dispatch`], which
//! returns the [`SessionEvent`]s the host should render.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{ClockSignal, Countdown};
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::escalation::{Decision, EscalationPolicy, Warning, ESCAPE_REASON};
use crate::model::{Answer, Lifecycle, Question, QuestionSet, Termination};
use crate::monitor::{Detection, EnvironmentSignal, ViolationKind, ViolationMonitor};
use crate::scoring::AssessmentResult;

/// One input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    AcknowledgeRules,
    Start,
    Select { index: usize },
    Advance,
    AcknowledgeWarning,
    Tick,
    Signal { signal: EnvironmentSignal },
    Violation { kind: ViolationKind },
    Escape,
    Abort,
}

/// Something the host should know about after a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started {
        at: DateTime<Utc>,
    },
    QuestionPresented {
        index: usize,
        question_id: u32,
        time_budget: u32,
    },
    Ticked {
        remaining: u32,
    },
    OptionSelected {
        index: usize,
    },
    AnswerRecorded {
        answer: Answer,
        timed_out: bool,
    },
    WarningIssued {
        warning: Warning,
    },
    WarningAcknowledged,
    /// The host should cancel the default effect of this signal.
    SuppressDefault {
        signal: EnvironmentSignal,
    },
    Submitted {
        termination: Termination,
        at: DateTime<Utc>,
    },
}

/// Read-only projection for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub lifecycle: Lifecycle,
    pub current_question_index: usize,
    pub time_remaining: u32,
    pub violation_count: u32,
    pub last_warning: Option<Warning>,
    pub warning_pending: bool,
    pub selected_option: Option<usize>,
}

/// One attempt at a question set.
#[derive(Debug)]
pub struct AssessmentSession {
    questions: Arc<QuestionSet>,
    config: EngineConfig,
    lifecycle: Lifecycle,
    cursor: usize,
    answers: Vec<Answer>,
    selection: Option<usize>,
    clock: Countdown,
    monitor: ViolationMonitor,
    policy: EscalationPolicy,
    rules_acknowledged: bool,
    last_warning: Option<Warning>,
    warning_pending: bool,
    termination: Option<Termination>,
    started_at: Option<DateTime<Utc>>,
    submitted_at: Option<DateTime<Utc>>,
    events: Vec<SessionEvent>,
}

impl AssessmentSession {
    pub fn new(questions: Arc<QuestionSet>, config: EngineConfig) -> Result<Self, SessionError> {
        config.validate()?;
        questions.validate()?;

        Ok(Self {
            clock: Countdown::new(config.question_secs),
            policy: EscalationPolicy::new(config.strike_threshold),
            rules_acknowledged: !config.require_rules_ack,
            questions,
            config,
            lifecycle: Lifecycle::NotStarted,
            cursor: 0,
            answers: Vec::new(),
            selection: None,
            monitor: ViolationMonitor::new(),
            last_warning: None,
            warning_pending: false,
            termination: None,
            started_at: None,
            submitted_at: None,
            events: Vec::new(),
        })
    }

    /// Apply one command and return the events it produced.
    ///
    /// A rejected command leaves the session untouched and produces no events.
    pub fn dispatch(&mut self, command: Command) -> Result<Vec<SessionEvent>, SessionError> {
        match command {
            Command::AcknowledgeRules => self.acknowledge_rules()?,
            Command::Start => self.start()?,
            Command::Select { index } => self.select_option(index)?,
            Command::Advance => self.advance()?,
            Command::AcknowledgeWarning => self.acknowledge_warning(),
            Command::Tick => self.tick(),
            Command::Signal { signal } => self.handle_signal(&signal),
            Command::Violation { kind } => self.report_violation(kind),
            Command::Escape => self.escape(),
            Command::Abort => self.abort()?,
        }
        Ok(self.take_events())
    }

    /// Drain events produced by direct method calls.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn acknowledge_rules(&mut self) -> Result<(), SessionError> {
        self.require(Lifecycle::NotStarted, "acknowledge the rules")?;
        self.rules_acknowledged = true;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.require(Lifecycle::NotStarted, "start")?;
        if !self.rules_acknowledged {
            return Err(SessionError::RulesNotAcknowledged);
        }

        let now = Utc::now();
        self.lifecycle = Lifecycle::InProgress;
        self.started_at = Some(now);
        self.monitor.arm();
        tracing::info!(
            question_set = %self.questions.id,
            questions = self.questions.len(),
            "assessment started"
        );
        self.events.push(SessionEvent::Started { at: now });
        self.present_current();
        Ok(())
    }

    /// Record a tentative selection for the current question.
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.require(Lifecycle::InProgress, "select an option")?;
        if self.warning_pending {
            return Err(SessionError::WarningPending);
        }
        let option_count = self
            .current_question()
            .map(|q| q.options.len())
            .unwrap_or(0);
        if index >= option_count {
            return Err(SessionError::OptionOutOfRange {
                index,
                option_count,
            });
        }

        self.selection = Some(index);
        self.events.push(SessionEvent::OptionSelected { index });
        Ok(())
    }

    /// Finalize the current question at the test-taker's request.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        self.require(Lifecycle::InProgress, "advance")?;
        if self.warning_pending {
            return Err(SessionError::WarningPending);
        }
        self.finalize_current(false);
        Ok(())
    }

    /// Feed one elapsed second. Expiry finalizes the current question.
    pub fn tick(&mut self) {
        if self.lifecycle != Lifecycle::InProgress {
            return;
        }
        match self.clock.tick() {
            Some(ClockSignal::Tick { remaining }) => {
                self.events.push(SessionEvent::Ticked { remaining });
            }
            Some(ClockSignal::Expired) => {
                tracing::debug!(index = self.cursor, "question timer expired");
                self.events.push(SessionEvent::Ticked { remaining: 0 });
                self.finalize_current(true);
            }
            None => {}
        }
    }

    /// Route a raw environment signal through the monitor.
    pub fn handle_signal(&mut self, signal: &EnvironmentSignal) {
        let observation = self.monitor.observe(signal);
        if observation.suppress_default {
            self.events.push(SessionEvent::SuppressDefault {
                signal: signal.clone(),
            });
        }
        match observation.detection {
            Some(Detection::Violation(event)) => self.report_violation(event.kind),
            Some(Detection::Escape) => self.escape(),
            None => {}
        }
    }

    /// Count a violation and act on the policy's decision.
    ///
    /// Ignored outside `InProgress`, so a violation racing a submission is
    /// harmless.
    pub fn report_violation(&mut self, kind: ViolationKind) {
        if self.lifecycle != Lifecycle::InProgress {
            tracing::debug!(%kind, lifecycle = %self.lifecycle, "violation outside attempt ignored");
            return;
        }

        match self.policy.on_violation(&kind) {
            Decision::Warn(warning) => {
                tracing::warn!(
                    %kind,
                    strike = warning.strike,
                    remaining = warning.remaining,
                    "integrity warning issued"
                );
                self.last_warning = Some(warning.clone());
                self.warning_pending = true;
                self.events.push(SessionEvent::WarningIssued { warning });
            }
            Decision::ForceSubmit { reason } => {
                tracing::warn!(%kind, violations = self.policy.count(), "forcing submission");
                self.force_submit(reason);
            }
        }
    }

    /// The Escape channel: forced submission without touching the strike count.
    pub fn escape(&mut self) {
        if self.lifecycle != Lifecycle::InProgress {
            return;
        }
        tracing::warn!(violations = self.policy.count(), "escape pressed, forcing submission");
        self.force_submit(ESCAPE_REASON.to_string());
    }

    pub fn acknowledge_warning(&mut self) {
        if self.warning_pending {
            self.warning_pending = false;
            self.events.push(SessionEvent::WarningAcknowledged);
        }
    }

    /// Submit the attempt, recording the in-flight question if there is one.
    ///
    /// Calling this on a submitted session is a no-op.
    pub fn finish(&mut self, reason: Option<String>) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::Submitted => Ok(()),
            Lifecycle::NotStarted => Err(SessionError::InvalidTransition {
                operation: "finish",
                state: self.lifecycle,
            }),
            Lifecycle::InProgress => {
                if self.cursor < self.questions.len() {
                    self.record_current(false);
                }
                let termination = match reason {
                    Some(reason) => Termination::Forced { reason },
                    None => Termination::Completed,
                };
                self.close(termination);
                Ok(())
            }
        }
    }

    /// Host cancellation. Stops the clock and monitor without recording an
    /// answer for the in-flight question.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        match self.lifecycle {
            Lifecycle::Submitted => Ok(()),
            Lifecycle::NotStarted => Err(SessionError::InvalidTransition {
                operation: "abort",
                state: self.lifecycle,
            }),
            Lifecycle::InProgress => {
                tracing::info!(index = self.cursor, "assessment aborted by host");
                self.close(Termination::Aborted);
                Ok(())
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            lifecycle: self.lifecycle,
            current_question_index: self.cursor,
            time_remaining: self.clock.remaining(),
            violation_count: self.policy.count(),
            last_warning: self.last_warning.clone(),
            warning_pending: self.warning_pending,
            selected_option: self.selection,
        }
    }

    /// Score the attempt as it stands. Pure: repeated calls agree.
    pub fn compute_result(&self) -> AssessmentResult {
        AssessmentResult::compute(
            &self.questions,
            &self.answers,
            self.policy.count(),
            self.termination.as_ref(),
        )
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn current_question_index(&self) -> usize {
        self.cursor
    }

    /// The question awaiting an answer, if the attempt is in progress.
    pub fn current_question(&self) -> Option<&Question> {
        if self.lifecycle != Lifecycle::InProgress {
            return None;
        }
        self.questions.questions.get(self.cursor)
    }

    pub fn question_set(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn violation_count(&self) -> u32 {
        self.policy.count()
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub fn forced_submission_reason(&self) -> Option<&str> {
        self.termination.as_ref().and_then(Termination::forced_reason)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_armed()
    }

    fn require(&self, expected: Lifecycle, operation: &'static str) -> Result<(), SessionError> {
        if self.lifecycle == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                operation,
                state: self.lifecycle,
            })
        }
    }

    fn present_current(&mut self) {
        self.clock.reset(self.config.question_secs);
        if let Some(question) = self.questions.questions.get(self.cursor) {
            self.events.push(SessionEvent::QuestionPresented {
                index: self.cursor,
                question_id: question.id,
                time_budget: self.config.question_secs,
            });
        }
    }

    /// Explicit advance and expiry share this path.
    fn finalize_current(&mut self, timed_out: bool) {
        self.record_current(timed_out);
        if self.cursor >= self.questions.len() {
            self.close(Termination::Completed);
        } else {
            self.present_current();
        }
    }

    fn record_current(&mut self, timed_out: bool) {
        let Some(question_id) = self.questions.questions.get(self.cursor).map(|q| q.id) else {
            return;
        };
        let answer = Answer {
            question_id,
            selected_option: self.selection.take(),
            time_spent_secs: self.clock.elapsed(),
        };
        tracing::debug!(
            question_id,
            selected = ?answer.selected_option,
            timed_out,
            "answer recorded"
        );
        self.answers.push(answer.clone());
        self.cursor += 1;
        self.events
            .push(SessionEvent::AnswerRecorded { answer, timed_out });
    }

    fn force_submit(&mut self, reason: String) {
        self.record_current(false);
        self.close(Termination::Forced { reason });
    }

    fn close(&mut self, termination: Termination) {
        let now = Utc::now();
        self.lifecycle = Lifecycle::Submitted;
        self.clock.stop();
        self.monitor.disarm();
        self.warning_pending = false;
        self.submitted_at = Some(now);
        tracing::info!(
            answered = self.answers.len(),
            violations = self.policy.count(),
            ?termination,
            "assessment submitted"
        );
        self.termination = Some(termination.clone());
        self.events.push(SessionEvent::Submitted {
            termination,
            at: now,
        });
    }
}
