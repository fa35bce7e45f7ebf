//! Real-time session driver.
//!
//! Runs one [`AssessmentSession`] on a tokio task: host commands arrive on an
//! mpsc queue, clock ticks come from a `tokio::time::interval`, and both are
//! applied one at a time through [`AssessmentSession::dispatch`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::SessionError;
use crate::model::Lifecycle;
use crate::session::{AssessmentSession, Command, SessionEvent, Snapshot};

/// Receives everything the driver applies.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent, snapshot: &Snapshot);
    fn on_rejected(&self, command: &Command, error: &SessionError);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_event(&self, _: &SessionEvent, _: &Snapshot) {}
    fn on_rejected(&self, _: &Command, _: &SessionError) {}
}

/// Drive `session` until it is submitted or the host hangs up.
///
/// Commands take priority over a tick that is ready at the same instant.
/// Each newly presented question restarts the tick schedule so it gets a
/// full budget of whole seconds. Closing the command channel aborts an
/// attempt that is still in progress.
pub async fn run_session(
    mut session: AssessmentSession,
    mut commands: mpsc::Receiver<Command>,
    tick_period: Duration,
    observer: Arc<dyn SessionObserver>,
) -> AssessmentSession {
    let mut ticker = tokio::time::interval_at(Instant::now() + tick_period, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while session.lifecycle() != Lifecycle::Submitted {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(command) => {
                    let events = apply(&mut session, command, observer.as_ref());
                    if events
                        .iter()
                        .any(|e| matches!(e, SessionEvent::QuestionPresented { .. }))
                    {
                        ticker.reset();
                    }
                }
                None => {
                    if session.lifecycle() == Lifecycle::InProgress {
                        tracing::info!("command channel closed, aborting attempt");
                        apply(&mut session, Command::Abort, observer.as_ref());
                    }
                    break;
                }
            },
            _ = ticker.tick() => {
                if session.lifecycle() == Lifecycle::InProgress {
                    let events = apply(&mut session, Command::Tick, observer.as_ref());
                    if events
                        .iter()
                        .any(|e| matches!(e, SessionEvent::QuestionPresented { .. }))
                    {
                        ticker.reset();
                    }
                }
            }
        }
    }

    session
}

fn apply(
    session: &mut AssessmentSession,
    command: Command,
    observer: &dyn SessionObserver,
) -> Vec<SessionEvent> {
    match session.dispatch(command.clone()) {
        Ok(events) => {
            let snapshot = session.snapshot();
            for event in &events {
                observer.on_event(event, &snapshot);
            }
            events
        }
        Err(error) => {
            tracing::debug!(?command, %error, "command rejected");
            observer.on_rejected(&command, &error);
            Vec::new()
        }
    }
}
