//! Whole-attempt scenarios driven through the engine's public API.

use std::sync::Arc;
use std::time::Duration;

use examguard_core::config::EngineConfig;
use examguard_core::driver::{run_session, NoopObserver};
use examguard_core::escalation::ESCAPE_REASON;
use examguard_core::model::{Lifecycle, Question, QuestionSet, Termination};
use examguard_core::monitor::{ClipboardAction, EnvironmentSignal, KeyCombo};
use examguard_core::session::{AssessmentSession, Command};
use tokio::sync::mpsc;

fn make_set(count: u32) -> Arc<QuestionSet> {
    Arc::new(QuestionSet {
        id: "scenario".into(),
        title: "Scenario".into(),
        description: String::new(),
        questions: (1..=count)
            .map(|id| Question {
                id,
                prompt: format!("Question {id}"),
                options: vec!["A".into(), "B".into(), "C".into()],
                correct_option: (id % 3) as usize,
            })
            .collect(),
    })
}

fn started(count: u32) -> AssessmentSession {
    let mut session = AssessmentSession::new(make_set(count), EngineConfig::default()).unwrap();
    session.dispatch(Command::AcknowledgeRules).unwrap();
    session.dispatch(Command::Start).unwrap();
    session
}

fn exit_fullscreen() -> Command {
    Command::Signal {
        signal: EnvironmentSignal::FullscreenChanged { active: false },
    }
}

fn escape_key() -> Command {
    Command::Signal {
        signal: EnvironmentSignal::KeyDown {
            combo: KeyCombo::key("Escape"),
        },
    }
}

fn assert_cursor_invariant(session: &AssessmentSession) {
    if session.lifecycle() == Lifecycle::InProgress {
        assert_eq!(session.answers().len(), session.current_question_index());
    }
}

#[test]
fn fifty_correct_answers_score_full_marks() {
    let mut session = started(50);

    while session.lifecycle() == Lifecycle::InProgress {
        let correct = session.current_question().unwrap().correct_option;
        session.dispatch(Command::Select { index: correct }).unwrap();
        session.dispatch(Command::Advance).unwrap();
        assert_cursor_invariant(&session);
    }

    assert_eq!(session.termination(), Some(&Termination::Completed));
    assert_eq!(session.answers().len(), 50);

    let result = session.compute_result();
    assert_eq!(result.correct_count, 50);
    assert_eq!(result.total_count, 50);
    assert_eq!(result.percentage, 100);
    assert_eq!(result.violation_count, 0);
    assert_eq!(result.forced_submission_reason, None);
}

#[test]
fn three_fullscreen_exits_force_submission() {
    let mut session = started(10);

    session.dispatch(Command::Advance).unwrap();
    session.dispatch(Command::Advance).unwrap();
    session.dispatch(Command::Select { index: 2 }).unwrap();

    for strike in 1..=2u32 {
        session.dispatch(exit_fullscreen()).unwrap();
        assert_eq!(session.lifecycle(), Lifecycle::InProgress);
        assert_eq!(session.violation_count(), strike);
        assert!(session.snapshot().warning_pending);
        session.dispatch(Command::AcknowledgeWarning).unwrap();
    }
    session.dispatch(exit_fullscreen()).unwrap();

    assert_eq!(session.lifecycle(), Lifecycle::Submitted);
    assert!(session
        .forced_submission_reason()
        .unwrap()
        .contains("fullscreen"));
    // Two completed questions plus the in-flight one.
    assert_eq!(session.answers().len(), 3);
    assert_eq!(session.answers()[2].selected_option, Some(2));
}

#[test]
fn mixed_channels_share_one_counter() {
    let mut session = started(5);

    session
        .dispatch(Command::Signal {
            signal: EnvironmentSignal::WindowBlur,
        })
        .unwrap();
    session
        .dispatch(Command::Signal {
            signal: EnvironmentSignal::Clipboard {
                action: ClipboardAction::Paste,
            },
        })
        .unwrap();
    assert_eq!(session.lifecycle(), Lifecycle::InProgress);

    session
        .dispatch(Command::Signal {
            signal: EnvironmentSignal::KeyDown {
                combo: KeyCombo::ctrl_shift("I"),
            },
        })
        .unwrap();
    assert_eq!(session.lifecycle(), Lifecycle::Submitted);
    assert_eq!(session.violation_count(), 3);
}

#[test]
fn escape_on_fifth_question_submits_immediately() {
    let mut session = started(50);
    for _ in 0..4 {
        session.dispatch(Command::Advance).unwrap();
    }
    assert_eq!(session.current_question_index(), 4);

    session.dispatch(escape_key()).unwrap();

    assert_eq!(session.lifecycle(), Lifecycle::Submitted);
    assert_eq!(session.violation_count(), 0);
    assert_eq!(session.forced_submission_reason(), Some(ESCAPE_REASON));
    assert_eq!(session.answers().len(), 5);
}

#[test]
fn escape_ignores_prior_strikes() {
    for prior in 0..=2u32 {
        let mut session = started(5);
        for _ in 0..prior {
            session.dispatch(exit_fullscreen()).unwrap();
            session.dispatch(Command::AcknowledgeWarning).unwrap();
        }
        session.dispatch(escape_key()).unwrap();
        assert_eq!(session.violation_count(), prior);
        assert_eq!(session.forced_submission_reason(), Some(ESCAPE_REASON));
    }
}

#[test]
fn every_question_expiring_scores_zero() {
    let mut session = started(6);

    while session.lifecycle() == Lifecycle::InProgress {
        session.dispatch(Command::Tick).unwrap();
        assert_cursor_invariant(&session);
    }

    assert_eq!(session.answers().len(), 6);
    assert!(session.answers().iter().all(|a| a.selected_option.is_none()));
    assert!(session.answers().iter().all(|a| a.time_spent_secs == 10));

    let result = session.compute_result();
    assert_eq!(result.correct_count, 0);
    assert_eq!(result.time_taken_secs, 60);
}

#[test]
fn finishing_twice_changes_nothing() {
    let mut session = started(4);
    session.dispatch(Command::Select { index: 1 }).unwrap();
    session.finish(None).unwrap();

    let answers = session.answers().to_vec();
    let submitted_at = session.submitted_at();
    let result = session.compute_result();

    session.finish(None).unwrap();
    session.finish(Some("late".into())).unwrap();

    assert_eq!(session.answers(), answers.as_slice());
    assert_eq!(session.submitted_at(), submitted_at);
    assert_eq!(session.termination(), Some(&Termination::Completed));
    assert_eq!(session.compute_result(), result);
    assert_eq!(session.compute_result(), session.compute_result());
}

#[test]
fn submitted_session_ignores_signals() {
    let mut session = started(2);
    session.dispatch(escape_key()).unwrap();
    let result = session.compute_result();

    session.dispatch(exit_fullscreen()).unwrap();
    session.dispatch(Command::Tick).unwrap();

    assert_eq!(session.compute_result(), result);
    assert!(session.dispatch(Command::Select { index: 0 }).is_err());
}

#[tokio::test(start_paused = true)]
async fn driven_attempt_times_out_in_real_time() {
    let session = AssessmentSession::new(make_set(3), EngineConfig::default()).unwrap();
    let (tx, rx) = mpsc::channel(8);
    tx.send(Command::AcknowledgeRules).await.unwrap();
    tx.send(Command::Start).await.unwrap();
    tx.send(Command::Select { index: 1 }).await.unwrap();

    let handle = tokio::spawn(run_session(
        session,
        rx,
        Duration::from_secs(1),
        Arc::new(NoopObserver),
    ));
    tokio::time::sleep(Duration::from_secs(31)).await;

    let session = handle.await.unwrap();
    assert_eq!(session.termination(), Some(&Termination::Completed));
    assert_eq!(session.answers().len(), 3);
    assert_eq!(session.answers()[0].selected_option, Some(1));
    assert_eq!(session.compute_result().correct_count, 1);
    drop(tx);
}
