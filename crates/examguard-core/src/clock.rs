//! Per-question countdown.
//!
//! The countdown does not own a timer. Whoever drives the session feeds it
//! one `tick()` per elapsed second, which keeps it deterministic under test
//! and lets the async driver and the script replayer share it.

use serde::{Deserialize, Serialize};

/// What a single tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClockSignal {
    /// One second elapsed; `remaining` is still above zero.
    Tick { remaining: u32 },
    /// The countdown reached zero. Emitted once, after which the clock stops.
    Expired,
}

/// A stoppable countdown over a whole-second budget.
#[derive(Debug, Clone)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    /// A stopped countdown holding `budget` seconds.
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            remaining: budget,
            running: false,
        }
    }

    /// Begin counting down from `budget`.
    pub fn start(&mut self, budget: u32) {
        self.budget = budget;
        self.remaining = budget;
        self.running = budget > 0;
    }

    /// Restart for the next question.
    pub fn reset(&mut self, budget: u32) {
        self.start(budget);
    }

    /// Halt ticking. Remaining time is kept for the projection.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one second. A stopped clock produces nothing.
    pub fn tick(&mut self) -> Option<ClockSignal> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Some(ClockSignal::Expired)
        } else {
            Some(ClockSignal::Tick {
                remaining: self.remaining,
            })
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds consumed since the last start or reset.
    pub fn elapsed(&self) -> u32 {
        self.budget - self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
