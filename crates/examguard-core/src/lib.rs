//! examguard-core: assessment state machine, integrity monitoring, and scoring.
//!
//! This crate defines the data model, the per-question countdown, the
//! violation monitor and strike policy, and the state machine that ties them
//! together into a single-writer assessment session.

pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod escalation;
pub mod model;
pub mod monitor;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod script;
pub mod session;
