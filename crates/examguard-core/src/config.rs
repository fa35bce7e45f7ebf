//! Engine and file configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::escalation::DEFAULT_STRIKE_THRESHOLD;

/// Default per-question time budget in seconds.
pub const DEFAULT_QUESTION_SECS: u32 = 10;

/// Settings consumed by a single assessment session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Countdown budget applied uniformly to every question.
    pub question_secs: u32,
    /// Violations that force submission.
    pub strike_threshold: u32,
    /// Whether `start()` requires the rules to be acknowledged first.
    pub require_rules_ack: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            question_secs: DEFAULT_QUESTION_SECS,
            strike_threshold: DEFAULT_STRIKE_THRESHOLD,
            require_rules_ack: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.question_secs == 0 {
            return Err(SessionError::InvalidConfig(
                "question_secs must be at least 1".into(),
            ));
        }
        if self.strike_threshold == 0 {
            return Err(SessionError::InvalidConfig(
                "strike_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level examguard configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamguardConfig {
    #[serde(default = "default_question_secs")]
    pub question_secs: u32,
    #[serde(default = "default_strike_threshold")]
    pub strike_threshold: u32,
    #[serde(default = "default_true")]
    pub require_rules_ack: bool,
    /// Where attempt reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_question_secs() -> u32 {
    DEFAULT_QUESTION_SECS
}
fn default_strike_threshold() -> u32 {
    DEFAULT_STRIKE_THRESHOLD
}
fn default_true() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examguard-results")
}

impl Default for ExamguardConfig {
    fn default() -> Self {
        Self {
            question_secs: default_question_secs(),
            strike_threshold: default_strike_threshold(),
            require_rules_ack: true,
            output_dir: default_output_dir(),
        }
    }
}

impl ExamguardConfig {
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            question_secs: self.question_secs,
            strike_threshold: self.strike_threshold,
            require_rules_ack: self.require_rules_ack,
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examguard.toml` in the current directory
/// 2. `~/.config/examguard/config.toml`
///
/// Environment variable overrides: `EXAMGUARD_QUESTION_SECS`,
/// `EXAMGUARD_STRIKE_THRESHOLD`.
pub fn load_config() -> Result<ExamguardConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamguardConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examguard.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamguardConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.engine().validate()?;

    Ok(config)
}

pub fn parse_config_str(content: &str) -> Result<ExamguardConfig> {
    Ok(toml::from_str(content)?)
}

fn apply_env_overrides(config: &mut ExamguardConfig) -> Result<()> {
    if let Ok(secs) = std::env::var("EXAMGUARD_QUESTION_SECS") {
        config.question_secs = secs
            .trim()
            .parse()
            .with_context(|| format!("invalid EXAMGUARD_QUESTION_SECS: '{secs}'"))?;
    }
    if let Ok(threshold) = std::env::var("EXAMGUARD_STRIKE_THRESHOLD") {
        config.strike_threshold = threshold
            .trim()
            .parse()
            .with_context(|| format!("invalid EXAMGUARD_STRIKE_THRESHOLD: '{threshold}'"))?;
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examguard"))
}
