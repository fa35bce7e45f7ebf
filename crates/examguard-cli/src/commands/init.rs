//! The `examguard init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("examguard.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("question-sets")?;
    write_if_missing(Path::new("question-sets/example.toml"), EXAMPLE_QUESTION_SET)?;

    std::fs::create_dir_all("scripts")?;
    write_if_missing(Path::new("scripts/example.toml"), EXAMPLE_SCRIPT)?;

    println!("\nNext steps:");
    println!("  1. Run: examguard validate --question-set question-sets/example.toml");
    println!(
        "  2. Run: examguard replay --question-set question-sets/example.toml --script scripts/example.toml"
    );
    println!("  3. Run: examguard take --question-set question-sets/example.toml");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examguard configuration

# Seconds allowed per question.
question_secs = 10
# Violations allowed before the test is submitted automatically.
strike_threshold = 3
require_rules_ack = true
output_dir = "./examguard-results"
"#;

const EXAMPLE_QUESTION_SET: &str = r#"[question_set]
id = "example"
title = "Example Assessment"
description = "A short assessment to get started"

[[questions]]
prompt = "Which keyword declares an immutable binding in Rust?"
options = ["var", "let", "const mut", "static mut"]
correct_option = 1

[[questions]]
prompt = "What does `Option::None` represent?"
options = ["An error", "The absence of a value", "A null pointer", "Zero"]
correct_option = 1

[[questions]]
prompt = "Which trait enables the `?` operator to convert error types?"
options = ["Into", "AsRef", "From", "Display"]
correct_option = 2
"#;

const EXAMPLE_SCRIPT: &str = r#"# Answer the first question, lose focus once, then run out of time.
acknowledge_rules = true

[[steps]]
action = "select"
option = 1

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
seconds = 10
"#;
