//! examguard CLI: the session host for proctored assessments.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "examguard",
    version,
    about = "Proctored, timed multiple-choice assessments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate question set TOML files
    Validate {
        /// Path to question set file or directory
        #[arg(long)]
        question_set: PathBuf,
    },

    /// Replay a scripted attempt deterministically
    Replay {
        /// Question set .toml file
        #[arg(long)]
        question_set: PathBuf,

        /// Attempt script .toml file
        #[arg(long)]
        script: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Do not write the attempt report
        #[arg(long)]
        no_save: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Minimum percentage needed to pass
        #[arg(long)]
        pass_mark: Option<u32>,
    },

    /// Take an assessment interactively in the terminal
    Take {
        /// Question set .toml file
        #[arg(long)]
        question_set: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print a saved attempt report
    Summary {
        /// Attempt report JSON
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Minimum percentage needed to pass
        #[arg(long)]
        pass_mark: Option<u32>,
    },

    /// Create starter config, question set, and script
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examguard_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { question_set } => commands::validate::execute(question_set),
        Commands::Replay {
            question_set,
            script,
            output,
            format,
            no_save,
            config,
            pass_mark,
        } => commands::replay::execute(
            question_set,
            script,
            output,
            format,
            no_save,
            config,
            pass_mark,
        ),
        Commands::Take {
            question_set,
            output,
            config,
        } => commands::take::execute(question_set, output, config).await,
        Commands::Summary {
            report,
            format,
            pass_mark,
        } => commands::summary::execute(report, format, pass_mark),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
