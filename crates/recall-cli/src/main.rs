//! recall CLI: grade flashcard answers offline.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "recall", version, about = "Offline flashcard answer grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single answer against a reference
    Score {
        /// The known-correct answer
        #[arg(long)]
        reference: String,

        /// The learner's answer
        #[arg(long)]
        candidate: String,

        /// Show which rule decided the grade
        #[arg(long)]
        explain: bool,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// Grade every answered card in a deck
    Grade {
        /// Path to a .toml deck or a directory of decks
        #[arg(long)]
        deck: PathBuf,

        /// Output directory for the JSON report (defaults to the config value)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Do not write a report file
        #[arg(long)]
        no_save: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two grading reports of the same deck
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Percentage points a card must move to count as changed
        #[arg(long, default_value = "5")]
        threshold: u8,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate deck TOML files
    Validate {
        /// Path to deck file or directory
        #[arg(long)]
        deck: PathBuf,
    },

    /// Create starter config and example deck
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("recall=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            reference,
            candidate,
            explain,
            json,
        } => commands::score::execute(&reference, &candidate, explain, json),
        Commands::Grade {
            deck,
            output,
            format,
            no_save,
            config,
        } => commands::grade::execute(deck, output, format, no_save, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { deck } => commands::validate::execute(deck),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
