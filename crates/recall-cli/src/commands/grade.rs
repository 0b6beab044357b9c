//! The `recall grade` command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use recall_core::config::load_config_from;
use recall_core::grading::{GradeOutcome, GradeSource, Grader, GradingMode, ProgressReporter};
use recall_core::model::Flashcard;
use recall_core::parser;
use recall_core::report::DeckReport;

/// Console progress reporter.
struct ConsoleReporter {
    pass_threshold: u8,
}

impl ProgressReporter for ConsoleReporter {
    fn on_card_graded(&self, folder: &str, card: &Flashcard, outcome: &GradeOutcome) {
        let mark = if outcome.passed(self.pass_threshold) {
            "OK"
        } else {
            "MISS"
        };
        let source = match outcome.source {
            GradeSource::Local => "local",
            GradeSource::Remote => "remote",
        };
        eprintln!(
            "  [{mark}] {folder} :: {} {}% {} ({source})",
            card.question,
            outcome.percent,
            outcome.grade().label()
        );
    }

    fn on_deck_complete(&self, graded: usize, unanswered: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {graded} graded, {unanswered} unanswered ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    deck_path: PathBuf,
    output: Option<PathBuf>,
    format: String,
    no_save: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let decks = parser::load_decks(&deck_path)?;

    let mut grader_config = config.grader_config();
    if grader_config.mode == GradingMode::Remote {
        tracing::warn!("no remote grader is available, grading locally");
        grader_config.mode = GradingMode::Local;
    }
    let pass_threshold = grader_config.pass_threshold;

    let grader = Grader::offline(grader_config);
    let reporter = ConsoleReporter { pass_threshold };
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S").to_string();

    for deck in &decks {
        eprintln!(
            "recall v{} - Grading '{}' ({} cards)",
            env!("CARGO_PKG_VERSION"),
            deck.name,
            deck.card_count()
        );
        eprintln!();

        let report = grader.grade_deck(deck, &reporter).await;

        if format == "json" {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_summary(&report);
        }

        if !no_save {
            std::fs::create_dir_all(&output_dir)?;
            let path = report_path(&output_dir, &deck.name, &timestamp);
            report.save_json(&path)?;
            eprintln!("Results saved to: {}", path.display());
        }
    }

    Ok(())
}

/// First free `report-<deck>-<timestamp>[-N].json` path in `dir`.
fn report_path(dir: &Path, deck_name: &str, timestamp: &str) -> PathBuf {
    let base = format!("report-{}-{timestamp}", file_stem(deck_name));
    let mut path = dir.join(format!("{base}.json"));
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{base}-{n}.json"));
        n += 1;
    }
    path
}

/// Deck name reduced to characters that are safe in a file name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "deck".to_string()
    } else {
        stem.to_string()
    }
}

fn print_summary(report: &DeckReport) {
    use comfy_table::{Cell, Table};

    let summary = &report.summary;

    let mut table = Table::new();
    table.set_header(vec!["Folder", "Graded", "Mean %", "Pass rate"]);
    for folder in &summary.per_folder {
        table.add_row(vec![
            Cell::new(&folder.folder),
            Cell::new(folder.graded),
            Cell::new(format!("{:.1}%", folder.mean_percent)),
            Cell::new(format!("{:.1}%", folder.pass_rate * 100.0)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL"),
        Cell::new(summary.graded),
        Cell::new(format!("{:.1}%", summary.mean_percent)),
        Cell::new(format!("{:.1}%", summary.pass_rate * 100.0)),
    ]);

    let mut buckets = Table::new();
    buckets.set_header(vec!["Grade", "Cards"]);
    for entry in summary.distribution.iter().rev() {
        buckets.add_row(vec![Cell::new(entry.grade.label()), Cell::new(entry.count)]);
    }

    println!("{table}");
    println!("{buckets}");
    println!(
        "{} of {} cards at or above {}%",
        report
            .results
            .iter()
            .filter(|r| r.outcome.passed(summary.pass_threshold))
            .count(),
        summary.graded,
        summary.pass_threshold
    );
}
