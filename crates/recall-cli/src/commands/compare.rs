//! The `recall compare` command.

use std::path::PathBuf;

use anyhow::Result;

use recall_core::report::DeckReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: u8,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold <= 100, "threshold must be between 0 and 100");

    let baseline = DeckReport::load_json(&baseline_path)?;
    let current = DeckReport::load_json(&current_path)?;

    if baseline.project.name != current.project.name {
        tracing::warn!(
            baseline = %baseline.project.name,
            current = %current.project.name,
            "comparing reports from different decks"
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            for (title, changes) in [
                ("Regressions", &report.regressions),
                ("Improvements", &report.improvements),
            ] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  [{}] {} {}% -> {}% ({:+})",
                        c.folder, c.question, c.baseline_percent, c.current_percent, c.delta
                    );
                }
            }

            if report.new_cards > 0 {
                println!("\n{} new card(s)", report.new_cards);
            }
            if report.removed_cards > 0 {
                println!("{} removed card(s)", report.removed_cards);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
