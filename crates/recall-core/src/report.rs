//! Deck grading reports with JSON persistence and run-to-run comparison.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::GradeOutcome;
use crate::statistics::DeckSummary;

/// A complete grading report for one deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The deck that was graded.
    pub project: ProjectSummary,
    /// One entry per graded card, in deck order.
    pub results: Vec<CardResult>,
    pub summary: DeckSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a project (without the full card definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub folder_count: usize,
    pub card_count: usize,
}

/// The grading outcome for one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardResult {
    pub folder: String,
    pub card_id: Uuid,
    pub question: String,
    /// The card's reference answer.
    pub reference: String,
    /// The learner's answer.
    pub response: String,
    pub outcome: GradeOutcome,
}

impl DeckReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: DeckReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against an earlier one.
    ///
    /// Cards are matched by folder name and question text, since decks loaded
    /// from TOML get fresh ids on every load. Repeated questions within a
    /// folder are matched in order of appearance. A card counts as changed
    /// when its percent moved by more than `threshold` points.
    pub fn compare(&self, baseline: &DeckReport, threshold: u8) -> DeckComparison {
        let baseline_scores: HashMap<CardKey, u8> = keyed(&baseline.results)
            .map(|(key, r)| (key, r.outcome.percent))
            .collect();
        let current_keys: HashSet<CardKey> = keyed(&self.results).map(|(key, _)| key).collect();

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_cards = 0usize;

        for (key, r) in keyed(&self.results) {
            let Some(&before) = baseline_scores.get(&key) else {
                new_cards += 1;
                continue;
            };
            let delta = i16::from(r.outcome.percent) - i16::from(before);
            let change = CardChange {
                folder: r.folder.clone(),
                question: r.question.clone(),
                baseline_percent: before,
                current_percent: r.outcome.percent,
                delta,
            };
            if delta < -i16::from(threshold) {
                regressions.push(change);
            } else if delta > i16::from(threshold) {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_cards = baseline_scores
            .keys()
            .filter(|k| !current_keys.contains(*k))
            .count();

        DeckComparison {
            regressions,
            improvements,
            unchanged,
            new_cards,
            removed_cards,
        }
    }
}

/// Folder, question, and occurrence of that question within the folder.
type CardKey = (String, String, usize);

fn keyed(results: &[CardResult]) -> impl Iterator<Item = (CardKey, &CardResult)> {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    results.iter().map(move |r| {
        let n = seen.entry((r.folder.as_str(), r.question.as_str())).or_default();
        let key = (r.folder.clone(), r.question.clone(), *n);
        *n += 1;
        (key, r)
    })
}

/// Result of comparing two reports of the same deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckComparison {
    pub regressions: Vec<CardChange>,
    pub improvements: Vec<CardChange>,
    pub unchanged: usize,
    pub new_cards: usize,
    pub removed_cards: usize,
}

/// A card whose percent moved between two runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardChange {
    pub folder: String,
    pub question: String,
    pub baseline_percent: u8,
    pub current_percent: u8,
    pub delta: i16,
}

impl DeckComparison {
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }

    /// Render as a markdown table, suitable for pasting into notes.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("## Recall Comparison\n\n");
        md.push_str(&format!(
            "- Regressions: {}\n- Improvements: {}\n- Unchanged: {}\n- New cards: {}\n- Removed cards: {}\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.new_cards,
            self.removed_cards
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Folder | Question | Before | After | Delta |\n");
            md.push_str("|--------|----------|--------|-------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {}% | {}% | {:+} |\n",
                    c.folder, c.question, c.baseline_percent, c.current_percent, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }
}
