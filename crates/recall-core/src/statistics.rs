//! Summary statistics over graded cards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grading::GradeSource;
use crate::report::CardResult;
use crate::scorer::Grade;

/// Aggregate figures for one graded deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSummary {
    /// Cards that carried a response and were graded.
    pub graded: usize,
    /// Cards skipped because they had no response.
    pub unanswered: usize,
    /// Graded cards whose final percent came from a remote grader.
    pub remote_graded: usize,
    /// Mean final percent across graded cards.
    pub mean_percent: f64,
    /// Percent at or above which a card counts as recalled.
    pub pass_threshold: u8,
    /// Fraction of graded cards at or above the threshold.
    pub pass_rate: f64,
    /// Local grade counts, lowest bucket first. Every bucket is present.
    pub distribution: Vec<GradeCount>,
    /// Per-folder figures, in the order folders first appear.
    pub per_folder: Vec<FolderStats>,
}

/// Number of cards that landed in one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade: Grade,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderStats {
    pub folder: String,
    pub graded: usize,
    pub mean_percent: f64,
    pub pass_rate: f64,
}

/// Compute the summary for a set of graded cards.
pub fn summarize(results: &[CardResult], unanswered: usize, pass_threshold: u8) -> DeckSummary {
    let mut counts: BTreeMap<Grade, usize> = Grade::ALL.iter().map(|&g| (g, 0)).collect();
    for r in results {
        *counts.entry(r.outcome.local.grade).or_default() += 1;
    }
    let distribution = counts
        .into_iter()
        .map(|(grade, count)| GradeCount { grade, count })
        .collect();

    let remote_graded = results
        .iter()
        .filter(|r| r.outcome.source == GradeSource::Remote)
        .count();

    let mut folder_order: Vec<&str> = Vec::new();
    let mut by_folder: BTreeMap<&str, Vec<&CardResult>> = BTreeMap::new();
    for r in results {
        let entry = by_folder.entry(r.folder.as_str()).or_default();
        if entry.is_empty() {
            folder_order.push(r.folder.as_str());
        }
        entry.push(r);
    }

    let per_folder = folder_order
        .into_iter()
        .map(|name| {
            let folder_results = &by_folder[name];
            FolderStats {
                folder: name.to_string(),
                graded: folder_results.len(),
                mean_percent: mean_percent(folder_results.iter().copied()),
                pass_rate: pass_rate(folder_results.iter().copied(), pass_threshold),
            }
        })
        .collect();

    DeckSummary {
        graded: results.len(),
        unanswered,
        remote_graded,
        mean_percent: mean_percent(results.iter()),
        pass_threshold,
        pass_rate: pass_rate(results.iter(), pass_threshold),
        distribution,
        per_folder,
    }
}

fn mean_percent<'a>(results: impl ExactSizeIterator<Item = &'a CardResult>) -> f64 {
    let n = results.len();
    if n == 0 {
        return 0.0;
    }
    results.map(|r| f64::from(r.outcome.percent)).sum::<f64>() / n as f64
}

fn pass_rate<'a>(results: impl ExactSizeIterator<Item = &'a CardResult>, threshold: u8) -> f64 {
    let n = results.len();
    if n == 0 {
        return 0.0;
    }
    results.filter(|r| r.outcome.percent >= threshold).count() as f64 / n as f64
}
