//! Similarity scoring between a reference answer and a learner's answer.
//!
//! Rules are evaluated in a fixed order and the first one that applies decides
//! the grade:
//!
//! 1. Either answer empty after normalization: [`Grade::Incorrect`].
//! 2. Normalized texts equal: [`Grade::Exact`].
//! 3. Both answers have at most [`SHORT_ANSWER_MAX_WORDS`] words:
//!    - one text contains the other: [`Grade::NearExact`];
//!    - both are a single word within the typo threshold: [`Grade::Close`];
//!    - otherwise fall through.
//! 4. Word overlap and character overlap are blended and quantized.
//!
//! The bucket set and thresholds are part of the grading contract. Changing
//! them changes the grades learners see.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::distance::edit_distance_str;
use crate::normalize::{normalize, NormalizedAnswer};

/// Answers with at most this many words take the short-answer path.
pub const SHORT_ANSWER_MAX_WORDS: usize = 3;

/// Words must be longer than this to qualify for fuzzy word matching.
const FUZZY_WORD_MIN_LEN: usize = 3;

/// Discount applied to character overlap, a weaker signal than word overlap.
const CHAR_SCORE_WEIGHT: f64 = 0.9;

/// Fraction of the longer word's length tolerated as edits between two words.
const WORD_EDIT_RATIO: f64 = 0.3;

/// One of the six discrete grade buckets.
///
/// Serializes as its bucket value (`0.0`, `0.3`, `0.5`, `0.8`, `0.9`, `1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub enum Grade {
    /// 0.0
    Incorrect,
    /// 0.3
    Weak,
    /// 0.5
    Partial,
    /// 0.8
    Close,
    /// 0.9
    NearExact,
    /// 1.0
    Exact,
}

impl Grade {
    /// Every bucket, lowest first.
    pub const ALL: [Grade; 6] = [
        Grade::Incorrect,
        Grade::Weak,
        Grade::Partial,
        Grade::Close,
        Grade::NearExact,
        Grade::Exact,
    ];

    /// The authoritative bucket value.
    pub fn value(self) -> f64 {
        match self {
            Grade::Incorrect => 0.0,
            Grade::Weak => 0.3,
            Grade::Partial => 0.5,
            Grade::Close => 0.8,
            Grade::NearExact => 0.9,
            Grade::Exact => 1.0,
        }
    }

    /// Display percentage (`value * 100`, rounded).
    pub fn percent(self) -> u8 {
        (self.value() * 100.0).round() as u8
    }

    /// Map a 0–100 percentage onto the bucket scale. Values above 100 clamp.
    pub fn from_percent(percent: u8) -> Self {
        quantize(f64::from(percent.min(100)) / 100.0)
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Incorrect => "incorrect",
            Grade::Weak => "weak",
            Grade::Partial => "partial",
            Grade::Close => "close",
            Grade::NearExact => "near-exact",
            Grade::Exact => "exact",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1})", self.label(), self.value())
    }
}

impl From<Grade> for f64 {
    fn from(grade: Grade) -> Self {
        grade.value()
    }
}

impl TryFrom<f64> for Grade {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Grade::ALL
            .into_iter()
            .find(|g| (g.value() - value).abs() < 1e-9)
            .ok_or_else(|| format!("{value} is not a grade bucket"))
    }
}

/// The rule that decided an [`Assessment`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// One of the answers was empty after normalization.
    EmptyInput,
    /// Normalized texts are identical.
    ExactMatch,
    /// Short answers where one text contains the other.
    Containment,
    /// Single-word answers within the typo threshold.
    SingleWordTypo { distance: usize, threshold: usize },
    /// Blended word and character overlap.
    Overlap {
        word_score: f64,
        char_score: f64,
        combined: f64,
    },
}

/// A grade together with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub grade: Grade,
    #[serde(flatten)]
    pub rule: Rule,
}

/// Grade `candidate` against `reference`.
pub fn score(reference: &str, candidate: &str) -> Grade {
    assess(reference, candidate).grade
}

/// Grade as a display percentage. The bucket from [`score`] stays authoritative.
pub fn score_percent(reference: &str, candidate: &str) -> u8 {
    score(reference, candidate).percent()
}

/// Grade `candidate` against `reference` and report which rule decided.
pub fn assess(reference: &str, candidate: &str) -> Assessment {
    assess_normalized(&normalize(reference), &normalize(candidate))
}

/// Like [`assess`], over answers that are already normalized.
pub fn assess_normalized(reference: &NormalizedAnswer, candidate: &NormalizedAnswer) -> Assessment {
    if reference.is_empty() || candidate.is_empty() {
        return Assessment {
            grade: Grade::Incorrect,
            rule: Rule::EmptyInput,
        };
    }

    if reference.text() == candidate.text() {
        return Assessment {
            grade: Grade::Exact,
            rule: Rule::ExactMatch,
        };
    }

    if reference.word_count() <= SHORT_ANSWER_MAX_WORDS
        && candidate.word_count() <= SHORT_ANSWER_MAX_WORDS
    {
        if let Some(assessment) = assess_short(reference, candidate) {
            return assessment;
        }
    }

    let word_score = word_score(reference, candidate);
    let char_score = char_score(reference, candidate);
    let combined = word_score.max(char_score * CHAR_SCORE_WEIGHT);

    Assessment {
        grade: quantize(combined),
        rule: Rule::Overlap {
            word_score,
            char_score,
            combined,
        },
    }
}

fn assess_short(reference: &NormalizedAnswer, candidate: &NormalizedAnswer) -> Option<Assessment> {
    if candidate.text().contains(reference.text()) || reference.text().contains(candidate.text()) {
        return Some(Assessment {
            grade: Grade::NearExact,
            rule: Rule::Containment,
        });
    }

    let ([reference_word], [candidate_word]) = (reference.words(), candidate.words()) else {
        return None;
    };

    let shorter = reference_word
        .chars()
        .count()
        .min(candidate_word.chars().count());
    let threshold = (shorter / 3).max(2);
    let distance = edit_distance_str(candidate_word, reference_word);

    (distance <= threshold).then_some(Assessment {
        grade: Grade::Close,
        rule: Rule::SingleWordTypo {
            distance,
            threshold,
        },
    })
}

/// Fraction of reference words matched by candidate words.
///
/// Each candidate word counts once if any reference word matches it. A
/// reference word is not consumed by a match, so repeated candidate words can
/// all match the same reference word and the ratio may exceed 1.0.
pub fn word_score(reference: &NormalizedAnswer, candidate: &NormalizedAnswer) -> f64 {
    let reference_words = reference.words();
    if reference_words.is_empty() {
        return 0.0;
    }

    let matched = candidate
        .words()
        .iter()
        .filter(|word| reference_words.iter().any(|r| words_match(word, r)))
        .count();

    matched as f64 / reference_words.len() as f64
}

/// Distinct characters shared by both answers over the reference's character count.
pub fn char_score(reference: &NormalizedAnswer, candidate: &NormalizedAnswer) -> f64 {
    let reference_chars = reference.chars();
    if reference_chars.is_empty() {
        return 0.0;
    }

    let reference_set: HashSet<char> = reference_chars.iter().copied().collect();
    let candidate_set: HashSet<char> = candidate.chars().iter().copied().collect();
    let shared = reference_set.intersection(&candidate_set).count();

    shared as f64 / reference_chars.len() as f64
}

fn words_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a <= FUZZY_WORD_MIN_LEN || len_b <= FUZZY_WORD_MIN_LEN {
        return false;
    }

    if a.contains(b) || b.contains(a) {
        return true;
    }

    let tolerance = ((len_a.max(len_b) as f64 * WORD_EDIT_RATIO).floor() as usize).max(1);
    edit_distance_str(a, b) <= tolerance
}

/// Map a continuous similarity onto the bucket scale.
///
/// Never yields [`Grade::NearExact`]; that bucket is reserved for containment.
pub fn quantize(combined: f64) -> Grade {
    if combined > 0.8 {
        Grade::Exact
    } else if combined > 0.6 {
        Grade::Close
    } else if combined > 0.4 {
        Grade::Partial
    } else if combined > 0.2 {
        Grade::Weak
    } else {
        Grade::Incorrect
    }
}
