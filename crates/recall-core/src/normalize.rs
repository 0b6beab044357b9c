//! Answer normalization.
//!
//! Both the reference and the candidate answer pass through [`normalize`]
//! before any comparison. Normalization trims surrounding whitespace, lower-cases
//! every character (Unicode, locale-insensitive) and exposes two derived views:
//! the word sequence and the whitespace-free character sequence.

/// A canonicalized answer, ready for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedAnswer {
    text: String,
    words: Vec<String>,
    chars: Vec<char>,
}

impl NormalizedAnswer {
    /// The trimmed, lower-cased text. Internal whitespace runs are kept as-is.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Words split on whitespace runs, empty fragments discarded.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Every non-whitespace character, in order.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Normalize raw answer text. Never fails; empty input yields an empty answer.
pub fn normalize(text: &str) -> NormalizedAnswer {
    let text = text.trim().to_lowercase();
    let words = text.split_whitespace().map(str::to_owned).collect();
    let chars = text.chars().filter(|c| !c.is_whitespace()).collect();

    NormalizedAnswer { text, words, chars }
}
