//! Collaborator contracts for remote grading and card generation.
//!
//! The engine never calls these itself. The [`Grader`](crate::grading::Grader)
//! receives a [`RemoteGrader`] explicitly and decides when to use it, and
//! anything that produces cards from source text implements [`CardGenerator`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::model::Flashcard;

// ---------------------------------------------------------------------------
// Remote grading
// ---------------------------------------------------------------------------

/// A remote service that scores a learner answer as a 0–100 percentage.
#[async_trait]
pub trait RemoteGrader: Send + Sync {
    /// Human-readable service name.
    fn name(&self) -> &str;

    /// Score a single answer.
    async fn grade(&self, request: &GradeRequest) -> Result<RemoteScore, RemoteError>;
}

/// Request to grade a learner answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRequest {
    /// The known-correct answer.
    pub reference: String,
    /// The learner's answer.
    pub candidate: String,
}

impl GradeRequest {
    pub fn new(reference: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            candidate: candidate.into(),
        }
    }

    /// Render the grading prompt sent to a language-model backed grader.
    pub fn prompt(&self) -> String {
        GRADING_PROMPT_TEMPLATE
            .replace("{candidate}", &self.candidate)
            .replace("{reference}", &self.reference)
    }
}

/// A score returned by a remote grader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteScore {
    /// Percentage in 0..=100.
    pub percent: u8,
}

pub const GRADING_PROMPT_TEMPLATE: &str = "Evaluate the following student's answer: \"{candidate}\" against the correct answer: \"{reference}\". Return a JSON object with a single field \"score\" whose value is an integer between 0 and 100.";

// ---------------------------------------------------------------------------
// Card generation
// ---------------------------------------------------------------------------

/// A service that turns source text into question/answer cards.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerateCardsRequest) -> anyhow::Result<Vec<Flashcard>>;
}

/// Request to generate cards from source material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateCardsRequest {
    /// Text the cards should be drawn from.
    pub source_text: String,
}

impl GenerateCardsRequest {
    pub fn prompt(&self) -> String {
        GENERATION_PROMPT_TEMPLATE.replace("{text}", &self.source_text)
    }
}

pub const GENERATION_PROMPT_TEMPLATE: &str = "Create flashcards from the following text. Respond in JSON format as an array of objects with \"question\" and \"answer\" fields only. Text: {text}";

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

/// Strip markdown code fences from a model reply.
///
/// ```` ```json ```` fences win over bare ```` ``` ```` fences; text without
/// fences is only trimmed.
pub fn strip_code_fences(reply: &str) -> String {
    let stripped = if reply.contains("```json") {
        reply.replace("```json", "").replace("```", "")
    } else if reply.contains("```") {
        reply.replace("```", "")
    } else {
        reply.to_string()
    };
    stripped.trim().to_string()
}

#[derive(Deserialize)]
struct ScoreReply {
    score: i64,
}

/// Extract a 0–100 score from a grading reply.
///
/// Tries a JSON `{"score": n}` object first, then the first run of digits
/// anywhere in the reply. Out-of-range values are clamped.
pub fn parse_score_reply(reply: &str) -> Result<u8, RemoteError> {
    let body = strip_code_fences(reply);
    if let Ok(parsed) = serde_json::from_str::<ScoreReply>(&body) {
        return Ok(parsed.score.clamp(0, 100) as u8);
    }

    let digits: String = reply
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Err(RemoteError::MalformedReply(format!(
            "no score found in reply: {}",
            truncate(reply, 80)
        )));
    }

    // A run of digits too long for u64 is certainly above 100.
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Ok(value.min(100) as u8)
}

#[derive(Deserialize)]
struct QuestionAnswer {
    question: String,
    answer: String,
}

/// Decode a generation reply (a JSON array of `{question, answer}`) into cards.
pub fn parse_card_reply(reply: &str) -> Result<Vec<Flashcard>, RemoteError> {
    let body = strip_code_fences(reply);
    let pairs: Vec<QuestionAnswer> = serde_json::from_str(&body)
        .map_err(|e| RemoteError::MalformedReply(format!("invalid card JSON: {e}")))?;

    Ok(pairs
        .into_iter()
        .map(|qa| Flashcard::new(qa.question, qa.answer))
        .collect())
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
