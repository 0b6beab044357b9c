//! In-process collaborators for testing the grader without a real service.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::model::Flashcard;
use crate::traits::{
    parse_card_reply, parse_score_reply, CardGenerator, GenerateCardsRequest, GradeRequest,
    RemoteGrader, RemoteScore,
};

type ErrorFactory = Box<dyn Fn() -> RemoteError + Send + Sync>;

enum Behavior {
    /// Reply with this raw text, parsed like a model reply.
    Reply(String),
    Fail(ErrorFactory),
}

/// A mock remote grader.
///
/// Replies are run through [`parse_score_reply`], so a mock can also stand in
/// for a service that answers with chatty or fenced text.
pub struct MockGrader {
    behavior: Behavior,
    delay: Option<Duration>,
    call_count: AtomicU32,
    last_request: Mutex<Option<GradeRequest>>,
}

impl MockGrader {
    /// Always answer with `percent`.
    pub fn fixed(percent: u8) -> Self {
        Self::with_reply(&format!("{{\"score\": {percent}}}"))
    }

    /// Always answer with this raw reply text.
    pub fn with_reply(reply: &str) -> Self {
        Self::from_behavior(Behavior::Reply(reply.to_string()))
    }

    /// Always fail with the error produced by `make_error`.
    pub fn failing(make_error: impl Fn() -> RemoteError + Send + Sync + 'static) -> Self {
        Self::from_behavior(Behavior::Fail(Box::new(make_error)))
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn from_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this grader.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this grader.
    pub fn last_request(&self) -> Option<GradeRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl RemoteGrader for MockGrader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn grade(&self, request: &GradeRequest) -> Result<RemoteScore, RemoteError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Reply(reply) => Ok(RemoteScore {
                percent: parse_score_reply(reply)?,
            }),
            Behavior::Fail(make_error) => Err(make_error()),
        }
    }
}

/// A mock card generator that answers every request with the same reply text.
pub struct MockGenerator {
    reply: String,
    call_count: AtomicU32,
}

impl MockGenerator {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CardGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateCardsRequest) -> anyhow::Result<Vec<Flashcard>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(chars = request.source_text.len(), "mock generation");
        Ok(parse_card_reply(&self.reply)?)
    }
}
