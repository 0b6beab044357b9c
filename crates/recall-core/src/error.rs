//! Remote collaborator error types.
//!
//! The scoring engine itself cannot fail. These errors describe why a remote
//! grading or generation service did not produce a usable answer, so the
//! grader can decide whether to fall back without string matching.

use thiserror::Error;

/// Errors that can occur when calling a remote grading or generation service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service did not answer within the allotted time.
    #[error("remote call timed out after {0}ms")]
    Timeout(u64),

    /// The service could not be reached or refused the call.
    #[error("remote service unavailable: {0}")]
    Unavailable(String),

    /// The service asked the caller to back off.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The service rejected the credentials it was given.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service answered, but the reply carried no usable payload.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

impl RemoteError {
    /// Returns `true` if retrying the same call cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, RemoteError::AuthenticationFailed(_))
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            RemoteError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
