//! Generation client interface.
//!
//! The session depends only on this trait; `weby-interaction` provides the
//! Gemini implementation.

use super::turn::Turn;
use std::time::Duration;
use thiserror::Error;

/// Why a generation call did not produce usable text.
///
/// The session recovers every variant the same way; the distinction exists
/// for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// Request never reached the endpoint or the connection broke.
    #[error("transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// No API key is configured.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Response decoded but carried no text.
    #[error("response contained no text")]
    EmptyPayload,

    /// The call did not settle within the configured limit.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The client panicked or its task was aborted.
    #[error("generation task aborted: {0}")]
    Aborted(String),
}

/// External text-generation collaborator.
#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generates a reply to `new_message`.
    ///
    /// `history` holds every turn that preceded `new_message`, oldest first,
    /// starting with the greeting.
    async fn generate(
        &self,
        new_message: &str,
        history: &[Turn],
    ) -> Result<String, GenerationFailure>;
}
