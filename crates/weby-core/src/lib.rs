pub mod chat;
pub mod config;
pub mod error;
pub mod secret;
pub mod site;

// Re-export common error type
pub use error::WebyError;

pub use chat::{ChatSession, GenerationClient, GenerationFailure, SessionState, SubmitOutcome};
