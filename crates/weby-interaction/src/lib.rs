//! Generation clients for Weby.

pub mod gemini_api_agent;
pub mod prompt;

pub use gemini_api_agent::GeminiApiAgent;
pub use prompt::{AGENCY_PROFILE, AssistantPersona};
