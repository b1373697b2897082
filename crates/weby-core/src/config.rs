//! Configuration models.
//!
//! `RootConfig` mirrors `~/.config/weby/config.toml`, `SecretConfig` mirrors
//! `~/.config/weby/secret.json`. Loading lives in `weby-infrastructure`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Greeting shown as the first assistant turn of every session.
pub const DEFAULT_GREETING: &str = "Hi there! 👋 I'm Weby AI, your guide to digital growth. Ask me how Webhub can transform your business, or let's chat about your project ideas!";

/// Reply substituted when the generation call fails for any reason.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "I'm experiencing a temporary connection issue. Please feel free to reach us directly on WhatsApp at +91 9033281960!";

/// Reply substituted when the generation call succeeds with blank text.
pub const DEFAULT_EMPTY_REPLY_MESSAGE: &str = "I'm sorry, I couldn't generate a response.";

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default upper bound for a single generation call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Settings for a chat session and its generation client.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ChatConfig {
    /// Gemini model name.
    pub model: String,
    /// Seed turn of every transcript.
    pub greeting: String,
    /// Assistant reply used when generation fails.
    pub fallback_message: String,
    /// Assistant reply used when generation returns blank text.
    pub empty_reply_message: String,
    /// Per-request timeout in seconds. `0` disables the timeout.
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            empty_reply_message: DEFAULT_EMPTY_REPLY_MESSAGE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ChatConfig {
    /// Timeout for one generation call, `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Greeting used to seed a transcript; blank values fall back to
    /// [`DEFAULT_GREETING`].
    pub fn effective_greeting(&self) -> &str {
        if self.greeting.trim().is_empty() {
            DEFAULT_GREETING
        } else {
            &self.greeting
        }
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}

/// Root configuration structure for secret.json
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}
