//! Secret management service trait.
//!
//! Defines the interface for loading the API key configuration.

use crate::config::SecretConfig;
use crate::error::Result;

/// Service for loading secret configuration.
///
/// Implementations must never log or embed the key itself in error messages.
#[async_trait::async_trait]
pub trait SecretService: Send + Sync {
    /// Loads the secret configuration.
    async fn load_secrets(&self) -> Result<SecretConfig>;

    /// Checks if the secret file exists.
    async fn secret_file_exists(&self) -> bool;

    /// Returns the Gemini API key, if one is configured and non-empty.
    async fn gemini_api_key(&self) -> Result<Option<String>> {
        let secrets = self.load_secrets().await?;
        Ok(secrets
            .gemini
            .map(|gemini| gemini.api_key)
            .filter(|key| !key.trim().is_empty()))
    }
}
