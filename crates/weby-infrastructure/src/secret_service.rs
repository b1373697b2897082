//! Secret service implementation.
//!
//! Reads API keys from secret.json. `GEMINI_API_KEY` (or `API_KEY`) in the
//! environment takes precedence over the file.

use crate::paths::WebyPaths;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use weby_core::config::{GeminiConfig, SecretConfig};
use weby_core::error::Result;
use weby_core::secret::SecretService;

/// Environment variables consulted for the Gemini key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Service for loading secret configuration.
///
/// The file is read once and cached.
///
/// # Example
///
/// ```ignore
/// use weby_infrastructure::SecretServiceImpl;
/// use weby_core::secret::SecretService;
///
/// let service = SecretServiceImpl::new(None)?;
/// let key = service.gemini_api_key().await?;
/// ```
#[derive(Clone)]
pub struct SecretServiceImpl {
    secret_file: PathBuf,
    env_api_key: Option<String>,
    /// Cached secret config loaded from disk.
    secrets: Arc<RwLock<Option<SecretConfig>>>,
}

impl SecretServiceImpl {
    /// Creates a service for `<base>/secret.json` (default `~/.config/weby`).
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let paths = WebyPaths::new(base_path)?;
        Ok(Self::with_file(paths.secret_file()).with_env_api_key(api_key_from_env()))
    }

    /// Creates a service for an explicit file, ignoring the environment.
    pub fn with_file(secret_file: impl Into<PathBuf>) -> Self {
        Self {
            secret_file: secret_file.into(),
            env_api_key: None,
            secrets: Arc::new(RwLock::new(None)),
        }
    }

    /// Overrides the key taken from the environment.
    pub fn with_env_api_key(mut self, api_key: Option<String>) -> Self {
        self.env_api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn secret_file(&self) -> &Path {
        &self.secret_file
    }

    async fn read_file(&self) -> Result<SecretConfig> {
        match tokio::fs::read_to_string(&self.secret_file).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.secret_file.display(), "secret file not found");
                Ok(SecretConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn apply_env(&self, mut secrets: SecretConfig) -> SecretConfig {
        if let Some(api_key) = &self.env_api_key {
            let model_name = secrets.gemini.and_then(|gemini| gemini.model_name);
            secrets.gemini = Some(GeminiConfig {
                api_key: api_key.clone(),
                model_name,
            });
        }
        secrets
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig> {
        {
            let cached = self.secrets.read().await;
            if let Some(ref secrets) = *cached {
                return Ok(secrets.clone());
            }
        }

        let loaded = self.apply_env(self.read_file().await?);

        let mut cached = self.secrets.write().await;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    async fn secret_file_exists(&self) -> bool {
        tokio::fs::try_exists(&self.secret_file).await.unwrap_or(false)
    }
}

/// First non-empty key from [`API_KEY_ENV_VARS`].
pub fn api_key_from_env() -> Option<String> {
    api_key_from(|name| std::env::var(name).ok())
}

/// First non-empty value `lookup` returns for [`API_KEY_ENV_VARS`], in order.
fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .find(|value| !value.trim().is_empty())
}
