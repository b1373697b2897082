//! Configuration service implementation.
//!
//! Loads the root configuration from `~/.config/weby/config.toml`.

use crate::paths::WebyPaths;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use weby_core::config::RootConfig;
use weby_core::error::Result;

/// Configuration service that loads and caches the root configuration.
///
/// A missing file yields `RootConfig::default()`; a malformed file is an error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    config_file: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let paths = WebyPaths::new(base_path)?;
        Ok(Self::with_file(paths.config_file()))
    }

    pub fn with_file(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Gets the root configuration, loading from file if not cached.
    pub async fn get_config(&self) -> Result<RootConfig> {
        {
            let cached = self.config.read().await;
            if let Some(ref config) = *cached {
                return Ok(config.clone());
            }
        }

        let loaded = self.load_config().await?;

        let mut cached = self.config.write().await;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub async fn invalidate_cache(&self) {
        let mut cached = self.config.write().await;
        *cached = None;
    }

    /// Writes `config` to disk and refreshes the cache.
    pub async fn save_config(&self, config: &RootConfig) -> Result<()> {
        if let Some(parent) = self.config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(config)?;
        tokio::fs::write(&self.config_file, content).await?;

        let mut cached = self.config.write().await;
        *cached = Some(config.clone());
        Ok(())
    }

    async fn load_config(&self) -> Result<RootConfig> {
        match tokio::fs::read_to_string(&self.config_file).await {
            Ok(content) => {
                let config: RootConfig = toml::from_str(&content)?;
                tracing::debug!(path = %self.config_file.display(), "loaded config");
                Ok(config)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.config_file.display(), "config file not found, using defaults");
                Ok(RootConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use weby_core::config::{ChatConfig, DEFAULT_GREETING};

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(Some(temp_dir.path())).unwrap();

        let config = service.get_config().await.unwrap();
        assert_eq!(config, RootConfig::default());
        assert!(!service.config_file().exists());
    }

    #[tokio::test]
    async fn test_reads_chat_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[chat]\nfallback_message = \"Call +91 8690787870\"\nrequest_timeout_secs = 15\n",
        )
        .unwrap();

        let config = ConfigService::with_file(&path).get_config().await.unwrap();
        assert_eq!(config.chat.fallback_message, "Call +91 8690787870");
        assert_eq!(config.chat.request_timeout_secs, 15);
        assert_eq!(config.chat.greeting, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[chat\nmodel = ").unwrap();

        let err = ConfigService::with_file(&path).get_config().await.unwrap_err();
        assert!(err.is_serialization());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("weby");
        let service = ConfigService::new(Some(base.as_path())).unwrap();

        let config = RootConfig {
            chat: ChatConfig::default().with_greeting("Welcome!"),
        };
        service.save_config(&config).await.unwrap();
        service.invalidate_cache().await;

        assert_eq!(service.get_config().await.unwrap().chat.greeting, "Welcome!");
    }
}
