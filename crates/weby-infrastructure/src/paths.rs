//! Unified path management for weby configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/weby/
//! ├── config.toml      # Chat settings
//! └── secret.json      # API keys
//! ```

use std::path::{Path, PathBuf};
use weby_core::config::{GeminiConfig, SecretConfig};
use weby_core::error::{Result, WebyError};

/// Resolves weby's configuration files.
///
/// A base directory may be supplied (tests, `--config-dir`); otherwise the
/// files live under `~/.config/weby`.
#[derive(Debug, Clone)]
pub struct WebyPaths {
    config_dir: PathBuf,
}

impl WebyPaths {
    pub fn new(base_path: Option<&Path>) -> Result<Self> {
        let config_dir = match base_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_dir()?,
        };
        Ok(Self { config_dir })
    }

    /// Returns `~/.config/weby`.
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| WebyError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("weby"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path to config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Returns the path to secret.json
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file(&self) -> PathBuf {
        self.config_dir.join("secret.json")
    }

    /// Ensures the secret file exists, creating it with a template if it doesn't.
    ///
    /// The template leaves `model_name` unset so `[chat] model` in config.toml
    /// stays in effect. On Unix the new file is created with mode 600.
    pub fn ensure_secret_file(&self) -> Result<PathBuf> {
        let secret_path = self.secret_file();

        if secret_path.exists() {
            return Ok(secret_path);
        }

        std::fs::create_dir_all(&self.config_dir)?;

        let template_config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: None,
            }),
        };
        let template_json = serde_json::to_string_pretty(&template_config)?;
        std::fs::write(&secret_path, template_json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        Ok(secret_path)
    }
}
