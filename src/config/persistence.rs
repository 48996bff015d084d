use crate::config::{AppConfig, get_config_dir};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config directory not found")]
    NoConfigDir,
}

/// Partial config update; `None` fields leave the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub base_url: Option<String>,
    pub user: Option<String>,
}

impl ConfigPatch {
    /// Patch that stores the display name sent with each question.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            user: Some(name.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn base_url(url: impl Into<String>) -> Self {
        Self {
            base_url: Some(url.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base_url.is_none() && self.user.is_none()
    }
}

pub struct ConfigPersister {
    config_path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigPersister {
    #[must_use]
    pub fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_default_path() -> Option<Self> {
        get_config_dir().map(|dir| Self::new(dir.join("config.toml")))
    }

    pub fn apply_patch(&self, patch: &ConfigPatch) -> ConfigResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let _lock = self.write_lock.lock();

        let existing = self.read_existing_config()?;
        let merged = Self::merge_config(existing, patch);

        self.atomic_write(&merged)
    }

    fn read_existing_config(&self) -> ConfigResult<AppConfig> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(AppConfig::default())
        }
    }

    fn merge_config(mut existing: AppConfig, patch: &ConfigPatch) -> AppConfig {
        if let Some(ref base_url) = patch.base_url {
            existing.base_url = Some(base_url.clone());
        }
        if let Some(ref user) = patch.user {
            existing.user = Some(user.clone());
        }
        existing
    }

    fn atomic_write(&self, config: &AppConfig) -> ConfigResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(config)?;
        let content = format!(
            "# Bassam client configuration\n\
             # This file is automatically managed by bassam.\n\n\
             {toml_content}"
        );

        let temp_path = self.config_path.with_extension("toml.tmp");
        fs::write(&temp_path, &content)?;

        fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_patch_user() {
        let patch = ConfigPatch::user("sara");
        assert_eq!(patch.user, Some("sara".to_string()));
        assert!(patch.base_url.is_none());
    }

    #[test]
    fn test_config_patch_is_empty() {
        assert!(ConfigPatch::default().is_empty());
        assert!(!ConfigPatch::user("sara").is_empty());
    }

    #[test]
    fn test_persister_apply_patch() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");

        let persister = ConfigPersister::new(config_path.clone());

        persister
            .apply_patch(&ConfigPatch::user("sara"))
            .expect("Failed to apply patch");

        let content = fs::read_to_string(&config_path).expect("Failed to read config");
        assert!(content.contains("user = \"sara\""));

        persister
            .apply_patch(&ConfigPatch::base_url("http://box:9000"))
            .expect("Failed to apply second patch");

        let content = fs::read_to_string(&config_path).expect("Failed to read config");
        assert!(content.contains("user = \"sara\""));
        assert!(content.contains("base_url = \"http://box:9000\""));
    }

    #[test]
    fn test_persister_empty_patch_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");

        let persister = ConfigPersister::new(config_path.clone());

        persister
            .apply_patch(&ConfigPatch::default())
            .expect("Failed to apply empty patch");

        assert!(!config_path.exists());
    }
}
