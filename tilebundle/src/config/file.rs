//! Configuration file handling for ~/.tilebundle/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`], parsing in [`super::parser`], and serialization in
//! [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{ENV_ACCESS_KEY, ENV_SECRET_KEY};
use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilebundle/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path, applying environment
    /// credential overrides.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        Self::load_from_with_env(path, |name| std::env::var(name).ok())
    }

    /// Like [`load_from`](Self::load_from) with an explicit variable lookup.
    pub fn load_from_with_env<F>(path: &Path, lookup: F) -> Result<Self, ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            let ini = Ini::load_from_file(path)?;
            super::parser::parse_ini(&ini)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(lookup);
        Ok(config)
    }

    /// Replaces credentials with non-empty environment values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_ACCESS_KEY) {
            self.store.access_key = Some(v.trim().to_string());
        }
        if let Some(v) = non_empty(ENV_SECRET_KEY) {
            self.store.secret_key = Some(v.trim().to_string());
        }
    }

    /// Save configuration to the default path (~/.tilebundle/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        Self::ensure_exists_at(&path)?;
        Ok(path)
    }

    /// Writes defaults to `path` unless a file is already there.
    pub fn ensure_exists_at(path: &Path) -> Result<(), ConfigFileError> {
        if !path.exists() {
            Self::default().save_to(path)?;
        }
        Ok(())
    }
}

/// Get the path to the config directory (~/.tilebundle).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilebundle")
}

/// Get the path to the config file (~/.tilebundle/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from_with_env(&config_path, |_| None).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_env_overrides_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[store]\naccess_key = from-file\nsecret_key = file-secret\n",
        )
        .unwrap();

        let config = ConfigFile::load_from_with_env(&config_path, |name| match name {
            ENV_SECRET_KEY => Some("env-secret".to_string()),
            ENV_ACCESS_KEY => Some("  ".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.store.access_key.as_deref(), Some("from-file"));
        assert_eq!(config.store.secret_key.as_deref(), Some("env-secret"));
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[preload]\nchunk_size = many\n").unwrap();

        let err = ConfigFile::load_from_with_env(&config_path, |_| None).unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { .. }));
        assert!(err.to_string().contains("preload.chunk_size"));
    }

    #[test]
    fn test_ensure_exists_at_keeps_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.ini");

        ConfigFile::ensure_exists_at(&config_path).unwrap();
        assert!(config_path.exists());

        std::fs::write(&config_path, "[store]\nbucket = custom\n").unwrap();
        ConfigFile::ensure_exists_at(&config_path).unwrap();
        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("custom"));
    }

    #[test]
    fn test_config_path_layout() {
        let path = config_file_path();
        assert!(path.ends_with(".tilebundle/config.ini"));
    }
}
