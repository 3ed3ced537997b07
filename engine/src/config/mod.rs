//! Configuration management
//!
//! This module handles loading, validation, and management of the Brandloom
//! configuration. Configuration is stored in TOML format at
//! ~/.brandloom/config.toml and is created with defaults on first run.
//!
//! # Configuration Sections
//!
//! - **core**: data directory and log level
//! - **llm**: generation provider endpoint, model and API-key source
//! - **server**: HTTP bind address
//!
//! The generation API key itself is never stored in the file; the config
//! names the environment variable it is read from.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    pub core: CoreConfig,

    /// Generation provider configuration
    pub llm: LlmConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

/// Core engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Directory holding the SQLite database
    pub data_dir: PathBuf,

    /// Default log level when RUST_LOG is not set
    pub log_level: String,
}

/// Generation provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible chat-completions API
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Sampling temperature
    pub temperature: f32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API server binds to
    pub bind_addr: String,
}

impl Config {
    /// Default configuration, written on first run
    pub fn default_config() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            core: CoreConfig {
                data_dir: home.join(".brandloom"),
                log_level: "info".to_string(),
            },
            llm: LlmConfig {
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                api_key_env: "GROQ_API_KEY".to_string(),
                temperature: 0.7,
            },
            server: ServerConfig {
                bind_addr: "127.0.0.1:3000".to_string(),
            },
        }
    }

    /// Default config file location: ~/.brandloom/config.toml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".brandloom")
            .join("config.toml")
    }

    /// Load the configuration from the default location, writing defaults
    /// first if no file exists yet
    pub fn load_or_create() -> Result<Self> {
        let path = Self::default_path();

        if !path.exists() {
            let config = Self::default_config();
            config.save_to_path(&path)?;
            return Ok(config);
        }

        Self::load_from_path(&path)
    }

    /// Load the configuration from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Serialize and write the configuration to `path`
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let rendered = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, rendered)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.core.data_dir.join("brandloom.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert!(config.llm.base_url.starts_with("https://api.groq.com"));
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default_config();
        let rendered = toml::to_string(&config).unwrap();

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
        assert_eq!(parsed.core.data_dir, config.core.data_dir);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default_config();
        config.llm.model = "test-model".to_string();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.llm.model, "test-model");
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn test_db_path_is_under_data_dir() {
        let config = Config::default_config();
        assert!(config.db_path().starts_with(&config.core.data_dir));
    }
}
