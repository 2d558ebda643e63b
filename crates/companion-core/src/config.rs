use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result, anyhow};

use crate::ai::groq::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub default_model: Option<String>,
    pub groq_api_key: Option<String>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        tracing::debug!(path = %config_path.display(), "config saved");
        Ok(())
    }

    pub fn save_default_model(model: &str) -> Result<()> {
        Self::save_default_model_to(&Self::get_config_path()?, model)
    }

    pub fn save_default_model_to(config_path: &Path, model: &str) -> Result<()> {
        let mut config = Self::load_from(config_path).unwrap_or_else(|_| Self::new());
        config.default_model = Some(model.to_string());
        config.save_to(config_path)
    }

    pub fn save_api_key(key: &str) -> Result<()> {
        Self::save_api_key_to(&Self::get_config_path()?, key)
    }

    /// Store `key` in the file at `config_path`, keeping its other fields
    pub fn save_api_key_to(config_path: &Path, key: &str) -> Result<()> {
        let mut config = Self::load_from(config_path).unwrap_or_else(|_| Self::new());
        config.groq_api_key = Some(key.to_string());
        config.save_to(config_path)
    }

    /// API key from the environment first, then the config file
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.groq_api_key.clone())
    }

    /// Where the API key comes from: "env", "config", or None
    pub fn key_source(&self) -> Option<&'static str> {
        self.key_source_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn key_source_with_env(&self, env_key: Option<String>) -> Option<&'static str> {
        if env_key.is_some_and(|k| !k.trim().is_empty()) {
            Some("env")
        } else if self.groq_api_key.is_some() {
            Some("config")
        } else {
            None
        }
    }

    pub fn model(&self) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("code-companion").join("config.json"))
    }
}

/// Load `.env` from the working directory if present. Existing environment
/// variables win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.temperature(), DEFAULT_TEMPERATURE);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            default_model: Some("some-model".to_string()),
            groq_api_key: Some("gsk_test".to_string()),
            temperature: Some(0.7),
            base_url: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.model(), "some-model");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_saving_key_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::save_default_model_to(&path, "some-model").unwrap();
        Config::save_api_key_to(&path, "gsk_saved").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.groq_api_key.as_deref(), Some("gsk_saved"));
        assert_eq!(loaded.default_model.as_deref(), Some("some-model"));
    }

    #[test]
    fn test_env_key_wins_over_config() {
        let config = Config {
            groq_api_key: Some("from-config".to_string()),
            ..Config::new()
        };
        assert_eq!(
            config.api_key_with_env(Some("from-env".to_string())).as_deref(),
            Some("from-env")
        );
        assert_eq!(config.key_source_with_env(Some("from-env".to_string())), Some("env"));

        assert_eq!(config.api_key_with_env(None).as_deref(), Some("from-config"));
        assert_eq!(config.key_source_with_env(Some("  ".to_string())), Some("config"));
        assert_eq!(Config::new().key_source_with_env(None), None);
    }
}
