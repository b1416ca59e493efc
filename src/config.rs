use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::controller::ControllerOptions;
use crate::markup::MarkupPolicy;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_WELCOME: &str = "Hello! Ask me anything.";
pub const URL_ENV: &str = "CHAT_PANEL_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub markup: Option<MarkupPolicy>,
    pub single_flight: Option<bool>,
    pub welcome: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: None,
            markup: None,
            single_flight: None,
            welcome: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
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
        Ok(())
    }

    pub fn save_base_url(url: &str) -> Result<PathBuf> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.base_url = Some(url.to_string());
        config.save()?;
        Self::get_config_path()
    }

    /// Backend URL: environment first, then the config file, then the default.
    pub fn resolve_base_url(&self, env_url: Option<String>) -> String {
        env_url
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn welcome_text(&self) -> &str {
        self.welcome.as_deref().unwrap_or(DEFAULT_WELCOME)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            markup: self.markup.unwrap_or_default(),
            single_flight: self.single_flight.unwrap_or(false),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chat-panel").join("config.json"))
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
        assert_eq!(config.resolve_base_url(None), DEFAULT_BASE_URL);
        assert_eq!(config.controller_options().markup, MarkupPolicy::Escaped);
        assert!(!config.controller_options().single_flight);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            base_url: Some("http://chat.local:8080".to_string()),
            markup: Some(MarkupPolicy::Raw),
            single_flight: Some(true),
            welcome: None,
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.controller_options().markup, MarkupPolicy::Raw);
        assert!(loaded.controller_options().single_flight);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"markup": "raw"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.markup, Some(MarkupPolicy::Raw));
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn test_env_url_wins() {
        let config = Config {
            base_url: Some("http://from-file".to_string()),
            ..Config::new()
        };
        assert_eq!(
            config.resolve_base_url(Some("http://from-env".to_string())),
            "http://from-env"
        );
        assert_eq!(config.resolve_base_url(Some("  ".to_string())), "http://from-file");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
