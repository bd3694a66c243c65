//! CLI configuration management.
//!
//! Precedence, lowest first: defaults, the config file, a named service
//! profile, environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use docweave_core::{OverridesBehavior, Settings};
use docweave_llm::ServiceProfile;

/// Overrides the config file location.
pub const CONFIG_PATH_VAR: &str = "DOCWEAVE_CONFIG";

/// Overrides the service profile file location.
pub const PROFILES_PATH_VAR: &str = "DOCWEAVE_PROFILES";

/// Application-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Pipeline settings.
    #[serde(flatten)]
    pub settings: Settings,

    /// Service profile applied on load, from the profiles file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Config {
    /// Load configuration from the config file, profile and environment.
    ///
    /// `profile` takes precedence over the profile named in the file.
    pub fn load(profile: Option<&str>) -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let mut config = Self::load_file()?;

        if let Some(name) = profile.map(str::to_string).or_else(|| config.profile.clone()) {
            let path = Self::profiles_file_path()
                .context("No profiles file location; set DOCWEAVE_PROFILES")?;
            let profile = ServiceProfile::find_in_toml(&path, &name)
                .with_context(|| format!("Failed to load profile '{}' from {}", name, path.display()))?;
            config.settings.service = profile.service_settings();
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Load only what is stored in the config file (defaults if there is none).
    pub fn load_file() -> Result<Self> {
        let Some(config_path) = Self::config_file_path() else {
            return Ok(Self::default());
        };
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Environment variables override everything else.
    fn apply_env(&mut self) -> Result<()> {
        let service = &mut self.settings.service;
        if let Some(endpoint) = first_var(&["DOCWEAVE_ENDPOINT", "OPENAI_API_URL"]) {
            service.endpoint = Some(endpoint);
        }
        if let Some(api_key) = first_var(&["DOCWEAVE_API_KEY", "OPENAI_API_KEY"]) {
            service.api_key = Some(api_key);
        }
        if let Some(model) = first_var(&["DOCWEAVE_MODEL", "OPENAI_MODEL_NAME"]) {
            service.model = Some(model);
        }
        if let Some(overrides) = first_var(&["DOCWEAVE_OVERRIDES"]) {
            self.settings.overrides = overrides
                .parse::<OverridesBehavior>()
                .map_err(anyhow::Error::msg)
                .context("Invalid DOCWEAVE_OVERRIDES")?;
        }
        if let Some(literal) = first_var(&["DOCWEAVE_LITERAL_CONSTANTS"]) {
            self.settings.use_value_for_literal_constants =
                parse_bool(&literal).context("Invalid DOCWEAVE_LITERAL_CONSTANTS")?;
        }
        Ok(())
    }

    /// Save current configuration to the config file.
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_file_path() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&config_path, contents)
                .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        }
        Ok(())
    }

    /// Get the path to the config file.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("dev", "docweave", "dw").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Get the path to the service profiles file.
    pub fn profiles_file_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(PROFILES_PATH_VAR) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("dev", "docweave", "dw")
            .map(|dirs| dirs.config_dir().join("profiles.toml"))
    }
}

fn first_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Parse the usual spellings of a boolean flag.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected true or false, got '{}'", other),
    }
}
