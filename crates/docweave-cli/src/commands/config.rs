//! Config command implementation.
//!
//! `show` and `get` report the effective configuration (file, profile and
//! environment combined); `set` and `reset` only touch the config file.

use anyhow::{Context, Result};

use docweave_core::OverridesBehavior;

use crate::config::{parse_bool, Config};

const KEYS: &str = "endpoint, api-key, model, overrides, literal-constants, profile";

fn masked(key: Option<&str>) -> String {
    key.map(|k| format!("{}...", &k[..k.char_indices().nth(6).map_or(k.len(), |(i, _)| i)]))
        .unwrap_or_else(|| "(not set)".to_string())
}

fn or_unset(value: Option<&str>) -> String {
    value.unwrap_or("(not set)").to_string()
}

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    let settings = &config.settings;
    println!("docweave configuration");
    println!("{:-<40}", "");

    println!("Endpoint:           {}", or_unset(settings.service.endpoint.as_deref()));
    println!("API Key:            {}", masked(settings.service.api_key.as_deref()));
    println!("Model:              {}", or_unset(settings.service.model.as_deref()));
    println!("Overrides:          {}", settings.overrides);
    println!("Literal Constants:  {}", settings.use_value_for_literal_constants);
    println!("Profile:            {}", or_unset(config.profile.as_deref()));

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value in the config file.
pub fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_file()?;
    let settings = &mut config.settings;

    match key {
        "endpoint" => {
            settings.service.endpoint = Some(value.to_string());
            println!("Set endpoint to: {}", value);
        }
        "api-key" | "key" => {
            settings.service.api_key = Some(value.to_string());
            println!("Set api-key");
            println!("Key stored in config file. For better security, use the DOCWEAVE_API_KEY env var.");
        }
        "model" | "deployment" => {
            settings.service.model = Some(value.to_string());
            println!("Set model to: {}", value);
        }
        "overrides" => {
            settings.overrides = value.parse::<OverridesBehavior>().map_err(anyhow::Error::msg)?;
            println!("Set overrides to: {}", settings.overrides);
        }
        "literal-constants" => {
            settings.use_value_for_literal_constants =
                parse_bool(value).context("Invalid value for literal-constants")?;
            println!("Set literal-constants to: {}", settings.use_value_for_literal_constants);
        }
        "profile" => {
            config.profile = Some(value.to_string());
            println!("Set profile to: {}", value);
        }
        _ => {
            anyhow::bail!("Unknown config key: {}. Valid keys: {}", key, KEYS);
        }
    }

    config.save()?;
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    let settings = &config.settings;
    let value = match key {
        "endpoint" => or_unset(settings.service.endpoint.as_deref()),
        "api-key" | "key" => masked(settings.service.api_key.as_deref()),
        "model" | "deployment" => or_unset(settings.service.model.as_deref()),
        "overrides" => settings.overrides.to_string(),
        "literal-constants" => settings.use_value_for_literal_constants.to_string(),
        "profile" => or_unset(config.profile.as_deref()),
        _ => {
            anyhow::bail!("Unknown config key: {}. Valid keys: {}", key, KEYS);
        }
    };

    println!("{}", value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults");
    Ok(())
}

/// Print the config file location.
pub fn path() -> Result<()> {
    match Config::config_file_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("(no config directory available)"),
    }
    Ok(())
}
