//! Settings consumed by the pipeline.
//!
//! The pipeline only ever reads settings. A session shares one logical
//! [`Settings`] value through [`SharedSettings`], which hands out immutable
//! snapshots so concurrent analysis never observes a half-applied update.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// What to do with undocumented overrides and interface implementations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverridesBehavior {
    /// Insert `/// <inheritdoc />`.
    #[default]
    UseInheritDoc,
    /// Do not report or document them at all.
    DoNotDocument,
    /// Treat them like any other member and ask the generation service.
    Synthesize,
}

impl OverridesBehavior {
    /// Stable textual form, matching the serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverridesBehavior::UseInheritDoc => "use-inherit-doc",
            OverridesBehavior::DoNotDocument => "do-not-document",
            OverridesBehavior::Synthesize => "synthesize",
        }
    }
}

impl fmt::Display for OverridesBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverridesBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "use-inherit-doc" | "inheritdoc" | "inherit-doc" => Ok(Self::UseInheritDoc),
            "do-not-document" | "skip" | "none" => Ok(Self::DoNotDocument),
            "synthesize" | "generate" | "gpt" => Ok(Self::Synthesize),
            other => Err(format!(
                "unknown overrides behavior '{}' (expected use-inherit-doc, do-not-document or synthesize)",
                other
            )),
        }
    }
}

/// Service settings that must be present before a request is sent, named
/// in messages and inline markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Setting {
    Endpoint,
    ApiKey,
    ModelOrDeploymentName,
}

impl Setting {
    /// Display name of the setting.
    pub fn name(&self) -> &'static str {
        match self {
            Setting::Endpoint => "Endpoint",
            Setting::ApiKey => "ApiKey",
            Setting::ModelOrDeploymentName => "ModelOrDeploymentName",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connection parameters for the generation service.
///
/// The pipeline treats these as opaque; it only checks that they are present.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_endpoint")]
    pub endpoint: Option<String>,

    /// API key for authentication.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model (or deployment) name.
    #[serde(default)]
    pub model: Option<String>,
}

fn default_endpoint() -> Option<String> {
    Some(DEFAULT_ENDPOINT.to_string())
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: None,
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .finish()
    }
}

impl ServiceSettings {
    /// Settings pointing at the default endpoint with the given key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: Some(api_key.into()),
            model: Some(model.into()),
        }
    }

    /// Override the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Validate the settings, naming the first missing one.
    ///
    /// The model is checked first, then the key, then the endpoint.
    pub fn connection(&self) -> Result<Connection, Setting> {
        let model = present(&self.model).ok_or(Setting::ModelOrDeploymentName)?;
        let api_key = present(&self.api_key).ok_or(Setting::ApiKey)?;
        let endpoint = present(&self.endpoint).ok_or(Setting::Endpoint)?;

        Ok(Connection {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Validated connection parameters handed to a generator.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Everything the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Policy for overrides and explicit interface implementations.
    #[serde(default)]
    pub overrides: OverridesBehavior,

    /// Use the literal value as summary for `const` fields with literal initializers.
    #[serde(default = "default_true")]
    pub use_value_for_literal_constants: bool,

    /// Generation service connection.
    #[serde(default)]
    pub service: ServiceSettings,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overrides: OverridesBehavior::default(),
            use_value_for_literal_constants: true,
            service: ServiceSettings::default(),
        }
    }
}

impl Settings {
    /// Set the overrides behavior.
    pub fn with_overrides(mut self, overrides: OverridesBehavior) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set whether literal constants are summarized by their value.
    pub fn with_literal_constants(mut self, enabled: bool) -> Self {
        self.use_value_for_literal_constants = enabled;
        self
    }

    /// Set the service connection.
    pub fn with_service(mut self, service: ServiceSettings) -> Self {
        self.service = service;
        self
    }
}

/// Read-mostly handle to the session's settings.
///
/// Readers get an `Arc` snapshot; writers swap the whole value.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Arc<Settings>>>,
}

impl SharedSettings {
    /// Wrap an initial settings value.
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// Current settings.
    pub fn snapshot(&self) -> Arc<Settings> {
        self.inner.read().clone()
    }

    /// Replace the settings wholesale.
    pub fn replace(&self, settings: Settings) {
        *self.inner.write() = Arc::new(settings);
    }

    /// Apply a change to a copy of the current settings and publish it.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) {
        let mut guard = self.inner.write();
        let mut next = Settings::clone(&guard);
        change(&mut next);
        *guard = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_are_reported_in_order() {
        let mut service = ServiceSettings::default();
        assert_eq!(service.connection(), Err(Setting::ModelOrDeploymentName));

        service.model = Some("gpt-4o-mini".to_string());
        assert_eq!(service.connection(), Err(Setting::ApiKey));

        service.api_key = Some("   ".to_string());
        assert_eq!(service.connection(), Err(Setting::ApiKey));

        service.api_key = Some("key".to_string());
        service.endpoint = None;
        assert_eq!(service.connection(), Err(Setting::Endpoint));
    }

    #[test]
    fn test_connection_trims_endpoint() {
        let service = ServiceSettings::new("key", "model").with_endpoint("http://localhost:11434/v1/");
        let connection = service.connection().unwrap();
        assert_eq!(connection.endpoint, "http://localhost:11434/v1");
        assert_eq!(connection.model, "model");
    }

    #[test]
    fn test_debug_masks_api_key() {
        let service = ServiceSettings::new("sk-secret", "model");
        let rendered = format!("{:?}", service);
        assert!(!rendered.contains("sk-secret"));

        let connection = service.connection().unwrap();
        assert!(!format!("{:?}", connection).contains("sk-secret"));
    }

    #[test]
    fn test_overrides_behavior_parse() {
        assert_eq!(
            "use-inherit-doc".parse::<OverridesBehavior>().unwrap(),
            OverridesBehavior::UseInheritDoc
        );
        assert_eq!(
            "DO_NOT_DOCUMENT".parse::<OverridesBehavior>().unwrap(),
            OverridesBehavior::DoNotDocument
        );
        assert_eq!(
            "synthesize".parse::<OverridesBehavior>().unwrap(),
            OverridesBehavior::Synthesize
        );
        assert!("sometimes".parse::<OverridesBehavior>().is_err());
    }

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.service.endpoint.as_deref(), Some(DEFAULT_ENDPOINT));
    }

    #[test]
    fn test_shared_settings_snapshots_are_stable() {
        let shared = SharedSettings::new(Settings::default());
        let before = shared.snapshot();

        shared.update(|s| s.overrides = OverridesBehavior::DoNotDocument);

        assert_eq!(before.overrides, OverridesBehavior::UseInheritDoc);
        assert_eq!(shared.snapshot().overrides, OverridesBehavior::DoNotDocument);
    }
}
