//! Documentation generation backed by an OpenAI-compatible chat API.
//!
//! [`RigGenerator`] implements [`docweave_core::DocGenerator`] with
//! [Rig](https://github.com/0xPlaygrounds/rig). A fresh client and agent are
//! built for every request from the connection the pipeline passes in, so
//! changes to endpoint, key or model apply to the next fix without a restart.
//!
//! [`ServiceProfile`] describes a named endpoint and can be loaded from the
//! environment or from a TOML file:
//!
//! ```toml
//! [[profiles]]
//! name = "local"
//! api_url = "http://localhost:11434/v1"
//! api_key = "ollama"
//! model_name = "qwen2.5-coder"
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use rig::agent::Agent;
use rig::completion::{Prompt, PromptError};
use rig::providers::openai;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use docweave_core::{Connection, DocGenerator, GenerationError, ServiceSettings, DEFAULT_ENDPOINT};

/// Result type alias for profile loading.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors raised while loading service profiles.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The profile file could not be read.
    #[error("failed to read profile file: {0}")]
    Read(#[from] std::io::Error),

    /// The profile file is not valid TOML.
    #[error("invalid profile TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// No profile with the requested name.
    #[error("profile not found: {name}")]
    NotFound { name: String },
}

// =============================================================================
// Service Profiles
// =============================================================================

/// A named generation endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProfile {
    /// Profile name.
    #[serde(default = "default_profile_name")]
    pub name: String,

    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model or deployment name.
    pub model_name: String,
}

fn default_profile_name() -> String {
    "default".to_string()
}

fn default_api_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl std::fmt::Debug for ServiceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProfile")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

impl ServiceProfile {
    /// Create a new profile.
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model_name: model_name.into(),
        }
    }

    /// Profile for a local Ollama server.
    pub fn ollama(model_name: impl Into<String>) -> Self {
        Self::new("ollama", "http://localhost:11434/v1", "ollama", model_name)
    }

    /// Read a profile from `DOCWEAVE_*` variables, falling back to the
    /// conventional `OPENAI_*` ones.
    ///
    /// Returns `None` unless both a key and a model are set.
    pub fn from_env() -> Option<Self> {
        let api_url = env::var("DOCWEAVE_ENDPOINT")
            .or_else(|_| env::var("OPENAI_API_URL"))
            .unwrap_or_else(|_| default_api_url());
        let api_key = env::var("DOCWEAVE_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .ok()?;
        let model_name = env::var("DOCWEAVE_MODEL")
            .or_else(|_| env::var("OPENAI_MODEL_NAME"))
            .ok()?;

        Some(Self::new("env", api_url, api_key, model_name))
    }

    /// Load every profile of a TOML file.
    pub fn load_from_toml<P: AsRef<Path>>(path: P) -> LlmResult<Vec<Self>> {
        #[derive(Deserialize)]
        struct TomlConfig {
            profiles: Vec<ServiceProfile>,
        }

        let content = fs::read_to_string(path.as_ref())?;
        let config: TomlConfig = toml::from_str(&content)?;
        Ok(config.profiles)
    }

    /// Load the profile called `name` from a TOML file.
    pub fn find_in_toml<P: AsRef<Path>>(path: P, name: &str) -> LlmResult<Self> {
        Self::load_from_toml(path)?
            .into_iter()
            .find(|profile| profile.name == name)
            .ok_or_else(|| LlmError::NotFound {
                name: name.to_string(),
            })
    }

    /// Service settings pointing at this profile.
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings::new(&self.api_key, &self.model_name).with_endpoint(&self.api_url)
    }
}

// =============================================================================
// Generator
// =============================================================================

/// System prompt for the documentation agent.
const SYSTEM_PROMPT: &str = "You write XML documentation comments for C# code. \
Follow the user's instructions exactly and never add commentary outside the code block.";

/// [`DocGenerator`] backed by an OpenAI-compatible chat completion API.
#[derive(Debug, Clone, Default)]
pub struct RigGenerator {
    temperature: Option<f64>,
}

impl RigGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampling temperature for requests.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the agent for one request.
    pub fn agent(&self, connection: &Connection) -> Agent<openai::CompletionModel> {
        let client = create_openai_client(connection);
        let builder = client.agent(&connection.model).preamble(SYSTEM_PROMPT);
        match self.temperature {
            Some(temperature) => builder.temperature(temperature).build(),
            None => builder.build(),
        }
    }
}

#[async_trait]
impl DocGenerator for RigGenerator {
    async fn generate(
        &self,
        connection: &Connection,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let agent = self.agent(connection);
        let started = Instant::now();

        debug!(
            endpoint = %connection.endpoint,
            model = %connection.model,
            "llm_doc_request_start"
        );

        let response = agent.prompt(prompt).await.map_err(classify_error)?;

        debug!(
            model = %connection.model,
            duration_ms = started.elapsed().as_millis() as u64,
            response_len = response.len(),
            "llm_doc_request_complete"
        );

        Ok(response)
    }
}

/// Create an OpenAI-compatible Rig client.
pub fn create_openai_client(connection: &Connection) -> openai::Client {
    openai::Client::from_url(&connection.api_key, &connection.endpoint)
}

fn classify_error(error: PromptError) -> GenerationError {
    let message = error.to_string();
    let lower = message.to_ascii_lowercase();
    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("invalid api key")
    {
        GenerationError::Unauthorized(message)
    } else {
        GenerationError::Request(message)
    }
}
