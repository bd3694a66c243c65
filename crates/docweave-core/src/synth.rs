//! Comment synthesis.
//!
//! Turns a classified declaration into documentation text. Inherit-doc and
//! value summaries come from fixed templates; everything else is delegated
//! to a [`DocGenerator`], raced against a cancellation token.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::{Connection, Setting, Settings};
use crate::policy::Category;
use crate::syntax::SourceDocument;
use crate::walker::Declaration;

/// Instructions sent ahead of every declaration.
pub const PROMPT_PREAMBLE: &str = "You are a C# documentation assistant. \
Write the XML documentation comment for the C# declaration below.\n\
- If the code is not a complete C# type or member declaration, return nothing.\n\
- For a field, constant or variable, describe what it represents from its name and value; \
do not write \"gets or sets\".\n\
- If you are unsure what the declaration does, return `/// <summary />`.\n\
- Answer only with the XML documentation comment lines (each starting with `///`), \
wrapped in a single ``` code block.";

/// Failure reported by a generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service could not be reached or returned an error.
    #[error("request failed: {0}")]
    Request(String),

    /// The service rejected the credentials.
    #[error("authentication rejected: {0}")]
    Unauthorized(String),
}

/// A text-generation backend.
///
/// Implementations receive validated connection parameters on every call, so
/// settings changes take effect on the next request.
#[async_trait]
pub trait DocGenerator: Send + Sync {
    async fn generate(
        &self,
        connection: &Connection,
        prompt: &str,
    ) -> Result<String, GenerationError>;
}

/// Result of synthesizing one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Comment text, one `\n`-terminated line per comment line. May be empty.
    Success(String),
    Cancelled,
    /// A required service setting is absent; nothing was sent.
    ConfigurationMissing(Setting),
    /// The service failed.
    ServiceError(String),
}

/// `/// <inheritdoc />`
pub fn inherit_doc() -> String {
    "/// <inheritdoc />\n".to_string()
}

/// Summary made of a literal constant's value.
pub fn value_summary(value: &str) -> String {
    format!("/// <summary>{}</summary>\n", value)
}

/// Plain comment inserted in place of documentation when a service setting
/// is missing.
pub fn missing_setting_marker(setting: Setting) -> String {
    format!(
        "// Missing {} - configure the generation service (docweave config set ...) and try again.\n",
        setting
    )
}

/// Full prompt for a declaration's source text.
pub fn build_prompt(source: &str) -> String {
    format!("{}\n\n```csharp\n{}\n```", PROMPT_PREAMBLE, source.trim_end())
}

/// Extract the comment from a service response.
///
/// Takes the contents of the first fenced block (without its language tag),
/// or the whole text when there is no fence. A fence opened and closed on a
/// single line keeps what sits between the markers. The result is trimmed
/// and ends with exactly one `\n`, or is empty.
pub fn scrub_response(response: &str) -> String {
    let body = match response.find("```") {
        Some(fence) => {
            let opened = &response[fence..];
            match opened.find('\n') {
                Some(newline) => {
                    let inner = &opened[newline + 1..];
                    inner.find("```").map_or(inner, |close| &inner[..close])
                }
                None => {
                    let inline = &opened["```".len()..];
                    strip_language_tag(inline.find("```").map_or(inline, |close| &inline[..close]))
                }
            }
        }
        None => response,
    };

    let scrubbed = body.trim().trim_end_matches(['`', '\r', '\n']).trim_end();
    if scrubbed.is_empty() {
        String::new()
    } else {
        format!("{}\n", scrubbed)
    }
}

/// Drop a leading `xml`/`csharp`-style tag from single-line fenced text.
fn strip_language_tag(text: &str) -> &str {
    let text = text.trim_start();
    let is_tag = |word: &str| {
        !word.is_empty()
            && word
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '#' || c == '+')
    };
    match text.find(char::is_whitespace) {
        Some(end) if is_tag(&text[..end]) => &text[end..],
        None if is_tag(text) => "",
        _ => text,
    }
}

/// Produces comment text for classified declarations.
#[derive(Clone)]
pub struct Synthesizer {
    generator: Arc<dyn DocGenerator>,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn DocGenerator>) -> Self {
        Self { generator }
    }

    /// Produce the comment for `declaration` in the given category.
    ///
    /// Only [`Category::Synthesize`] reaches the generator; a skipped
    /// declaration yields an empty comment.
    pub async fn synthesize(
        &self,
        doc: &SourceDocument,
        declaration: &Declaration,
        category: Category,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> SynthesisOutcome {
        if cancel.is_cancelled() {
            return SynthesisOutcome::Cancelled;
        }

        match category {
            Category::Skip => SynthesisOutcome::Success(String::new()),
            Category::InheritDoc => SynthesisOutcome::Success(inherit_doc()),
            Category::ValueSummary => match &declaration.constant_literal {
                Some(value) => SynthesisOutcome::Success(value_summary(value)),
                None => {
                    warn!(name = %declaration.name, "value_summary_without_literal");
                    SynthesisOutcome::Success(String::new())
                }
            },
            Category::Synthesize => self.generate(doc, declaration, settings, cancel).await,
        }
    }

    async fn generate(
        &self,
        doc: &SourceDocument,
        declaration: &Declaration,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> SynthesisOutcome {
        let connection = match settings.service.connection() {
            Ok(connection) => connection,
            Err(setting) => {
                debug!(setting = %setting, name = %declaration.name, "synthesis_missing_setting");
                return SynthesisOutcome::ConfigurationMissing(setting);
            }
        };

        let prompt = build_prompt(doc.slice(declaration.span));
        let started = Instant::now();
        debug!(
            kind = %declaration.kind,
            name = %declaration.name,
            model = %connection.model,
            prompt_len = prompt.len(),
            "synthesis_start"
        );

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                debug!(name = %declaration.name, "synthesis_cancelled");
                return SynthesisOutcome::Cancelled;
            }
            result = self.generator.generate(&connection, &prompt) => result,
        };

        match result {
            Ok(response) => {
                let comment = scrub_response(&response);
                debug!(
                    name = %declaration.name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    response_len = response.len(),
                    comment_lines = comment.lines().count(),
                    "synthesis_complete"
                );
                SynthesisOutcome::Success(comment)
            }
            Err(e) => {
                if cfg!(debug_assertions) {
                    error!(name = %declaration.name, error = ?e, "synthesis_failed");
                } else {
                    error!(name = %declaration.name, "synthesis_failed");
                }
                SynthesisOutcome::ServiceError(e.to_string())
            }
        }
    }
}
