//! Diagnostic and fix coordination.
//!
//! [`analyze`] reports undocumented declarations. [`DocFixer`] turns a
//! reported location (or an arbitrary cursor position, via the refactor
//! path) back into a declaration, classifies it against the current
//! settings, synthesizes the comment and produces the edit.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::decoration::TriviaKind;
use crate::diagnostic::{Diagnostic, DIAGNOSTIC_ID};
use crate::error::{DocError, DocResult};
use crate::inject::{apply_all, inject, Injection};
use crate::policy::{calls_service, classify, Category};
use crate::synth::{missing_setting_marker, DocGenerator, SynthesisOutcome, Synthesizer};
use crate::syntax::{SourceDocument, Span};
use crate::walker::{declaration_at, walk, Declaration, DeclarationKind};

/// Default number of declarations synthesized at once within one document.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Report every undocumented declaration that the policy does not skip.
pub fn analyze(doc: &SourceDocument, settings: &Settings) -> Vec<Diagnostic> {
    let diagnostics: Vec<Diagnostic> = walk(doc)
        .iter()
        .filter(|declaration| !declaration.has_doc())
        .filter(|declaration| classify(declaration, settings) != Category::Skip)
        .map(|declaration| Diagnostic::missing_documentation(doc, declaration))
        .collect();

    debug!(count = diagnostics.len(), "analyze_complete");
    diagnostics
}

/// Result of fixing one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    Applied(Injection),
    /// Nothing to do: no declaration, already documented, skipped by
    /// policy or an empty comment.
    NotApplicable,
    Cancelled,
}

/// Result of fixing many diagnostics in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// The fixed text (the original text when cancelled).
    pub text: String,
    pub applied: usize,
    pub not_applicable: usize,
    /// Diagnostics whose fix failed, with the service's message.
    pub failures: Vec<(Diagnostic, String)>,
    pub cancelled: bool,
}

/// On-demand documentation offered at a cursor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactorAction {
    pub title: String,
    pub kind: DeclarationKind,
    pub name: String,
    /// Span of the declaration's name; executing the action resolves it again.
    pub span: Span,
    pub category: Category,
}

/// Read-only description of what a fix would do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub title: String,
    pub kind: DeclarationKind,
    pub name: String,
    pub category: Category,
    pub calls_service: bool,
}

/// Human readable title for a fix of the given category.
pub fn action_title(category: Category) -> &'static str {
    match category {
        Category::Synthesize => {
            "Sends this entire member's definition (and body) to the configured \
             generation endpoint for summary text generation and applies the result."
        }
        Category::InheritDoc => "Adds <inheritdoc /> to this member.",
        Category::ValueSummary => "Uses this constant's value as its summary.",
        Category::Skip => "Leaves this member undocumented.",
    }
}

/// Offer the refactor at `offset` if it lands on a documentable declaration.
pub fn refactor_at(doc: &SourceDocument, offset: usize, settings: &Settings) -> Option<RefactorAction> {
    let declaration = declaration_at(doc, Span::at(offset))?;
    let category = classify(&declaration, settings);
    if category == Category::Skip {
        debug!(offset, kind = %declaration.kind, "refactor_not_offered");
        return None;
    }

    Some(RefactorAction {
        title: action_title(category).to_string(),
        kind: declaration.kind,
        name: declaration.name,
        span: declaration.name_span,
        category,
    })
}

/// Describe what fixing the declaration at `span` would do, without doing it.
pub fn preview(doc: &SourceDocument, span: Span, settings: &Settings) -> Option<Preview> {
    let declaration = declaration_at(doc, span)?;
    let category = classify(&declaration, settings);

    Some(Preview {
        title: action_title(category).to_string(),
        kind: declaration.kind,
        name: declaration.name.clone(),
        category,
        calls_service: calls_service(&declaration, settings),
    })
}

/// Applies documentation fixes.
#[derive(Clone)]
pub struct DocFixer {
    synthesizer: Synthesizer,
    concurrency: usize,
}

impl DocFixer {
    pub fn new(generator: Arc<dyn DocGenerator>) -> Self {
        Self {
            synthesizer: Synthesizer::new(generator),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Limit how many declarations of one document are synthesized at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fix the declaration at `span`.
    ///
    /// Already documented declarations are left alone.
    pub async fn fix(
        &self,
        doc: &SourceDocument,
        span: Span,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> DocResult<FixOutcome> {
        let Some(declaration) = declaration_at(doc, span) else {
            debug!(offset = span.start, "fix_no_declaration");
            return Ok(FixOutcome::NotApplicable);
        };
        if declaration.has_doc() {
            debug!(name = %declaration.name, "fix_already_documented");
            return Ok(FixOutcome::NotApplicable);
        }

        self.document(doc, &declaration, settings, cancel).await
    }

    /// Fix the location a diagnostic points at.
    pub async fn fix_diagnostic(
        &self,
        doc: &SourceDocument,
        diagnostic: &Diagnostic,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> DocResult<FixOutcome> {
        if !diagnostic.is_fixable() {
            return Ok(FixOutcome::NotApplicable);
        }

        if diagnostic.id == DIAGNOSTIC_ID {
            if let Some(declaration) = declaration_at(doc, diagnostic.span) {
                if classify(&declaration, settings) == Category::Skip {
                    warn!(
                        kind = %declaration.kind,
                        name = %declaration.name,
                        "diagnostic_resolves_to_skip"
                    );
                    return Ok(FixOutcome::NotApplicable);
                }
            }
        }

        self.fix(doc, diagnostic.span, settings, cancel).await
    }

    /// Run a refactor action, documenting the declaration even if it already
    /// carries documentation.
    pub async fn refactor(
        &self,
        doc: &SourceDocument,
        action: &RefactorAction,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> DocResult<FixOutcome> {
        match declaration_at(doc, action.span) {
            Some(declaration) => self.document(doc, &declaration, settings, cancel).await,
            None => Ok(FixOutcome::NotApplicable),
        }
    }

    /// Fix every fixable diagnostic of `doc`.
    ///
    /// Each fix is computed against the original text; the edits are then
    /// applied together. Service failures are collected and do not stop the
    /// other fixes. When cancelled the original text is returned.
    pub async fn fix_all(
        &self,
        doc: &SourceDocument,
        diagnostics: &[Diagnostic],
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> DocResult<BatchOutcome> {
        let results: Pin<Box<dyn Future<Output = Vec<(&Diagnostic, DocResult<FixOutcome>)>> + Send + '_>> =
            Box::pin(
                stream::iter(diagnostics)
                    .filter(|diagnostic| futures::future::ready(diagnostic.is_fixable()))
                    .map(|diagnostic| async move {
                        (diagnostic, self.fix_diagnostic(doc, diagnostic, settings, cancel).await)
                    })
                    .buffer_unordered(self.concurrency)
                    .collect(),
            );
        let results = results.await;

        let unchanged = |not_applicable| BatchOutcome {
            text: doc.text().to_string(),
            applied: 0,
            not_applicable,
            failures: Vec::new(),
            cancelled: true,
        };
        if cancel.is_cancelled() {
            debug!("fix_all_cancelled");
            return Ok(unchanged(0));
        }

        let mut injections = Vec::new();
        let mut not_applicable = 0;
        let mut failures = Vec::new();

        for (diagnostic, result) in results {
            match result {
                Ok(FixOutcome::Applied(injection)) => injections.push(injection),
                Ok(FixOutcome::NotApplicable) => not_applicable += 1,
                Ok(FixOutcome::Cancelled) => return Ok(unchanged(not_applicable)),
                Err(e) if e.is_retryable() => failures.push((diagnostic.clone(), e.to_string())),
                Err(e) => return Err(e),
            }
        }

        let (text, applied) = apply_all(doc.text(), &injections);
        debug!(
            applied,
            not_applicable,
            failed = failures.len(),
            "fix_all_complete"
        );

        Ok(BatchOutcome {
            text,
            applied,
            not_applicable: not_applicable + injections.len() - applied,
            failures,
            cancelled: false,
        })
    }

    /// Classify, synthesize and inject.
    async fn document(
        &self,
        doc: &SourceDocument,
        declaration: &Declaration,
        settings: &Settings,
        cancel: &CancellationToken,
    ) -> DocResult<FixOutcome> {
        let category = classify(declaration, settings);
        debug!(
            kind = %declaration.kind,
            name = %declaration.name,
            category = %category,
            "fix_classified"
        );
        if category == Category::Skip {
            return Ok(FixOutcome::NotApplicable);
        }

        let outcome = self
            .synthesizer
            .synthesize(doc, declaration, category, settings, cancel)
            .await;

        match outcome {
            SynthesisOutcome::Success(comment) if comment.trim().is_empty() => {
                debug!(name = %declaration.name, "fix_empty_comment");
                Ok(FixOutcome::NotApplicable)
            }
            SynthesisOutcome::Success(comment) => {
                Ok(FixOutcome::Applied(inject(doc, declaration, &comment)))
            }
            SynthesisOutcome::Cancelled => Ok(FixOutcome::Cancelled),
            SynthesisOutcome::ConfigurationMissing(setting) => {
                let marker = missing_setting_marker(setting);
                let present = declaration.decoration.iter().any(|trivia| {
                    trivia.kind == TriviaKind::LineComment && trivia.text.trim() == marker.trim()
                });
                if present {
                    return Ok(FixOutcome::NotApplicable);
                }
                warn!(setting = %setting, name = %declaration.name, "fix_missing_setting");
                Ok(FixOutcome::Applied(inject(doc, declaration, &marker)))
            }
            SynthesisOutcome::ServiceError(message) => Err(DocError::service(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::config::{Connection, OverridesBehavior, ServiceSettings};
    use crate::synth::GenerationError;

    struct Fixed(&'static str, AtomicUsize);

    #[async_trait]
    impl DocGenerator for Fixed {
        async fn generate(&self, _: &Connection, _: &str) -> Result<String, GenerationError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.to_string())
        }
    }

    fn fixer(response: &'static str) -> (DocFixer, Arc<Fixed>) {
        let generator = Arc::new(Fixed(response, AtomicUsize::new(0)));
        (DocFixer::new(generator.clone()), generator)
    }

    fn configured() -> Settings {
        Settings::default().with_service(ServiceSettings::new("key", "model"))
    }

    #[test]
    fn test_analyze_skips_documented() {
        let doc = SourceDocument::parse("/// <summary/>\nclass A { }\nclass B { }\n").unwrap();
        let diagnostics = analyze(&doc, &Settings::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].name, "B");
    }

    #[test]
    fn test_refactor_offered_on_declaration_only() {
        let source = "class A\n{\n    void Run()\n    {\n        int x = 1;\n    }\n}\n";
        let doc = SourceDocument::parse(source).unwrap();
        let settings = Settings::default();

        let run = source.find("Run").unwrap();
        let action = refactor_at(&doc, run, &settings).unwrap();
        assert_eq!(action.kind, DeclarationKind::Method);
        assert_eq!(action.category, Category::Synthesize);

        let local = source.find("x = 1").unwrap();
        assert!(refactor_at(&doc, local, &settings).is_none());
    }

    #[test]
    fn test_preview_reports_service_use() {
        let source = "class A : B\n{\n    public override void Run() { }\n}\n";
        let doc = SourceDocument::parse(source).unwrap();
        let span = Span::at(source.find("Run").unwrap());

        let inherit = preview(&doc, span, &Settings::default()).unwrap();
        assert_eq!(inherit.category, Category::InheritDoc);
        assert!(!inherit.calls_service);

        let settings = Settings::default().with_overrides(OverridesBehavior::Synthesize);
        let generated = preview(&doc, span, &settings).unwrap();
        assert!(generated.calls_service);
        assert!(generated.title.starts_with("Sends this entire member's definition"));
    }

    #[tokio::test]
    async fn test_fix_documented_declaration_is_not_applicable() {
        let (fixer, generator) = fixer("/// <summary/>");
        let doc = SourceDocument::parse("/// <summary/>\nclass A { }\n").unwrap();
        let span = Span::at(doc.text().find("A {").unwrap());

        let outcome = fixer
            .fix(&doc, span, &configured(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, FixOutcome::NotApplicable);
        assert_eq!(generator.1.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_response_is_not_applicable() {
        let (fixer, _) = fixer("```\n```");
        let doc = SourceDocument::parse("class A { }\n").unwrap();

        let outcome = fixer
            .fix(&doc, Span::at(6), &configured(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, FixOutcome::NotApplicable);
    }

    #[tokio::test]
    async fn test_refactor_appends_to_existing_documentation() {
        let (fixer, _) = fixer("/// <remarks>More.</remarks>");
        let doc = SourceDocument::parse("/// <summary>A</summary>\nclass A { }\n").unwrap();
        let action = refactor_at(&doc, doc.text().find("A {").unwrap(), &configured()).unwrap();

        let outcome = fixer
            .refactor(&doc, &action, &configured(), &CancellationToken::new())
            .await
            .unwrap();
        let FixOutcome::Applied(injection) = outcome else {
            panic!("expected an edit");
        };
        assert_eq!(
            injection.apply(doc.text()),
            "/// <summary>A</summary>\n/// <remarks>More.</remarks>\nclass A { }\n"
        );
    }
}
