//! Detects undocumented C# declarations and weaves documentation comments
//! into them.
//!
//! The crate works on tree-sitter syntax trees only; no compilation or
//! semantic model is needed.
//!
//! ## Pipeline
//!
//! ```text
//! walk ──► presence check ──► classify ──► diagnostic
//!                                              │
//!            edit ◄── inject ◄── synthesize ◄──┘ (fix)
//! ```
//!
//! - **Walker** ([`walk`]): supported declarations in document order.
//! - **Presence check** ([`has_doc`]): does the leading decoration contain a
//!   `///` or `/** */` comment?
//! - **Policy** ([`classify`]): `Skip`, `InheritDoc`, `ValueSummary` or
//!   `Synthesize`, recomputed from the current [`Settings`] on every request.
//! - **Synthesizer** ([`Synthesizer`]): templates, or a [`DocGenerator`]
//!   raced against a cancellation token.
//! - **Injector** ([`inject`]): a minimal edit that keeps the existing
//!   decoration and the document's line endings.
//! - **Coordinator** ([`analyze`], [`DocFixer`], [`refactor_at`], [`preview`]).

pub mod config;
pub mod coordinator;
pub mod decoration;
pub mod diagnostic;
mod error;
pub mod inject;
pub mod line_ending;
pub mod policy;
pub mod synth;
pub mod syntax;
pub mod walker;

pub use config::{
    Connection, OverridesBehavior, ServiceSettings, Setting, Settings, SharedSettings,
    DEFAULT_ENDPOINT,
};
pub use coordinator::{
    action_title, analyze, preview, refactor_at, BatchOutcome, DocFixer, FixOutcome, Preview,
    RefactorAction,
};
pub use decoration::{has_doc, leading_decoration, Trivia, TriviaKind};
pub use diagnostic::{Diagnostic, Severity, DIAGNOSTIC_ID, FIXABLE_IDS};
pub use error::{DocError, DocResult};
pub use inject::{apply_all, inject, Injection};
pub use line_ending::LineEndingStyle;
pub use policy::{calls_service, classify, Category};
pub use synth::{
    build_prompt, scrub_response, DocGenerator, GenerationError, SynthesisOutcome, Synthesizer,
};
pub use syntax::{Position, SourceDocument, Span};
pub use walker::{declaration_at, documentable_anchor, walk, Declaration, DeclarationKind};
