//! Missing-documentation diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::syntax::{Position, SourceDocument, Span};
use crate::walker::{Declaration, DeclarationKind};

/// Identifier of the diagnostic reported by this crate.
pub const DIAGNOSTIC_ID: &str = "DW001";

/// Diagnostic identifiers the fixer accepts: the compiler's own
/// missing-documentation warning and ours.
pub const FIXABLE_IDS: [&str; 2] = ["CS1591", DIAGNOSTIC_ID];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// A declaration that lacks documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: String,
    pub severity: Severity,
    /// Kind of the declaration; [`Diagnostic::arguments`] gives its display form.
    pub kind: DeclarationKind,
    /// Declared name.
    pub name: String,
    /// Span of the declaration's name token.
    pub span: Span,
    pub start: Position,
    pub end: Position,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic for an undocumented declaration.
    pub fn missing_documentation(doc: &SourceDocument, declaration: &Declaration) -> Self {
        let span = declaration.name_span;
        Self {
            id: DIAGNOSTIC_ID.to_string(),
            severity: Severity::Warning,
            kind: declaration.kind,
            name: declaration.name.clone(),
            span,
            start: doc.position(span.start),
            end: doc.position(span.end),
            message: format!(
                "{} '{}' is missing a documentation comment",
                declaration.kind.display_name(),
                declaration.name
            ),
        }
    }

    /// Message arguments: the declaration kind and its name.
    pub fn arguments(&self) -> (&'static str, &str) {
        (self.kind.display_name(), &self.name)
    }

    /// Whether the fixer accepts this diagnostic.
    pub fn is_fixable(&self) -> bool {
        FIXABLE_IDS.contains(&self.id.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} {}: {}",
            self.start.line, self.start.column, self.severity, self.id, self.message
        )
    }
}
