//! Formatting-preserving comment injection.
//!
//! An injection rewrites only the leading decoration region of a declaration:
//! the existing decoration is re-emitted byte for byte, the new comment lines
//! follow it at the declaration's indentation, and the declaration itself is
//! left alone. Regions of different declarations never overlap, so a batch of
//! injections computed against one text can be applied together.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decoration::decoration_span;
use crate::line_ending::LineEndingStyle;
use crate::syntax::{SourceDocument, Span};
use crate::walker::Declaration;

/// A single text replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    /// Region of the original text being replaced.
    pub replaced: Span,
    /// Replacement text.
    pub new_text: String,
}

impl Injection {
    /// Apply the replacement to `text`.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + self.new_text.len());
        out.push_str(&text[..self.replaced.start]);
        out.push_str(&self.new_text);
        out.push_str(&text[self.replaced.end..]);
        out
    }
}

/// Apply injections computed against the same `text`.
///
/// Edits are applied from the end of the text towards the start. Repeated
/// edits of the same region collapse to the first one; an edit overlapping
/// one already applied is dropped. Returns the new text and the number of
/// edits applied.
pub fn apply_all(text: &str, injections: &[Injection]) -> (String, usize) {
    let mut ordered: Vec<&Injection> = injections.iter().collect();
    ordered.sort_by(|a, b| b.replaced.cmp(&a.replaced));

    let mut out = text.to_string();
    let mut applied = 0;
    let mut floor = usize::MAX;
    let mut last: Option<Span> = None;

    for injection in ordered {
        if last == Some(injection.replaced) || injection.replaced.end > floor {
            debug!(start = injection.replaced.start, "injection_dropped");
            continue;
        }
        out = injection.apply(&out);
        floor = injection.replaced.start;
        last = Some(injection.replaced);
        applied += 1;
    }

    (out, applied)
}

/// Build the edit that inserts `comment` in front of `declaration`.
///
/// `declaration` must be the documentable anchor (a field, not one of its
/// declarators). Lines of `comment` that are not already comments are
/// prefixed with `/// `. New lines follow the line-ending style of the
/// declaration's own text.
pub fn inject(doc: &SourceDocument, declaration: &Declaration, comment: &str) -> Injection {
    let node_start = declaration.span.start;
    let region = decoration_span(&declaration.decoration, node_start);

    let anchor_text = doc.slice(Span::new(region.start, doc.line_end(declaration.span.end)));
    let style = LineEndingStyle::detect(anchor_text);

    match doc.indentation_before(node_start) {
        Some(indent) => {
            let kept = doc.slice(Span::new(region.start, node_start - indent.len()));
            let lines = style.normalize(&comment_lines(comment, indent));

            Injection {
                replaced: region,
                new_text: format!("{}{}{}", kept, lines, indent),
            }
        }
        None => {
            // The declaration follows other code on its line: break the line first.
            let line = doc.slice(Span::new(doc.line_start(node_start), node_start));
            let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            let generated = format!("\n{}{}", comment_lines(comment, &indent), indent);

            Injection {
                replaced: Span::at(node_start),
                new_text: style.normalize(&generated),
            }
        }
    }
}

/// Render comment text as indented, `\n`-terminated decoration lines.
fn comment_lines(comment: &str, indent: &str) -> String {
    let mut out = String::new();
    let mut in_block = false;

    for line in comment.lines() {
        let line = line.trim();
        if line.is_empty() && !in_block {
            continue;
        }

        out.push_str(indent);
        if in_block {
            if line.starts_with('*') {
                out.push(' ');
            }
            out.push_str(line);
            in_block = !line.contains("*/");
        } else if line.starts_with("/*") {
            out.push_str(line);
            in_block = !line.contains("*/");
        } else if line.starts_with("//") {
            out.push_str(line);
        } else {
            out.push_str("/// ");
            out.push_str(line);
        }
        out.push('\n');
    }

    out
}
