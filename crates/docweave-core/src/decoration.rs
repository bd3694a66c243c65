//! Leading decoration: the comments, directives and whitespace in front of a
//! declaration, and the documentation presence check built on top of it.
//!
//! tree-sitter keeps comments as sibling nodes instead of attaching them to
//! the following token, so the decoration of a declaration is rebuilt from
//! the run of own-line comment siblings directly before it. A comment that
//! shares its line with earlier code trails that code and ends the run.
//! Attribute lists are part of the declaration node itself and are never
//! decoration.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::syntax::{SourceDocument, Span};

/// Kind of a single decoration element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriviaKind {
    Whitespace,
    EndOfLine,
    LineComment,
    BlockComment,
    /// `/// ...`
    DocLineComment,
    /// `/** ... */`
    DocBlockComment,
    /// `#region`, `#pragma`, the opening `#if` line and friends.
    Directive,
}

impl TriviaKind {
    /// Classify the text of a comment token.
    pub fn of_comment(text: &str) -> Self {
        if text.starts_with("///") {
            if text.starts_with("////") {
                TriviaKind::LineComment
            } else {
                TriviaKind::DocLineComment
            }
        } else if text.starts_with("//") {
            TriviaKind::LineComment
        } else if text.starts_with("/**") && !text.starts_with("/**/") && !text.starts_with("/***")
        {
            TriviaKind::DocBlockComment
        } else {
            TriviaKind::BlockComment
        }
    }

    /// Whether this element is a documentation comment.
    pub fn is_documentation(&self) -> bool {
        matches!(self, TriviaKind::DocLineComment | TriviaKind::DocBlockComment)
    }
}

/// One element of a declaration's leading decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub span: Span,
    pub text: String,
}

/// Whether any element of the decoration is a documentation comment.
pub fn has_doc(decoration: &[Trivia]) -> bool {
    decoration.iter().any(|trivia| trivia.kind.is_documentation())
}

fn is_directive(kind: &str) -> bool {
    matches!(
        kind,
        "preproc_region"
            | "preproc_endregion"
            | "preproc_pragma"
            | "preproc_nullable"
            | "preproc_line"
            | "preproc_error"
            | "preproc_warning"
            | "preproc_define"
            | "preproc_undef"
    )
}

/// The `#if ...` line opening the conditional block that `node` is the first
/// member of.
fn conditional_header(doc: &SourceDocument, node: Node<'_>) -> Option<Span> {
    let parent = node.parent()?;
    if parent.kind() != "preproc_if" {
        return None;
    }
    let condition = parent.child_by_field_name("condition")?;
    let mut cursor = parent.walk();
    let first_member = parent
        .named_children(&mut cursor)
        .filter(|child| child.id() != condition.id())
        .all(|child| child.start_byte() >= node.start_byte());
    if !first_member {
        return None;
    }
    let end = doc.line_end(condition.end_byte());
    let line = doc.slice(Span::new(parent.start_byte(), end));
    Some(Span::new(
        parent.start_byte(),
        parent.start_byte() + line.trim_end_matches(['\r', '\n']).len(),
    ))
}

/// Collect the leading decoration of `node`, in document order.
///
/// The list starts at the beginning of the first decoration line and ends
/// with the indentation of the node's own line. A conditional block opened
/// right before the node is part of its decoration, so a doc comment above
/// `#if` still documents the first member of the block.
pub fn leading_decoration(doc: &SourceDocument, node: Node<'_>) -> Vec<Trivia> {
    let mut elements: Vec<(Span, Option<&str>)> = Vec::new();
    let mut current = node;

    loop {
        match current.prev_sibling() {
            Some(prev) if prev.kind() == "comment" || is_directive(prev.kind()) => {
                if doc.indentation_before(prev.start_byte()).is_none() {
                    break;
                }
                let comment = (prev.kind() == "comment").then(|| doc.node_text(prev));
                elements.push((Span::of(prev), comment));
                current = prev;
            }
            Some(_) => match conditional_header(doc, current) {
                Some(header) if doc.indentation_before(header.start).is_some() => {
                    elements.push((header, None));
                    current = match current.parent() {
                        Some(parent) => parent,
                        None => break,
                    };
                }
                _ => break,
            },
            None => match current.parent() {
                // wrappers such as `global_statement` start with the node
                Some(parent) if parent.start_byte() == current.start_byte() => current = parent,
                _ => break,
            },
        }
    }
    elements.reverse();

    let first = elements
        .first()
        .map(|(span, _)| span.start)
        .unwrap_or(node.start_byte());
    // Code earlier on the node's line is not decoration.
    let mut pos = match doc.indentation_before(first) {
        Some(indent) => first - indent.len(),
        None => first,
    };
    let mut decoration = Vec::new();

    for (span, comment) in elements {
        push_gap(doc, Span::new(pos, span.start), &mut decoration);

        let kind = comment.map_or(TriviaKind::Directive, TriviaKind::of_comment);
        decoration.push(Trivia {
            kind,
            span,
            text: doc.slice(span).to_string(),
        });
        pos = span.end;
    }

    push_gap(doc, Span::new(pos, node.start_byte()), &mut decoration);
    decoration
}

/// Split the whitespace between two elements into whitespace and
/// end-of-line trivia.
fn push_gap(doc: &SourceDocument, gap: Span, out: &mut Vec<Trivia>) {
    if gap.is_empty() {
        return;
    }

    let text = doc.slice(gap);
    let mut run_start = 0;
    let push = |start: usize, end: usize, kind: TriviaKind, out: &mut Vec<Trivia>| {
        if start < end {
            out.push(Trivia {
                kind,
                span: Span::new(gap.start + start, gap.start + end),
                text: text[start..end].to_string(),
            });
        }
    };

    for (newline, _) in text.match_indices('\n') {
        let eol_start = if newline > run_start && text.as_bytes()[newline - 1] == b'\r' {
            newline - 1
        } else {
            newline
        };
        push(run_start, eol_start, TriviaKind::Whitespace, out);
        push(eol_start, newline + 1, TriviaKind::EndOfLine, out);
        run_start = newline + 1;
    }
    push(run_start, text.len(), TriviaKind::Whitespace, out);
}

/// Span covering the whole decoration (empty at `node_start` if there is none).
pub fn decoration_span(decoration: &[Trivia], node_start: usize) -> Span {
    match decoration.first() {
        Some(first) => Span::new(first.span.start, node_start),
        None => Span::at(node_start),
    }
}
