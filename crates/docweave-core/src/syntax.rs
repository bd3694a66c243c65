//! Parsed C# source documents.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser, Tree};

use crate::error::{DocError, DocResult};

/// Half-open byte range into a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Byte range of a syntax node.
    pub fn of(node: Node<'_>) -> Self {
        Self::new(node.start_byte(), node.end_byte())
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// 1-based line and column (columns count characters, not bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A C# source text together with its syntax tree.
///
/// Documents are immutable; edits produce new text which is parsed again.
pub struct SourceDocument {
    text: String,
    tree: Tree,
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("len", &self.text.len())
            .field("has_errors", &self.has_errors())
            .finish()
    }
}

impl SourceDocument {
    /// Parse C# source text.
    ///
    /// Syntax errors do not fail the parse; tree-sitter recovers and the
    /// walker simply sees fewer (or partial) declarations.
    pub fn parse(text: impl Into<String>) -> DocResult<Self> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .map_err(|e| DocError::parse(format!("failed to load C# grammar: {}", e)))?;

        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| DocError::parse("parser returned no tree"))?;

        Ok(Self { text, tree })
    }

    /// Full source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the document, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Root node (`compilation_unit`).
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Whether the parser had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.root().has_error()
    }

    /// Source text of a node.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        self.slice(Span::of(node))
    }

    /// Source text of a span; empty if the span is out of bounds.
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.range()).unwrap_or("")
    }

    /// Smallest node covering `span`.
    pub fn covering_node(&self, span: Span) -> Option<Node<'_>> {
        if span.end > self.text.len() {
            return None;
        }
        self.root().descendant_for_byte_range(span.start, span.end)
    }

    /// Offset of the first byte of the line containing `offset`.
    pub fn line_start(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    /// Offset just past the line terminator of the line containing `offset`
    /// (or the end of the text on the last line).
    pub fn line_end(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.text[offset..]
            .find('\n')
            .map(|i| offset + i + 1)
            .unwrap_or(self.text.len())
    }

    /// Whitespace between the start of the line and `offset`, if nothing else
    /// precedes `offset` on that line.
    pub fn indentation_before(&self, offset: usize) -> Option<&str> {
        let prefix = &self.text[self.line_start(offset)..offset.min(self.text.len())];
        prefix.chars().all(|c| c == ' ' || c == '\t').then_some(prefix)
    }

    /// 1-based position of a byte offset.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.text[..offset].matches('\n').count() + 1;
        let column = self.text[self.line_start(offset)..offset].chars().count() + 1;
        Position { line, column }
    }

    /// Byte offset of a 1-based position, if it lies inside the text.
    pub fn offset(&self, position: Position) -> Option<usize> {
        if position.line == 0 || position.column == 0 {
            return None;
        }

        let mut line_start = 0;
        for _ in 1..position.line {
            line_start += self.text[line_start..].find('\n')? + 1;
        }

        let line = &self.text[line_start..];
        let line = &line[..line.find('\n').unwrap_or(line.len())];
        let column = position.column - 1;
        let char_count = line.chars().count();
        if column > char_count {
            return None;
        }

        let byte = line
            .char_indices()
            .nth(column)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        Some(line_start + byte)
    }
}
