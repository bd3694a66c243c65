//! Declaration discovery.
//!
//! The walker enumerates declarations of the supported kinds in document
//! order and resolves arbitrary locations (diagnostic spans, cursor offsets)
//! back to the declaration that owns them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::decoration::{has_doc, leading_decoration, Trivia};
use crate::syntax::{SourceDocument, Span};

/// Kinds of declarations the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    Field,
    EventField,
    Property,
    Event,
    Method,
    Constructor,
    Indexer,
    Record,
    RecordStruct,
    EnumMember,
    /// A local variable. Never walked; only reachable by resolving a location
    /// inside a method body, and never documented.
    LocalVariable,
}

impl DeclarationKind {
    /// Every kind the walker reports.
    pub const WALKED: [DeclarationKind; 15] = [
        DeclarationKind::Class,
        DeclarationKind::Struct,
        DeclarationKind::Interface,
        DeclarationKind::Enum,
        DeclarationKind::Delegate,
        DeclarationKind::Field,
        DeclarationKind::EventField,
        DeclarationKind::Property,
        DeclarationKind::Event,
        DeclarationKind::Method,
        DeclarationKind::Constructor,
        DeclarationKind::Indexer,
        DeclarationKind::Record,
        DeclarationKind::RecordStruct,
        DeclarationKind::EnumMember,
    ];

    /// Map a syntax node to its declaration kind.
    pub fn from_node(node: Node<'_>) -> Option<Self> {
        let kind = match node.kind() {
            "class_declaration" => DeclarationKind::Class,
            "struct_declaration" => DeclarationKind::Struct,
            "interface_declaration" => DeclarationKind::Interface,
            "enum_declaration" => DeclarationKind::Enum,
            "delegate_declaration" => DeclarationKind::Delegate,
            "field_declaration" => DeclarationKind::Field,
            "event_field_declaration" => DeclarationKind::EventField,
            "property_declaration" => DeclarationKind::Property,
            "event_declaration" => DeclarationKind::Event,
            "method_declaration" => DeclarationKind::Method,
            "constructor_declaration" => DeclarationKind::Constructor,
            "indexer_declaration" => DeclarationKind::Indexer,
            "record_declaration" if has_token(node, "struct") => DeclarationKind::RecordStruct,
            "record_declaration" => DeclarationKind::Record,
            "record_struct_declaration" => DeclarationKind::RecordStruct,
            "enum_member_declaration" => DeclarationKind::EnumMember,
            "local_declaration_statement" => DeclarationKind::LocalVariable,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the walker reports this kind.
    pub fn is_walked(&self) -> bool {
        !matches!(self, DeclarationKind::LocalVariable)
    }

    /// Whether the declaration introduces its names through variable declarators.
    pub fn has_declarators(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Field | DeclarationKind::EventField | DeclarationKind::LocalVariable
        )
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> &'static str {
        match self {
            DeclarationKind::Class => "ClassDeclaration",
            DeclarationKind::Struct => "StructDeclaration",
            DeclarationKind::Interface => "InterfaceDeclaration",
            DeclarationKind::Enum => "EnumDeclaration",
            DeclarationKind::Delegate => "DelegateDeclaration",
            DeclarationKind::Field => "FieldDeclaration",
            DeclarationKind::EventField => "EventFieldDeclaration",
            DeclarationKind::Property => "PropertyDeclaration",
            DeclarationKind::Event => "EventDeclaration",
            DeclarationKind::Method => "MethodDeclaration",
            DeclarationKind::Constructor => "ConstructorDeclaration",
            DeclarationKind::Indexer => "IndexerDeclaration",
            DeclarationKind::Record => "RecordDeclaration",
            DeclarationKind::RecordStruct => "RecordStructDeclaration",
            DeclarationKind::EnumMember => "EnumMemberDeclaration",
            DeclarationKind::LocalVariable => "LocalDeclarationStatement",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Owned snapshot of one declaration.
///
/// Extracted once from the tree; nothing downstream touches the tree through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    /// Declared name (`this[]` for indexers, the first declarator for fields).
    pub name: String,
    /// Span of the identifying token.
    pub name_span: Span,
    /// Span of the declaration node, attribute lists included.
    pub span: Span,
    /// Leading decoration in document order.
    pub decoration: Vec<Trivia>,
    /// Modifier keywords in source order.
    pub modifiers: Vec<String>,
    /// Carries `override` or an explicit interface specifier.
    pub implements: bool,
    /// Value text of the first declarator's initializer, for `const`
    /// declarations initialized with a literal.
    pub constant_literal: Option<String>,
}

impl Declaration {
    /// Build the snapshot for a node of a supported kind.
    ///
    /// Returns `None` for other nodes and for declarations too broken to name.
    pub fn from_node(doc: &SourceDocument, node: Node<'_>) -> Option<Self> {
        let kind = DeclarationKind::from_node(node)?;

        let modifiers: Vec<String> = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "modifier")
            .map(|child| doc.node_text(child).trim().to_string())
            .collect();

        let implements = modifiers.iter().any(|m| m == "override")
            || named_children(node)
                .iter()
                .any(|child| child.kind() == "explicit_interface_specifier");

        let (name, name_span, constant_literal) = if kind.has_declarators() {
            let declarator = first_declarator(node)?;
            let ident = identifier_of(declarator)?;
            let literal = if modifiers.iter().any(|m| m == "const") {
                initializer_of(declarator)
                    .filter(|value| is_literal(value.kind()))
                    .map(|value| literal_value(value.kind(), doc.node_text(value)))
            } else {
                None
            };
            (doc.node_text(ident).to_string(), Span::of(ident), literal)
        } else if kind == DeclarationKind::Indexer {
            let this = token(node, "this")?;
            ("this[]".to_string(), Span::of(this), None)
        } else {
            let ident = identifier_of(node)?;
            (doc.node_text(ident).to_string(), Span::of(ident), None)
        };

        Some(Self {
            kind,
            name,
            name_span,
            span: Span::of(node),
            decoration: leading_decoration(doc, node),
            modifiers,
            implements,
            constant_literal,
        })
    }

    /// Whether the declaration already carries a documentation comment.
    pub fn has_doc(&self) -> bool {
        has_doc(&self.decoration)
    }
}

/// All walked declarations, in document order.
pub fn walk(doc: &SourceDocument) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut cursor = doc.root().walk();

    loop {
        let node = cursor.node();
        if DeclarationKind::from_node(node).is_some_and(|kind| kind.is_walked()) {
            if let Some(declaration) = Declaration::from_node(doc, node) {
                declarations.push(declaration);
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return declarations;
            }
        }
    }
}

/// Climb from an inner node to the node documentation attaches to.
///
/// A variable declarator resolves to the field, event field or local
/// declaration that owns it; declaration nodes resolve to themselves.
pub fn documentable_anchor(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "variable_declarator" {
        let declaration = node
            .parent()
            .filter(|parent| parent.kind() == "variable_declaration")?;
        let owner = declaration.parent()?;
        return DeclarationKind::from_node(owner).map(|_| owner);
    }
    DeclarationKind::from_node(node).map(|_| node)
}

/// Resolve a location to the documentable node that owns it.
///
/// Climbs from the smallest covering node through the declaration header
/// (names, modifiers, types, keywords) and gives up on entering a body,
/// parameter list, attribute list, expression or statement.
pub fn resolve_node(doc: &SourceDocument, span: Span) -> Option<Node<'_>> {
    let mut node = doc.covering_node(span)?;
    loop {
        if node.kind() == "variable_declarator" || DeclarationKind::from_node(node).is_some() {
            return documentable_anchor(node);
        }
        if is_barrier(node.kind()) {
            return None;
        }
        node = node.parent()?;
    }
}

/// Resolve a location to its declaration snapshot.
pub fn declaration_at(doc: &SourceDocument, span: Span) -> Option<Declaration> {
    resolve_node(doc, span).and_then(|node| Declaration::from_node(doc, node))
}

fn is_barrier(kind: &str) -> bool {
    matches!(
        kind,
        "block"
            | "declaration_list"
            | "enum_member_declaration_list"
            | "accessor_list"
            | "parameter_list"
            | "bracketed_parameter_list"
            | "type_parameter_list"
            | "attribute_list"
            | "base_list"
            | "argument_list"
            | "bracketed_argument_list"
            | "interpolation"
            | "comment"
    ) || kind.ends_with("_statement")
        || kind.ends_with("_expression")
        || kind.ends_with("_literal")
        || kind.ends_with("_clause")
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn token<'t>(node: Node<'t>, text: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|child| !child.is_named() && child.kind() == text);
    found
}

fn has_token(node: Node<'_>, text: &str) -> bool {
    token(node, text).is_some()
}

fn identifier_of(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("name")
        .filter(|name| name.kind() == "identifier")
        .or_else(|| {
            named_children(node)
                .into_iter()
                .find(|child| child.kind() == "identifier")
        })
}

fn first_declarator(node: Node<'_>) -> Option<Node<'_>> {
    let declaration = named_children(node)
        .into_iter()
        .find(|child| child.kind() == "variable_declaration")?;
    named_children(declaration)
        .into_iter()
        .find(|child| child.kind() == "variable_declarator")
}

/// Initializer expression of a declarator, with or without an
/// `equals_value_clause` wrapper depending on the grammar version.
fn initializer_of(declarator: Node<'_>) -> Option<Node<'_>> {
    let children = named_children(declarator);
    if let Some(clause) = children
        .iter()
        .find(|child| child.kind() == "equals_value_clause")
    {
        return clause.named_child(0);
    }

    let equals = token(declarator, "=")?;
    let mut next = equals.next_sibling();
    while let Some(node) = next {
        if node.is_named() && node.kind() != "comment" {
            return Some(node);
        }
        next = node.next_sibling();
    }
    None
}

fn is_literal(kind: &str) -> bool {
    matches!(
        kind,
        "string_literal"
            | "verbatim_string_literal"
            | "raw_string_literal"
            | "character_literal"
            | "integer_literal"
            | "real_literal"
            | "boolean_literal"
            | "null_literal"
    )
}

/// Value text of a literal token: string and character quotes are removed,
/// everything else is kept verbatim.
fn literal_value(kind: &str, text: &str) -> String {
    match kind {
        "string_literal" => {
            let text = text
                .strip_suffix("u8")
                .or_else(|| text.strip_suffix("U8"))
                .unwrap_or(text);
            strip_delimiters(text, "\"", "\"").to_string()
        }
        "verbatim_string_literal" => strip_delimiters(text, "@\"", "\"").to_string(),
        "raw_string_literal" => text.trim_matches('"').trim().to_string(),
        "character_literal" => strip_delimiters(text, "'", "'").to_string(),
        _ => text.to_string(),
    }
}

fn strip_delimiters<'a>(text: &'a str, open: &str, close: &str) -> &'a str {
    text.strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .unwrap_or(text)
}
