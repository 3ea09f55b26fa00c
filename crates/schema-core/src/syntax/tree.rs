//! Concrete syntax tree
//!
//! Nodes live in an arena owned by [`SyntaxTree`] and are addressed by
//! [`NodeId`]. Every node knows its parent, its composite children and its
//! full element list (children interleaved with leaf tokens, trivia
//! included), so the leaves of the root reproduce the source byte for byte.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::NodeKind;
use crate::lexer::Token;

// =============================================================================
// SOURCE SPAN
// =============================================================================

/// Byte range over the source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of start
    pub start: usize,
    /// Byte offset of end
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

// =============================================================================
// ARENA
// =============================================================================

/// Index of a composite node inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One slot in a node's element list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Node(NodeId),
    /// Index into [`SyntaxTree::tokens`]
    Token(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) span: Span,
    pub(crate) incomplete: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) elements: Vec<Element>,
    pub(crate) children: Vec<NodeId>,
}

/// A recovered parse error, owned by the `Error` node that covers the
/// skipped tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub node: NodeId,
    pub message: String,
    pub span: Span,
}

/// Parsed schema file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    pub(crate) source: String,
    pub(crate) path: Option<PathBuf>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) errors: Vec<SyntaxError>,
}

impl SyntaxTree {
    /// Attach the file this tree was parsed from
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    // -------------------------------------------------------------------------
    // Node accessors
    // -------------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.data(id).kind
    }

    pub fn range(&self, id: NodeId) -> Span {
        self.data(id).span
    }

    pub fn text(&self, id: NodeId) -> &str {
        let span = self.range(id);
        &self.source[span.start..span.end]
    }

    /// True when the construct was closed early by error recovery
    pub fn is_incomplete(&self, id: NodeId) -> bool {
        self.data(id).incomplete
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Composite children only, in source order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Children and leaf tokens interleaved, trivia included
    pub fn elements(&self, id: NodeId) -> &[Element] {
        &self.data(id).elements
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) == kind)
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children_of_kind(id, kind).next()
    }

    /// Children that are not recovery error nodes
    pub fn value_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.kind(c) != NodeKind::Error)
    }

    /// Parent chain, nearest first, excluding `id`
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Pre-order walk starting at (and including) `id`
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    pub fn incomplete_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(move |&n| self.is_incomplete(n))
    }

    /// Deepest node whose range contains `offset`
    pub fn node_at(&self, offset: usize) -> NodeId {
        let mut current = self.root();
        'descend: loop {
            for &child in self.children(current) {
                if self.range(child).contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Concatenated leaf text under `id`, trivia included
    pub fn leaf_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![self.elements(id).iter()];
        while let Some(elements) = stack.last_mut() {
            match elements.next() {
                Some(&Element::Node(child)) => stack.push(self.elements(child).iter()),
                Some(&Element::Token(index)) => out.push_str(self.tokens[index].text(&self.source)),
                None => {
                    stack.pop();
                }
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Schema-level queries
    // -------------------------------------------------------------------------

    /// The child holding a definition's name
    pub fn definition_name_node(&self, id: NodeId) -> Option<NodeId> {
        let name_kind = match self.kind(id) {
            NodeKind::Type | NodeKind::Enum | NodeKind::Component => NodeKind::DefinitionName,
            NodeKind::EnumValue | NodeKind::Field | NodeKind::Event | NodeKind::Command => {
                NodeKind::FieldName
            }
            NodeKind::Package => NodeKind::PackageName,
            NodeKind::Option => NodeKind::OptionName,
            _ => return None,
        };
        self.first_child_of_kind(id, name_kind)
    }

    pub fn definition_name(&self, id: NodeId) -> Option<&str> {
        self.definition_name_node(id).map(|n| self.text(n))
    }

    /// Direct child of `parent` with the given kind and name
    pub fn find_named_child(&self, parent: NodeId, kind: NodeKind, name: &str) -> Option<NodeId> {
        self.children_of_kind(parent, kind)
            .find(|&c| self.definition_name(c) == Some(name))
    }

    pub fn field_name(&self, field: NodeId) -> Option<&str> {
        self.first_child_of_kind(field, NodeKind::FieldName)
            .map(|n| self.text(n))
    }

    pub fn field_type(&self, field: NodeId) -> Option<NodeId> {
        self.first_child_of_kind(field, NodeKind::FieldType)
    }

    pub fn field_number(&self, field: NodeId) -> Option<u64> {
        self.first_child_of_kind(field, NodeKind::FieldNumber)
            .and_then(|n| self.text(n).parse().ok())
    }

    pub fn package_name(&self) -> Option<&str> {
        self.first_child_of_kind(self.root(), NodeKind::Package)
            .and_then(|p| self.definition_name(p))
    }

    /// Import paths in declaration order, quotes stripped
    pub fn imports(&self) -> Vec<&str> {
        self.children_of_kind(self.root(), NodeKind::Import)
            .filter_map(|i| self.first_child_of_kind(i, NodeKind::ImportFilename))
            .map(|f| {
                let text = self.text(f);
                let text = text.strip_prefix('"').unwrap_or(text);
                text.strip_suffix('"').unwrap_or(text)
            })
            .filter(|path| !path.is_empty())
            .collect()
    }

    /// Fields of a type or component in ascending field-number order
    ///
    /// Numbers need not be contiguous. Fields without a number are left out,
    /// and when two fields share a number the later declaration wins.
    pub fn ordered_fields(&self, definition: NodeId) -> Vec<NodeId> {
        let mut by_number = BTreeMap::new();
        for field in self.children_of_kind(definition, NodeKind::Field) {
            if let Some(number) = self.field_number(field) {
                by_number.insert(number, field);
            }
        }
        by_number.into_values().collect()
    }

    // -------------------------------------------------------------------------
    // Debug output
    // -------------------------------------------------------------------------

    /// Indented outline of the tree, trivia omitted
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        self.dump_header(self.root(), 0, &mut out);
        let mut stack = vec![self.elements(self.root()).iter()];
        loop {
            let depth = stack.len();
            let Some(elements) = stack.last_mut() else {
                break;
            };
            match elements.next() {
                Some(&Element::Node(child)) => {
                    self.dump_header(child, depth, &mut out);
                    stack.push(self.elements(child).iter());
                }
                Some(&Element::Token(index)) => {
                    let token = self.tokens[index];
                    if token.kind.is_trivia() {
                        continue;
                    }
                    let _ = writeln!(
                        out,
                        "{:indent$}{} {:?}",
                        "",
                        token.kind.debug_name(),
                        token.text(&self.source),
                        indent = depth * 2
                    );
                }
                None => {
                    stack.pop();
                }
            }
        }
        out
    }

    fn dump_header(&self, id: NodeId, depth: usize, out: &mut String) {
        let span = self.range(id);
        let _ = write!(
            out,
            "{:indent$}{}@{}..{}",
            "",
            self.kind(id),
            span.start,
            span.end,
            indent = depth * 2
        );
        if self.is_incomplete(id) {
            out.push_str(" (incomplete)");
        }
        if let Some(error) = self.errors.iter().find(|e| e.node == id) {
            let _ = write!(out, " {:?}", error.message);
        }
        out.push('\n');
    }
}

/// Pre-order node iterator, see [`SyntaxTree::descendants`]
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
