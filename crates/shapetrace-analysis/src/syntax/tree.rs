//! Arena-owned neutral syntax tree.
//!
//! Nodes are addressed by [`NodeId`] handles, so matches and schemas can point into a
//! tree without borrowing a parser's live node type.

use serde::{Deserialize, Serialize};
use shapetrace_core::SourceLocation;
use smallvec::SmallVec;

/// Opaque handle to a node inside one [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Parser-independent node categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Program,
    /// Call or constructor invocation.
    Call,
    /// Property access, `object.property`.
    Member,
    Identifier,
    /// String literal; `text` holds the unquoted value.
    String,
    Number,
    Boolean,
    Null,
    Object,
    /// Object-literal entry. Shorthand entries carry their name in `text` and no children.
    Pair,
    Array,
    /// Function declaration, expression, arrow, or method.
    Function,
    Return,
    /// Variable binding with an optional initializer.
    Declarator,
    Decorator,
    TypeAnnotation,
    /// Named type, optionally parameterized.
    TypeReference,
    TypeArguments,
    Arguments,
    Block,
    Export,
    Class,
    ClassField,
    Await,
    Other,
}

/// Role a child plays in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Callee,
    Arguments,
    Object,
    Property,
    Key,
    Value,
    Name,
    Parameters,
    ReturnType,
    Body,
    Init,
    Type,
    TypeArguments,
    Expression,
    Declaration,
}

/// Line/column, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// One node. `text` is the literal text for leaves and empty for interior nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// The originating parser's kind tag (e.g. `call_expression`).
    pub raw_kind: String,
    pub text: String,
    pub position: Position,
    pub field: Option<Field>,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
}

/// A whole parsed fragment. The first node added is the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent`. Returns its handle.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        field: Option<Field>,
        kind: NodeKind,
        raw_kind: impl Into<String>,
        text: impl Into<String>,
        position: Position,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SyntaxNode {
            kind,
            raw_kind: raw_kind.into(),
            text: text.into(),
            position,
            field,
            parent,
            children: SmallVec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        id
    }

    /// Build a tree from a nested [`NodeSpec`]. Positions are assigned in pre-order,
    /// one line per node, so every node gets a distinct location.
    pub fn from_spec(spec: NodeSpec) -> Self {
        let mut tree = Self::new();
        let mut line = 0;
        tree.insert_spec(None, spec, &mut line);
        tree
    }

    fn insert_spec(&mut self, parent: Option<NodeId>, spec: NodeSpec, line: &mut u32) -> NodeId {
        *line += 1;
        let raw = spec
            .raw_kind
            .unwrap_or_else(|| format!("{:?}", spec.kind).to_lowercase());
        let id = self.add_node(parent, spec.field, spec.kind, raw, spec.text, Position::new(*line, 1));
        for child in spec.children {
            self.insert_spec(Some(id), child, line);
        }
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn text(&self, id: NodeId) -> &str {
        &self.node(id).text
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// First child playing `field`.
    pub fn child_by_field(&self, id: NodeId, field: Field) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.node(c).field == Some(field))
    }

    /// First child of the given kind.
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&c| self.kind(c) == kind)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// `id` and all its descendants, pre-order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    pub fn location(&self, id: NodeId, file: &str) -> SourceLocation {
        let pos = self.node(id).position;
        SourceLocation::new(file, pos.line, pos.column)
    }
}

pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        // Reverse so the leftmost child is visited first.
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

/// Owned, nested description of a subtree. Lets non-tree-sitter front ends (and tests)
/// populate a [`SyntaxTree`] without tracking handles.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub raw_kind: Option<String>,
    pub text: String,
    pub field: Option<Field>,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            raw_kind: None,
            text: String::new(),
            field: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(kind: NodeKind, text: impl Into<String>) -> Self {
        Self::new(kind).text(text)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn raw_kind(mut self, raw: impl Into<String>) -> Self {
        self.raw_kind = Some(raw.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }
}
