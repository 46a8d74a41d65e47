// AST model - some predicates reserved for external parsers
#![allow(dead_code)]

use std::fmt;

/// Half-open byte range into the translation unit source.
///
/// Ranges are expansion-resolved by the AST provider: a declaration produced
/// by a macro reports the range of the expansion site, not the macro body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Starting byte offset (inclusive)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if this span fully contains another
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Canonical identity of a declared entity.
///
/// All redeclarations of one entity (forward declarations, out-of-line
/// definitions, reopened namespace blocks) share a single `CanonId`. The
/// value is an opaque handle assigned by the AST provider; it is the sole
/// key used for semantic bookkeeping - declaration nodes are never compared
/// by tree position for semantic purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonId(pub u64);

impl fmt::Display for CanonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of one syntactic declaration node in the tree arena.
///
/// Distinct from `CanonId`: a `NodeId` names one textual appearance, of
/// which an entity may have many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Template specialization kind of a record declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpecializationKind {
    #[default]
    Undeclared,
    ImplicitInstantiation,
    ExplicitSpecialization,
    ExplicitInstantiationDeclaration,
    ExplicitInstantiationDefinition,
}

/// Kind of a declaration node, with the kind-specific facts the
/// classification rules consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// Free function, method, or the templated declaration inside a
    /// function template
    Function {
        /// Explicitly defaulted (`= default`)
        defaulted: bool,
        /// Explicitly deleted (`= delete`)
        deleted: bool,
        /// This particular redeclaration carries the body
        has_body: bool,
    },

    /// Function template wrapper. The templated function is the node's
    /// first `Function` child.
    FunctionTemplate,

    /// Class / struct / union
    Record {
        /// This redeclaration is the complete definition
        complete_definition: bool,
        /// The record is described by a class template
        described_template: bool,
        /// Specialization kind, for templated records
        specialization: SpecializationKind,
    },

    /// Class template wrapper
    RecordTemplate {
        /// This redeclaration is the defining one
        is_definition: bool,
    },

    /// `typedef` or alias-declaration
    TypeAlias {
        /// The alias is the description of an alias template
        described_alias_template: bool,
    },

    /// Alias template (`template <..> using X = ..`)
    AliasTemplate,

    /// `using namespace X;`
    UsingDirective {
        /// Canonical identity of the nominated namespace, if it resolved
        nominated: Option<CanonId>,
    },

    /// One lexical namespace block (each reopening is a separate node)
    Namespace,

    /// Namespace-scope or global variable
    Variable,

    /// Stray `;` with no declaration content
    Empty,

    /// Any construct without a classification rule; never removed, but
    /// keeps its enclosing namespace alive
    Other,
}

impl DeclKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            DeclKind::Function { .. } => "function",
            DeclKind::FunctionTemplate => "function template",
            DeclKind::Record { .. } => "record",
            DeclKind::RecordTemplate { .. } => "class template",
            DeclKind::TypeAlias { .. } => "type alias",
            DeclKind::AliasTemplate => "alias template",
            DeclKind::UsingDirective { .. } => "using directive",
            DeclKind::Namespace => "namespace",
            DeclKind::Variable => "variable",
            DeclKind::Empty => "empty declaration",
            DeclKind::Other => "declaration",
        }
    }
}

/// One declaration node as supplied by the external parser.
///
/// Read-only during elimination.
#[derive(Debug, Clone)]
pub struct DeclNode {
    /// Kind tag plus kind-specific predicates
    pub kind: DeclKind,

    /// Canonical identity shared by all redeclarations of the entity
    pub canon: CanonId,

    /// Identity of this node itself. Equal to `canon` unless the node is a
    /// redeclaration; only the alias-template rule consults it.
    pub own: CanonId,

    /// Expansion-resolved source range of the declaration
    pub span: Span,

    /// Whether the node originates in the main file (as opposed to an
    /// included header)
    pub in_main_file: bool,

    /// Range of the documentation comment attached to this declaration,
    /// if any. May be separated from `span` by blank lines.
    pub comment: Option<Span>,

    /// Lexical parent node
    pub parent: Option<NodeId>,

    /// Direct children, in source order
    pub children: Vec<NodeId>,
}

impl DeclNode {
    pub fn new(kind: DeclKind, canon: CanonId, span: Span) -> Self {
        Self {
            kind,
            canon,
            own: canon,
            span,
            in_main_file: true,
            comment: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Set a distinct own-identity (for redeclarations)
    pub fn with_own(mut self, own: CanonId) -> Self {
        self.own = own;
        self
    }

    /// Attach a documentation comment range
    pub fn with_comment(mut self, comment: Span) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Mark the node as originating from an included header
    pub fn in_header(mut self) -> Self {
        self.in_main_file = false;
        self
    }
}

/// The parsed declaration tree of one translation unit.
///
/// Nodes live in an arena indexed by `NodeId`; the tree structure is carried
/// by the parent/children links. Built once by the external parser (through
/// [`AstBuilder`]) and read-only afterwards.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<DeclNode>,
    roots: Vec<NodeId>,
}

impl Ast {
    /// Get a node by id
    pub fn node(&self, id: NodeId) -> &DeclNode {
        &self.nodes[id.0]
    }

    /// Top-level declarations, in source order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Direct children of a node, in source order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Lexical parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The templated function declaration inside a function template
    /// wrapper: its first `Function` child.
    pub fn templated_decl(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| matches!(self.node(child).kind, DeclKind::Function { .. }))
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes with their ids
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &DeclNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node))
    }
}

/// Incremental constructor for [`Ast`], used by external parsers and tests
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<DeclNode>,
    roots: Vec<NodeId>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level declaration
    pub fn add_root(&mut self, node: DeclNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    /// Add a declaration nested inside `parent`
    pub fn add_child(&mut self, parent: NodeId, mut node: DeclNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn build(self) -> Ast {
        Ast {
            nodes: self.nodes,
            roots: self.roots,
        }
    }
}
