use crate::ast::{Ast, CanonId, DeclKind, DeclNode, NodeId, Span, SpecializationKind};
use crate::config::Config;
use crate::ranges::terminator_after;
use crate::rewriter::{RewriteError, SmartRewriter};
use crate::usage::UsedDeclarations;
use std::collections::HashSet;
use tracing::debug;

/// Accumulator state threaded through one elimination pass.
///
/// All tables grow monotonically: no entry is ever withdrawn, and a node in
/// `removed` is never reconsidered. The namespace fix-up on the way back up
/// the traversal relies on that stable view of its children's fate.
///
/// Owned by [`Optimizer`]; exposed so the classification rules can be unit
/// tested against pre-seeded state.
#[derive(Debug, Default)]
pub struct PassState {
    /// Canonical identities already visited, for redeclaration detection
    pub declared: HashSet<CanonId>,

    /// Namespaces for which a `using namespace` directive has been retained
    pub used_namespaces: HashSet<CanonId>,

    /// Namespace node instances with at least one surviving direct child
    pub non_empty_namespaces: HashSet<NodeId>,

    /// Declaration nodes marked for removal
    pub removed: HashSet<NodeId>,
}

/// Outcome of one elimination pass: which nodes were removed and the exact
/// byte ranges to excise.
///
/// Ranges are accumulated during traversal and handed to the text-editing
/// engine only after the pass completes, so the engine may treat them as
/// final and resolve overlaps in one consolidation step.
#[derive(Debug)]
pub struct RemovalPlan {
    /// Every declaration node marked for deletion
    pub removed: HashSet<NodeId>,

    /// Removal requests, possibly overlapping or duplicated
    pub ranges: Vec<Span>,
}

impl RemovalPlan {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// Number of removed declaration nodes
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Forward all removal requests to a rewriter
    pub fn apply_to(&self, rewriter: &mut SmartRewriter) {
        rewriter.remove_all(self.ranges.iter().copied());
    }

    /// Apply the plan against the original source and return the output
    pub fn apply(&self, source: &str) -> Result<String, RewriteError> {
        let mut rewriter = SmartRewriter::new(source);
        self.apply_to(&mut rewriter);
        rewriter.apply()
    }
}

/// The selective dead-declaration elimination pass.
///
/// One depth-first pre-order walk over the declaration tree, restricted to
/// main-file nodes. Each declaration is classified at most once, by a rule
/// keyed on its kind; removal decisions translate into byte ranges through
/// the range resolver. Namespace blocks are the exception to pre-order: a
/// block can only be judged empty after all of its children are classified,
/// so that decision rides the recursion back up (see [`Self::traverse`]).
pub struct Optimizer<'a> {
    ast: &'a Ast,
    source: &'a str,
    used: &'a UsedDeclarations,
    remove_comments: bool,
    state: PassState,
    ranges: Vec<Span>,
}

impl<'a> Optimizer<'a> {
    /// Create a pass over `ast` with default options
    pub fn new(ast: &'a Ast, source: &'a str, used: &'a UsedDeclarations) -> Self {
        Self {
            ast,
            source,
            used,
            remove_comments: true,
            state: PassState::default(),
            ranges: Vec::new(),
        }
    }

    /// Create a pass configured from `config`
    pub fn with_config(
        ast: &'a Ast,
        source: &'a str,
        used: &'a UsedDeclarations,
        config: &Config,
    ) -> Self {
        let mut optimizer = Self::new(ast, source, used);
        optimizer.remove_comments = config.remove_comments;
        optimizer
    }

    /// Replace the initial pass state (for testing rules in isolation)
    pub fn with_state(mut self, state: PassState) -> Self {
        self.state = state;
        self
    }

    /// Run the pass to completion
    pub fn run(mut self) -> RemovalPlan {
        for &root in self.ast.roots() {
            self.traverse(root);
        }

        debug!(
            "Elimination pass done: {} of {} nodes removed",
            self.state.removed.len(),
            self.ast.node_count()
        );

        RemovalPlan {
            removed: self.state.removed,
            ranges: self.ranges,
        }
    }

    /// Depth-first walk with a post-order fix-up.
    ///
    /// Classification is pre-order, but a namespace block cannot be judged
    /// empty until its whole subtree has been visited, so that check runs
    /// after the recursive calls return. A node that survives then marks its
    /// enclosing namespace block as non-empty, propagating survival upward
    /// one level at a time.
    fn traverse(&mut self, id: NodeId) {
        self.visit(id);

        for &child in self.ast.children(id) {
            self.traverse(child);
        }

        let node = self.ast.node(id);
        if !node.in_main_file {
            return;
        }

        if matches!(node.kind, DeclKind::Namespace)
            && !self.state.non_empty_namespaces.contains(&id)
        {
            self.remove_node(id);
        }

        if !self.state.removed.contains(&id) {
            if let Some(parent) = node.parent {
                if matches!(self.ast.node(parent).kind, DeclKind::Namespace) {
                    self.state.non_empty_namespaces.insert(parent);
                }
            }
        }
    }

    /// Classify one declaration node. One rule per kind; only main-file
    /// nodes are ever classified.
    fn visit(&mut self, id: NodeId) {
        let node = self.ast.node(id);
        if !node.in_main_file {
            return;
        }

        match node.kind {
            DeclKind::Function { .. } => self.visit_function(id, node),
            DeclKind::FunctionTemplate => self.visit_function_template(id, node),
            DeclKind::Record { .. } => self.visit_record(id, node),
            DeclKind::RecordTemplate { .. } => self.visit_record_template(id, node),
            DeclKind::TypeAlias { .. } => self.visit_type_alias(id, node),
            DeclKind::AliasTemplate => self.visit_alias_template(id, node),
            DeclKind::UsingDirective { .. } => self.visit_using_directive(id, node),
            DeclKind::Variable => self.visit_variable(id, node),
            DeclKind::Empty => self.remove_node(id),
            // Namespaces are decided post-order in traverse(); anything
            // unclassified is kept as-is.
            DeclKind::Namespace | DeclKind::Other => {}
        }
    }

    /// Shared removal test for functions and the declaration inside a
    /// function template.
    fn function_needs_removal(&self, node: &DeclNode) -> bool {
        let DeclKind::Function {
            defaulted,
            deleted,
            has_body,
        } = node.kind
        else {
            return false;
        };

        // Defaulted and deleted functions carry required special semantics
        // whether or not anything references them.
        if defaulted || deleted {
            return false;
        }

        let unused = !self.used.contains(node.canon);
        let redeclaration = !has_body && self.state.declared.contains(&node.canon);
        unused || redeclaration
    }

    fn visit_function(&mut self, id: NodeId, node: &DeclNode) {
        // May already be covered by its function template wrapper; the
        // nested removal ranges coalesce in the rewriter.
        if self.function_needs_removal(node) {
            self.remove_node(id);
        }

        self.state.declared.insert(node.canon);
    }

    fn visit_function_template(&mut self, id: NodeId, node: &DeclNode) {
        let Some(inner_id) = self.ast.templated_decl(id) else {
            debug!("Function template {} has no templated declaration", id);
            return;
        };
        let inner = self.ast.node(inner_id);

        // For an out-of-line template method, the correct source range may
        // belong to either the method declaration or the template wrapper,
        // whichever starts earlier. If the method starts earlier, defer: it
        // is classified as a plain function when visited.
        if inner.span.start < node.span.start {
            return;
        }

        // The removal test runs on the templated declaration, but it is the
        // wrapper node whose text gets excised.
        if self.function_needs_removal(inner) {
            self.remove_node(id);
        }
    }

    fn visit_record(&mut self, id: NodeId, node: &DeclNode) {
        let DeclKind::Record {
            complete_definition,
            described_template,
            specialization,
        } = node.kind
        else {
            return;
        };

        // The record inside a class template, or an implicit instantiation
        // of it, has no independent source range to remove.
        if described_template
            && matches!(
                specialization,
                SpecializationKind::ImplicitInstantiation | SpecializationKind::Undeclared
            )
        {
            return;
        }

        let unused = !self.used.contains(node.canon);
        let redeclaration = !complete_definition && self.state.declared.contains(&node.canon);
        if unused || redeclaration {
            self.remove_node(id);
        }

        self.state.declared.insert(node.canon);
    }

    fn visit_record_template(&mut self, id: NodeId, node: &DeclNode) {
        let DeclKind::RecordTemplate { is_definition } = node.kind else {
            return;
        };

        let unused = !self.used.contains(node.canon);
        let redeclaration = !is_definition && self.state.declared.contains(&node.canon);
        if unused || redeclaration {
            self.remove_node(id);
        }

        self.state.declared.insert(node.canon);
    }

    fn visit_type_alias(&mut self, id: NodeId, node: &DeclNode) {
        let DeclKind::TypeAlias {
            described_alias_template,
        } = node.kind
        else {
            return;
        };

        // Handled as an alias template instead.
        if described_alias_template {
            return;
        }

        if !self.used.contains(node.canon) {
            self.remove_node(id);
        }
    }

    fn visit_alias_template(&mut self, id: NodeId, node: &DeclNode) {
        // Checks the node's own identity, not the canonical one.
        if !self.used.contains(node.own) {
            self.remove_node(id);
        }
    }

    fn visit_using_directive(&mut self, id: NodeId, node: &DeclNode) {
        let DeclKind::UsingDirective { nominated } = node.kind else {
            return;
        };

        // Kept only when the namespace resolved, is used, and no directive
        // for it has been retained yet.
        let keep = match nominated {
            Some(ns) => self.used.contains(ns) && self.state.used_namespaces.insert(ns),
            None => false,
        };

        if !keep {
            self.remove_node(id);
        }
    }

    fn visit_variable(&mut self, id: NodeId, node: &DeclNode) {
        if !self.used.contains(node.canon) {
            self.remove_node(id);
        }
    }

    /// Mark a node removed and resolve its removal range(s).
    ///
    /// The range covers the declaration itself, extended over a trailing
    /// terminator when one follows (a class or alias declaration does not
    /// own its `;`). An attached comment becomes a separate request: it may
    /// be non-adjacent to the declaration, and the rewriter accepts disjoint
    /// regions per logical removal.
    fn remove_node(&mut self, id: NodeId) {
        if !self.state.removed.insert(id) {
            return;
        }

        let node = self.ast.node(id);
        debug!(
            "Removing {} {} at {}",
            node.kind.display_name(),
            id,
            node.span
        );

        let mut end = node.span.end;
        if let Some(past_terminator) = terminator_after(self.source, end) {
            end = past_terminator;
        }
        self.ranges.push(Span::new(node.span.start, end));

        if self.remove_comments {
            if let Some(comment) = node.comment {
                self.ranges.push(comment);
            }
        }
    }
}
