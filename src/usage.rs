use crate::ast::CanonId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The used-declaration oracle: the set of canonical identities reachable
/// from the program's semantic entry points.
///
/// The elimination pass only ever calls [`contains`](Self::contains); the set
/// is computed before the pass runs and never mutated by it.
#[derive(Debug, Clone, Default)]
pub struct UsedDeclarations {
    used: HashSet<CanonId>,
}

impl UsedDeclarations {
    /// Create an empty oracle (everything unused)
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a canonical identity as used
    pub fn insert(&mut self, id: CanonId) {
        self.used.insert(id);
    }

    /// Check whether a canonical identity is reachable
    pub fn contains(&self, id: CanonId) -> bool {
        self.used.contains(&id)
    }

    /// Number of used identities
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Compute the used set from declaration-level dependency edges.
    ///
    /// An edge `(from, to)` records that `from` references `to`; everything
    /// reachable from `roots` along such edges is used. Roots themselves are
    /// always used, whether or not they appear in `edges`.
    pub fn from_dependencies(
        edges: impl IntoIterator<Item = (CanonId, CanonId)>,
        roots: impl IntoIterator<Item = CanonId>,
    ) -> Self {
        let mut graph: DiGraph<CanonId, ()> = DiGraph::new();
        let mut node_map: HashMap<CanonId, NodeIndex> = HashMap::new();

        let mut intern = |graph: &mut DiGraph<CanonId, ()>, id: CanonId| -> NodeIndex {
            *node_map.entry(id).or_insert_with(|| graph.add_node(id))
        };

        for (from, to) in edges {
            let from_idx = intern(&mut graph, from);
            let to_idx = intern(&mut graph, to);
            graph.add_edge(from_idx, to_idx, ());
        }

        let mut used = HashSet::new();
        for root in roots {
            used.insert(root);

            let start = intern(&mut graph, root);
            let mut dfs = Dfs::new(&graph, start);
            while let Some(node_idx) = dfs.next(&graph) {
                used.insert(graph[node_idx]);
            }
        }

        debug!(
            "Reachability: {} of {} declarations used",
            used.len(),
            graph.node_count()
        );

        Self { used }
    }
}

impl FromIterator<CanonId> for UsedDeclarations {
    fn from_iter<I: IntoIterator<Item = CanonId>>(iter: I) -> Self {
        Self {
            used: iter.into_iter().collect(),
        }
    }
}
