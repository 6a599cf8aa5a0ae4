//! Dominator tree over retaining references.
//!
//! A node `d` dominates `n` when every path from the root to `n` passes
//! through `d`. Only edges that keep their target alive take part: weak
//! references never retain, and shortcut edges are presentation links that
//! duplicate a longer real path.
//!
//! ## Orphans
//!
//! Nodes that the root cannot reach over retaining edges still occupy heap
//! space, so they must land somewhere in the tree or their sizes vanish from
//! every total. The head of each unreachable region is attached directly
//! under the root:
//!
//! 1. In ordinal order, every unreached node without an incoming retaining
//!    edge becomes a head, and everything it reaches is marked.
//! 2. Any nodes still unreached sit on pure cycles; in ordinal order the
//!    lowest remaining one becomes a head for its cycle.
//!
//! The heads are then given virtual root edges and the ordinary dominator
//! computation runs once over the whole graph.

use heapscope_graph::{GraphError, GraphStore, NodeOrdinal};
use petgraph::algo::dominators::simple_fast;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::distance::Distances;

/// Why a node is unreachable over retaining edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanKind {
    /// No non-weak path from the root exists.
    WeakOnly,
    /// The only non-weak paths from the root use shortcut edges.
    ShortcutOnly,
}

/// Immediate-dominator tree for one store.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    root: NodeOrdinal,
    /// Parent in the tree; `None` only for the root.
    parents: Vec<Option<NodeOrdinal>>,
    /// Orphan heads, in attachment order.
    heads: Vec<NodeOrdinal>,
    is_head: Vec<bool>,
    orphans: Vec<Option<OrphanKind>>,
    /// `children[n]` in ordinal order.
    children: Vec<Vec<NodeOrdinal>>,
}

impl DominatorTree {
    /// Returns the root of the tree.
    pub fn root(&self) -> NodeOrdinal {
        self.root
    }

    /// Returns the immediate dominator of a node.
    ///
    /// `None` for the root and for orphan heads, which have no real
    /// dominator even though they hang under the root.
    pub fn immediate_dominator(
        &self,
        ordinal: NodeOrdinal,
    ) -> Option<NodeOrdinal> {
        if self.is_head[ordinal.index()] {
            None
        } else {
            self.parents[ordinal.index()]
        }
    }

    /// Returns the parent used for size accumulation; `None` only for the
    /// root.
    pub fn tree_parent(&self, ordinal: NodeOrdinal) -> Option<NodeOrdinal> {
        self.parents[ordinal.index()]
    }

    /// Returns the tree children of a node in ordinal order.
    pub fn children(&self, ordinal: NodeOrdinal) -> &[NodeOrdinal] {
        &self.children[ordinal.index()]
    }

    /// Returns true if the root cannot reach the node over retaining edges.
    pub fn is_orphan(&self, ordinal: NodeOrdinal) -> bool {
        self.orphans[ordinal.index()].is_some()
    }

    /// Returns why a node is an orphan, or `None` for retained nodes.
    pub fn orphan_kind(&self, ordinal: NodeOrdinal) -> Option<OrphanKind> {
        self.orphans[ordinal.index()]
    }

    /// Returns the number of orphan nodes.
    pub fn orphan_count(&self) -> usize {
        self.orphans.iter().filter(|kind| kind.is_some()).count()
    }

    /// Returns the heads attached under the root.
    pub fn orphan_heads(&self) -> &[NodeOrdinal] {
        &self.heads
    }

    /// Returns the number of nodes covered, which equals the store size.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns true for an empty tree. A tree always holds its root, so this
    /// is never true for a tree built by [`compute_dominators`].
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Computes the dominator tree of `store`.
///
/// `distances` must come from the same store; they classify orphans.
///
/// # Errors
///
/// Returns [`GraphError`] if:
/// - the store has no root ([`GraphError::is_missing_root`])
/// - `distances` cover a different number of nodes
///   ([`GraphError::is_invalid_argument`])
pub fn compute_dominators(
    store: &GraphStore,
    distances: &Distances,
) -> Result<DominatorTree, GraphError> {
    let _span = debug_span!("compute_dominators").entered();
    let root = store.require_root()?;
    let node_count = store.node_count();
    if distances.len() != node_count {
        return Err(GraphError::invalid_argument(format!(
            "distances cover {} nodes, store has {node_count}",
            distances.len()
        )));
    }

    // Step 1: Build the retaining subgraph with node index == ordinal.
    let mut graph =
        DiGraph::<(), ()>::with_capacity(node_count, store.edge_count());
    for _ in 0..node_count {
        graph.add_node(());
    }
    let mut has_incoming = vec![false; node_count];
    for from in store.ordinals() {
        for edge in store.outgoing_edges(from) {
            if !edge.edge_type.counts_for_dominance() {
                continue;
            }
            graph.add_edge(
                NodeIndex::new(from.index()),
                NodeIndex::new(edge.to.index()),
                (),
            );
            if edge.to != from {
                has_incoming[edge.to.index()] = true;
            }
        }
    }

    // Step 2: Mark what the root retains.
    let root_index = NodeIndex::new(root.index());
    let mut dfs = Dfs::new(&graph, root_index);
    while dfs.next(&graph).is_some() {}
    let retained: Vec<bool> = (0..node_count)
        .map(|i| dfs.discovered.contains(i))
        .collect();

    // Step 3: Pick orphan heads, first region sources, then cycle members.
    let mut heads = Vec::new();
    let mut pick = |dfs: &mut Dfs<NodeIndex, _>, i: usize| {
        heads.push(NodeOrdinal::new(i));
        dfs.move_to(NodeIndex::new(i));
        while dfs.next(&graph).is_some() {}
    };
    for i in 0..node_count {
        if !dfs.discovered.contains(i) && !has_incoming[i] {
            pick(&mut dfs, i);
        }
    }
    for i in 0..node_count {
        if !dfs.discovered.contains(i) {
            pick(&mut dfs, i);
        }
    }

    // Step 4: Attach heads under the root and compute dominators.
    for &head in &heads {
        graph.add_edge(root_index, NodeIndex::new(head.index()), ());
    }
    let dominators = simple_fast(&graph, root_index);

    let mut parents = vec![None; node_count];
    let mut children = vec![Vec::new(); node_count];
    for i in 0..node_count {
        if i == root.index() {
            continue;
        }
        if let Some(parent) =
            dominators.immediate_dominator(NodeIndex::new(i))
        {
            let parent = NodeOrdinal::new(parent.index());
            parents[i] = Some(parent);
            children[parent.index()].push(NodeOrdinal::new(i));
        }
    }

    let mut is_head = vec![false; node_count];
    for &head in &heads {
        is_head[head.index()] = true;
    }
    let orphans: Vec<Option<OrphanKind>> = (0..node_count)
        .map(|i| {
            if retained[i] {
                None
            } else if distances.is_reachable(NodeOrdinal::new(i)) {
                Some(OrphanKind::ShortcutOnly)
            } else {
                Some(OrphanKind::WeakOnly)
            }
        })
        .collect();

    let tree = DominatorTree {
        root,
        parents,
        heads,
        is_head,
        orphans,
        children,
    };
    debug!(
        orphan_count = tree.orphan_count(),
        head_count = tree.heads.len(),
        "Computed dominator tree"
    );
    Ok(tree)
}
