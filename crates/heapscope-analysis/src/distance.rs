//! Shortest-path distance from the root set.

use std::collections::VecDeque;

use heapscope_graph::{GraphError, GraphStore, NodeOrdinal};
use tracing::{debug, debug_span};

/// Hop count from the root for every node.
///
/// Weak edges are never followed, so a node reachable only through weak
/// references has no distance. Shortcut edges count like any other edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distances {
    values: Vec<Option<u32>>,
}

impl Distances {
    /// Returns the distance of a node, or `None` when unreachable.
    pub fn get(&self, ordinal: NodeOrdinal) -> Option<u32> {
        self.values[ordinal.index()]
    }

    /// Returns true if a node is reachable from the root over non-weak edges.
    pub fn is_reachable(&self, ordinal: NodeOrdinal) -> bool {
        self.get(ordinal).is_some()
    }

    /// Returns the number of nodes covered, which equals the store size.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true for an empty store.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of unreachable nodes.
    pub fn unreachable_count(&self) -> usize {
        self.values.iter().filter(|d| d.is_none()).count()
    }
}

/// Computes breadth-first distances from the store's root.
///
/// # Errors
///
/// Returns [`GraphError::is_missing_root`] if the store has no root.
pub fn compute_distances(store: &GraphStore) -> Result<Distances, GraphError> {
    let _span = debug_span!("compute_distances").entered();
    let root = store.require_root()?;

    let mut values = vec![None; store.node_count()];
    values[root.index()] = Some(0);
    let mut queue = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        let next = values[current.index()].map_or(0, |d: u32| d + 1);
        for edge in store.outgoing_edges(current) {
            if edge.edge_type.counts_for_distance()
                && values[edge.to.index()].is_none()
            {
                values[edge.to.index()] = Some(next);
                queue.push_back(edge.to);
            }
        }
    }

    let distances = Distances { values };
    debug!(
        unreachable = distances.unreachable_count(),
        "Computed distances"
    );
    Ok(distances)
}
