//! Reverse-reference queries: who keeps a node alive.
//!
//! Retainer queries do not depend on dominance, so they work on any store,
//! including one without a root. Every edge type is reported, weak and
//! shortcut edges included; a presenter that wants to hide them filters on
//! [`Retainer::edge_type`].

use heapscope_schemas::{EdgeLabel, EdgeType, NodeId};
use indexmap::IndexSet;
use tracing::{debug, debug_span};

use crate::error::GraphError;
use crate::store::{GraphStore, NodeOrdinal};

/// Default number of levels [`RetainerIndex::auto_expand_chain`] descends.
pub const DEFAULT_AUTO_EXPAND_DEPTH: usize = 20;

/// One incoming reference of a queried node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retainer {
    /// Ordinal of the retaining node.
    pub node: NodeOrdinal,
    /// Snapshot id of the retaining node.
    pub id: NodeId,
    /// Forward position of the retaining edge in the store.
    pub edge_position: usize,
    /// Kind of the retaining edge.
    pub edge_type: EdgeType,
    /// Label of the retaining edge.
    pub label: Option<EdgeLabel>,
}

/// A retainer placed at a depth below the queried node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRow {
    /// Distance from the queried node; direct retainers are at depth 1.
    pub depth: usize,
    /// Node that the retainer keeps alive.
    pub retained: NodeOrdinal,
    /// The retaining reference.
    pub retainer: Retainer,
}

/// Why an auto-expansion stopped descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStop {
    /// The last expanded node has no retainers.
    Unretained,
    /// The last expanded node has two or more retainers.
    Branched,
    /// The depth cap was reached.
    DepthCap,
    /// The single retainer was already on the chain.
    Cycle,
}

/// Rows produced by walking a singleton retainer chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainerChain {
    /// Rows in presentation order: each level's retainers follow the row
    /// they retain.
    pub rows: Vec<ChainRow>,
    /// Why the walk ended.
    pub stop: ChainStop,
}

impl RetainerChain {
    /// Returns the deepest level that has rows, or 0 for an empty chain.
    pub fn depth(&self) -> usize {
        self.rows.last().map_or(0, |row| row.depth)
    }
}

/// Retainer queries over one [`GraphStore`].
///
/// Thin handle over the store's reverse edge index; cheap to create and
/// `Copy`, so concurrent queries can each hold their own.
#[derive(Debug, Clone, Copy)]
pub struct RetainerIndex<'a> {
    store: &'a GraphStore,
}

impl<'a> RetainerIndex<'a> {
    /// Creates an index over `store`.
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Returns the store this index queries.
    pub fn store(&self) -> &'a GraphStore {
        self.store
    }

    /// Lists every incoming reference of the node with `id`.
    ///
    /// Retainers are grouped by retaining node ordinal and, within one
    /// retaining node, follow its edge order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::is_invalid_argument`] for unknown ids.
    pub fn retainers_of(
        &self,
        id: NodeId,
    ) -> Result<Vec<Retainer>, GraphError> {
        let ordinal = self.store.require_ordinal(id)?;
        Ok(self.retainers_at(ordinal))
    }

    /// Lists every incoming reference of a node by ordinal.
    pub fn retainers_at(&self, ordinal: NodeOrdinal) -> Vec<Retainer> {
        self.store
            .incoming_positions(ordinal)
            .iter()
            .map(|&position| {
                let edge = self.store.edge_at(position);
                Retainer {
                    node: edge.from,
                    id: self.store.node_at(edge.from).id,
                    edge_position: position,
                    edge_type: edge.edge_type,
                    label: edge.label.clone(),
                }
            })
            .collect()
    }

    /// Returns how many references point at a node.
    pub fn retainer_count(&self, ordinal: NodeOrdinal) -> usize {
        self.store.incoming_positions(ordinal).len()
    }

    /// Walks up a chain of single retainers starting at `id`.
    ///
    /// At each level the current node's retainers are listed one level
    /// deeper. When there is exactly one retainer the walk moves to it;
    /// otherwise it stops. The walk also stops after `cap` levels or when the
    /// single retainer already appears on the chain.
    ///
    /// Why: long linked-list style retention paths would otherwise need one
    /// manual expansion per level.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::is_invalid_argument`] for unknown ids.
    pub fn auto_expand_chain(
        &self,
        id: NodeId,
        cap: usize,
    ) -> Result<RetainerChain, GraphError> {
        let ordinal = self.store.require_ordinal(id)?;
        Ok(self.auto_expand_from(ordinal, cap))
    }

    /// Ordinal form of [`RetainerIndex::auto_expand_chain`].
    pub fn auto_expand_from(
        &self,
        start: NodeOrdinal,
        cap: usize,
    ) -> RetainerChain {
        let _span = debug_span!("auto_expand", start = start.index(), cap)
            .entered();

        let mut rows = Vec::new();
        let mut on_chain = IndexSet::from([start]);
        let mut current = start;
        let mut depth = 0;

        let stop = loop {
            if depth == cap {
                break ChainStop::DepthCap;
            }

            let retainers = self.retainers_at(current);
            let single = match retainers.as_slice() {
                [only] => Some(only.node),
                _ => None,
            };
            let count = retainers.len();
            rows.extend(retainers.into_iter().map(|retainer| ChainRow {
                depth: depth + 1,
                retained: current,
                retainer,
            }));

            let Some(next) = single else {
                break if count == 0 {
                    ChainStop::Unretained
                } else {
                    ChainStop::Branched
                };
            };
            if !on_chain.insert(next) {
                break ChainStop::Cycle;
            }
            current = next;
            depth += 1;
        };

        debug!(row_count = rows.len(), ?stop, "Auto-expanded retainer chain");
        RetainerChain { rows, stop }
    }
}

#[cfg(test)]
mod tests {
    use heapscope_schemas::SnapshotBuilder;

    use super::*;

    /// Builds `{l1a, l1b} -> L1 -> L2 -> L3` with `L3` also rooted nowhere.
    fn make_level_chain() -> (GraphStore, NodeId) {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let l1a = builder.add_object("L1a", 4);
        let l1b = builder.add_object("L1b", 4);
        let l1 = builder.add_object("L1", 8);
        let l2 = builder.add_object("L2", 8);
        let l3 = builder.add_object("L3", 8);
        builder.property(root, l1a, "a");
        builder.property(root, l1b, "b");
        builder.property(l1a, l1, "l1");
        builder.property(l1b, l1, "l1");
        builder.property(l1, l2, "next");
        builder.property(l2, l3, "next");
        let store = GraphStore::from_snapshot(builder.build()).unwrap();
        (store, l3)
    }

    /// Builds a chain of `len` objects where object `i` retains `i + 1`.
    fn make_linear_chain(len: usize) -> (GraphStore, NodeId) {
        let mut builder = SnapshotBuilder::new();
        let mut previous = builder.root();
        for i in 0..len {
            let next = builder.add_object(format!("Link{i}"), 8);
            builder.property(previous, next, "next");
            previous = next;
        }
        let store = GraphStore::from_snapshot(builder.build()).unwrap();
        (store, previous)
    }

    fn names(
        store: &GraphStore,
        chain: &RetainerChain,
    ) -> Vec<(usize, String)> {
        chain
            .rows
            .iter()
            .map(|row| {
                let node = store.node_at(row.retainer.node);
                (row.depth, node.name.clone())
            })
            .collect()
    }

    #[test]
    fn retainers_include_every_edge_type() {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let target = builder.add_object("Target", 4);
        let holder = builder.add_object("Holder", 4);
        builder.property(root, holder, "holder");
        builder.link(root, target, EdgeType::Shortcut, None);
        builder.link(holder, target, EdgeType::Weak, None);
        builder.link(
            holder,
            target,
            EdgeType::Element,
            Some(EdgeLabel::Index(3)),
        );
        let store = GraphStore::from_snapshot(builder.build()).unwrap();

        let index = RetainerIndex::new(&store);
        let retainers = index.retainers_of(target).unwrap();
        let types: Vec<EdgeType> =
            retainers.iter().map(|r| r.edge_type).collect();
        assert_eq!(
            types,
            vec![EdgeType::Shortcut, EdgeType::Weak, EdgeType::Element]
        );
        assert_eq!(retainers[2].label, Some(EdgeLabel::Index(3)));
        assert_eq!(index.retainer_count(store.ordinal_of(target).unwrap()), 3);
    }

    #[test]
    fn unknown_id_is_invalid_argument() {
        let (store, _) = make_level_chain();
        let index = RetainerIndex::new(&store);
        let err = index.retainers_of(NodeId(777)).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(
            index
                .auto_expand_chain(NodeId(777), DEFAULT_AUTO_EXPAND_DEPTH)
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    /// The walk descends through L2 and L1, then lists both of L1's
    /// retainers and stops.
    #[test]
    fn auto_expand_stops_at_branch() {
        let (store, l3) = make_level_chain();
        let chain = RetainerIndex::new(&store)
            .auto_expand_chain(l3, DEFAULT_AUTO_EXPAND_DEPTH)
            .unwrap();

        assert_eq!(
            names(&store, &chain),
            vec![
                (1, "L2".to_owned()),
                (2, "L1".to_owned()),
                (3, "L1a".to_owned()),
                (3, "L1b".to_owned()),
            ]
        );
        assert_eq!(chain.stop, ChainStop::Branched);
        assert_eq!(chain.depth(), 3);
    }

    #[test]
    fn auto_expand_respects_depth_cap() {
        let (store, tail) = make_linear_chain(1000);
        let chain = RetainerIndex::new(&store)
            .auto_expand_chain(tail, DEFAULT_AUTO_EXPAND_DEPTH)
            .unwrap();

        assert_eq!(chain.rows.len(), 20);
        assert_eq!(chain.stop, ChainStop::DepthCap);
        assert_eq!(
            chain.rows.iter().map(|r| r.depth).collect::<Vec<_>>(),
            (1..=20).collect::<Vec<_>>()
        );
    }

    #[test]
    fn auto_expand_reaches_unretained_root() {
        let (store, tail) = make_linear_chain(3);
        let chain = RetainerIndex::new(&store)
            .auto_expand_chain(tail, DEFAULT_AUTO_EXPAND_DEPTH)
            .unwrap();

        // Link1, Link0, then the root which has no retainers.
        assert_eq!(chain.rows.len(), 3);
        assert_eq!(chain.stop, ChainStop::Unretained);
    }

    #[test]
    fn auto_expand_stops_on_cycle() {
        let mut builder = SnapshotBuilder::new();
        let a = builder.add_object("A", 4);
        let b = builder.add_object("B", 4);
        builder.property(a, b, "b");
        builder.property(b, a, "a");
        let store = GraphStore::from_snapshot(builder.build()).unwrap();

        let chain = RetainerIndex::new(&store)
            .auto_expand_chain(a, DEFAULT_AUTO_EXPAND_DEPTH)
            .unwrap();
        assert_eq!(
            names(&store, &chain),
            vec![(1, "B".to_owned()), (2, "A".to_owned())]
        );
        assert_eq!(chain.stop, ChainStop::Cycle);
    }

    #[test]
    fn zero_cap_lists_nothing() {
        let (store, l3) = make_level_chain();
        let chain =
            RetainerIndex::new(&store).auto_expand_chain(l3, 0).unwrap();
        assert!(chain.rows.is_empty());
        assert_eq!(chain.stop, ChainStop::DepthCap);
    }
}
