//! Shared proptest strategies for schema tests.

use proptest::collection::vec;
use proptest::prelude::*;

use crate::snapshot::{
    EdgeLabel, EdgeRecord, EdgeType, NodeId, NodeRecord, NodeType,
    SnapshotRecord,
};

/// Strategy for generating arbitrary identifier-like names.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,11}"
}

pub fn arb_node_type() -> impl Strategy<Value = NodeType> {
    proptest::sample::select(NodeType::ALL.to_vec())
}

pub fn arb_edge_type() -> impl Strategy<Value = EdgeType> {
    prop_oneof![
        Just(EdgeType::Internal),
        Just(EdgeType::Property),
        Just(EdgeType::Element),
        Just(EdgeType::Hidden),
        Just(EdgeType::Shortcut),
        Just(EdgeType::Weak),
    ]
}

pub fn arb_label() -> impl Strategy<Value = Option<EdgeLabel>> {
    prop_oneof![
        Just(None),
        arb_name().prop_map(|name| Some(EdgeLabel::Name(name))),
        any::<u32>().prop_map(|index| Some(EdgeLabel::Index(index))),
    ]
}

prop_compose! {
    /// Strategy for snapshots whose edges reference existing nodes.
    pub fn arb_snapshot()
        (node_count in 1usize..12)
        (
            nodes in vec((arb_name(), arb_node_type(), 0u64..4096), node_count),
            edges in vec(
                (0..node_count, 0..node_count, arb_edge_type(), arb_label()),
                0..24,
            ),
        )
    -> SnapshotRecord {
        let nodes: Vec<NodeRecord> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, (name, node_type, self_size))| NodeRecord {
                id: NodeId(i as u64 + 1),
                name,
                node_type,
                self_size,
            })
            .collect();
        let edges = edges
            .into_iter()
            .map(|(from, to, edge_type, label)| EdgeRecord {
                from: nodes[from].id,
                to: nodes[to].id,
                edge_type,
                label,
            })
            .collect();
        SnapshotRecord { root: Some(nodes[0].id), nodes, edges }
    }
}
