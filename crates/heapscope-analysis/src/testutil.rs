//! Random rooted snapshots for property tests.

use heapscope_schemas::{
    EdgeRecord, EdgeType, NodeId, NodeRecord, NodeType, SnapshotRecord,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_node_type() -> impl Strategy<Value = NodeType> {
    proptest::sample::select(NodeType::ALL.to_vec())
}

fn arb_edge_type() -> impl Strategy<Value = EdgeType> {
    prop_oneof![
        3 => Just(EdgeType::Property),
        1 => Just(EdgeType::Element),
        1 => Just(EdgeType::Internal),
        1 => Just(EdgeType::Hidden),
        1 => Just(EdgeType::Shortcut),
        1 => Just(EdgeType::Weak),
    ]
}

prop_compose! {
    /// Snapshots with a synthetic root at id 1 and a handful of shared
    /// names, so classes have several instances.
    pub fn arb_rooted_snapshot()
        (node_count in 1usize..24)
        (
            nodes in vec(
                (
                    prop::sample::select(vec!["", "A", "B", "Window"]),
                    arb_node_type(),
                    0u64..512,
                ),
                node_count - 1,
            ),
            edges in vec(
                (0..node_count, 0..node_count, arb_edge_type()),
                0..48,
            ),
        )
    -> SnapshotRecord {
        let mut records = vec![NodeRecord {
            id: NodeId(1),
            name: String::new(),
            node_type: NodeType::Synthetic,
            self_size: 0,
        }];
        records.extend(nodes.into_iter().enumerate().map(
            |(i, (name, node_type, self_size))| NodeRecord {
                id: NodeId(i as u64 + 2),
                name: name.to_owned(),
                node_type,
                self_size,
            },
        ));
        let edges = edges
            .into_iter()
            .map(|(from, to, edge_type)| EdgeRecord {
                from: records[from].id,
                to: records[to].id,
                edge_type,
                label: None,
            })
            .collect();
        SnapshotRecord { root: Some(NodeId(1)), nodes: records, edges }
    }
}

/// Returns a copy of `snapshot` without edges of `edge_type`.
pub fn without_edges(
    snapshot: &SnapshotRecord,
    edge_type: EdgeType,
) -> SnapshotRecord {
    SnapshotRecord {
        root: snapshot.root,
        nodes: snapshot.nodes.clone(),
        edges: snapshot
            .edges
            .iter()
            .filter(|edge| edge.edge_type != edge_type)
            .cloned()
            .collect(),
    }
}
