//! Programmatic snapshot construction.
//!
//! Producers that already hold a heap graph in memory (and tests) build
//! snapshots node by node instead of going through JSON. The builder hands
//! out ids sequentially and always names its first node as the root.

use crate::snapshot::{
    EdgeLabel, EdgeRecord, EdgeType, NodeId, NodeRecord, NodeType,
    SnapshotRecord,
};

/// Incrementally assembles a [`SnapshotRecord`].
///
/// The builder creates an unnamed synthetic root node on construction.
///
/// ```
/// use heapscope_schemas::{EdgeType, NodeType, SnapshotBuilder};
///
/// let mut builder = SnapshotBuilder::new();
/// let window = builder.add_node("Window", 20, NodeType::Object);
/// builder.link(builder.root(), window, EdgeType::Shortcut, None);
/// let snapshot = builder.build();
/// assert_eq!(snapshot.nodes.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    next_id: u64,
    root: NodeId,
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    /// Creates a builder whose ids start at 1.
    pub fn new() -> Self {
        Self::with_first_id(1)
    }

    /// Creates a builder whose ids start at `first_id`.
    ///
    /// Why: two snapshots of the same program built with disjoint id ranges
    /// model independently captured snapshots.
    pub fn with_first_id(first_id: u64) -> Self {
        let root = NodeId(first_id);
        Self {
            next_id: first_id + 1,
            root,
            nodes: vec![NodeRecord {
                id: root,
                name: String::new(),
                node_type: NodeType::Synthetic,
                self_size: 0,
            }],
            edges: Vec::new(),
        }
    }

    /// Returns the id of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Adds a node and returns its id.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        self_size: u64,
        node_type: NodeType,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(NodeRecord {
            id,
            name: name.into(),
            node_type,
            self_size,
        });
        id
    }

    /// Adds an `object` node and returns its id.
    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        self_size: u64,
    ) -> NodeId {
        self.add_node(name, self_size, NodeType::Object)
    }

    /// Adds an edge from `from` to `to`.
    pub fn link(
        &mut self,
        from: NodeId,
        to: NodeId,
        edge_type: EdgeType,
        label: Option<EdgeLabel>,
    ) -> &mut Self {
        self.edges.push(EdgeRecord {
            from,
            to,
            edge_type,
            label,
        });
        self
    }

    /// Adds a `property` edge labelled `name`.
    pub fn property(
        &mut self,
        from: NodeId,
        to: NodeId,
        name: &str,
    ) -> &mut Self {
        self.link(from, to, EdgeType::Property, Some(EdgeLabel::from(name)))
    }

    /// Finishes the snapshot.
    pub fn build(self) -> SnapshotRecord {
        SnapshotRecord {
            root: Some(self.root),
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
