//! Immutable node/edge storage for one snapshot.
//!
//! Nodes are addressed internally by dense [`NodeOrdinal`]s assigned in
//! ingestion order; snapshot ids are only used at the API boundary. Edges are
//! stored in compressed-sparse-row form: all edges of a node are contiguous
//! and keep the producer's relative order. The reverse (retainer) index uses
//! the same layout and is built on first use.

use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

use heapscope_schemas::{
    EdgeLabel, EdgeType, GC_ROOTS_NAME, NodeId, NodeType, SnapshotRecord,
};
use indexmap::IndexSet;
use tracing::{debug, debug_span};

use crate::class::ClassKey;
use crate::error::{GraphError, GraphErrorKind};

/// Dense index of a node within one [`GraphStore`].
///
/// Ordinals are only meaningful for the store that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeOrdinal(u32);

impl NodeOrdinal {
    /// Wraps a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit in `u32`. Indices below the length of
    /// a [`GraphStore`] always fit; ingestion rejects larger snapshots.
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("node ordinal exceeds u32"))
    }

    /// Returns the raw index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One heap object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Snapshot-unique id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Object kind.
    pub node_type: NodeType,
    /// Bytes owned directly by this object.
    pub self_size: u64,
}

/// One reference between two nodes of the same store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Referencing node.
    pub from: NodeOrdinal,
    /// Referenced node.
    pub to: NodeOrdinal,
    /// Reference kind.
    pub edge_type: EdgeType,
    /// Property name or element index.
    pub label: Option<EdgeLabel>,
}

impl Edge {
    /// Returns the label as display text, or the empty string.
    pub fn label_text(&self) -> String {
        self.label
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// Reverse edge index in compressed-sparse-row form.
///
/// `positions[offsets[n]..offsets[n + 1]]` are the forward-edge positions of
/// every edge whose target is `n`.
#[derive(Debug)]
struct ReverseIndex {
    offsets: Vec<usize>,
    positions: Vec<usize>,
}

impl ReverseIndex {
    /// Builds the index in two passes: count in-degrees, then fill.
    fn build(node_count: usize, edges: &[Edge]) -> Self {
        let _span = debug_span!("build_reverse_index").entered();

        let mut offsets = vec![0usize; node_count + 1];
        for edge in edges {
            offsets[edge.to.index() + 1] += 1;
        }
        for i in 0..node_count {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets[..node_count].to_vec();
        let mut positions = vec![0usize; edges.len()];
        for (position, edge) in edges.iter().enumerate() {
            let slot = &mut cursor[edge.to.index()];
            positions[*slot] = position;
            *slot += 1;
        }

        debug!(edge_count = edges.len(), "Built reverse edge index");
        Self { offsets, positions }
    }

    fn positions_of(&self, ordinal: NodeOrdinal) -> &[usize] {
        let i = ordinal.index();
        &self.positions[self.offsets[i]..self.offsets[i + 1]]
    }
}

/// Immutable graph for one snapshot.
///
/// Constructed once from a [`SnapshotRecord`]; there is no mutation API.
/// The store is `Send + Sync`, so any number of analyses and queries may
/// read it concurrently.
#[derive(Debug)]
pub struct GraphStore {
    nodes: Vec<Node>,
    /// Node ids by ordinal; also the id → ordinal lookup.
    ids: IndexSet<NodeId>,
    /// `edges[edge_offsets[n]..edge_offsets[n + 1]]` are the edges of `n`.
    edge_offsets: Vec<usize>,
    edges: Vec<Edge>,
    root: Option<NodeOrdinal>,
    reverse: OnceLock<ReverseIndex>,
}

/// Rejects node counts whose ordinals would not fit in `u32`.
fn check_node_count(count: usize) -> Result<(), GraphError> {
    match u32::try_from(count) {
        Ok(_) => Ok(()),
        Err(_) => Err(GraphError::new(GraphErrorKind::TooManyNodes(count))),
    }
}

impl GraphStore {
    /// Ingests a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if:
    /// - two nodes share an id ([`GraphError::is_duplicate_node`])
    /// - an edge names a node id that does not exist
    ///   ([`GraphError::is_invalid_reference`])
    /// - the snapshot names a root id that does not exist
    ///   ([`GraphError::is_invalid_reference`])
    /// - there are more nodes than ordinals can address
    ///   ([`GraphError::is_too_many_nodes`])
    ///
    /// A snapshot without any root is accepted here; analyses that need the
    /// root report [`GraphError::is_missing_root`].
    pub fn from_snapshot(snapshot: SnapshotRecord) -> Result<Self, GraphError> {
        let _span = debug_span!("ingest").entered();
        let SnapshotRecord { root, nodes, edges } = snapshot;
        check_node_count(nodes.len())?;

        // Step 1: Assign ordinals and reject duplicate ids.
        let mut ids = IndexSet::with_capacity(nodes.len());
        let mut stored = Vec::with_capacity(nodes.len());
        for record in nodes {
            if !ids.insert(record.id) {
                return Err(GraphError::new(GraphErrorKind::DuplicateNode(
                    record.id,
                )));
            }
            stored.push(Node {
                id: record.id,
                name: record.name,
                node_type: record.node_type,
                self_size: record.self_size,
            });
        }

        let lookup = |id: NodeId, referrer: &dyn Fn() -> String| {
            ids.get_index_of(&id)
                .map(NodeOrdinal::new)
                .ok_or_else(|| GraphError::invalid_reference(referrer(), id))
        };

        // Step 2: Resolve edge endpoints. A dangling edge rejects the whole
        // snapshot.
        let mut resolved = Vec::with_capacity(edges.len());
        for record in edges {
            let describe = || format!("edge {} -> {}", record.from, record.to);
            let from = lookup(record.from, &describe)?;
            let to = lookup(record.to, &describe)?;
            resolved.push(Edge {
                from,
                to,
                edge_type: record.edge_type,
                label: record.label,
            });
        }

        // Step 3: Resolve the root.
        let root = match root {
            Some(id) => Some(lookup(id, &|| "root designation".to_owned())?),
            None => stored
                .iter()
                .position(|node| node.name == GC_ROOTS_NAME)
                .map(NodeOrdinal::new),
        };

        // Step 4: Group edges by source with a stable counting sort.
        let node_count = stored.len();
        let mut edge_offsets = vec![0usize; node_count + 1];
        for edge in &resolved {
            edge_offsets[edge.from.index() + 1] += 1;
        }
        for i in 0..node_count {
            edge_offsets[i + 1] += edge_offsets[i];
        }
        let mut cursor = edge_offsets[..node_count].to_vec();
        let mut slots: Vec<Option<Edge>> = vec![None; resolved.len()];
        for edge in resolved {
            let slot = &mut cursor[edge.from.index()];
            slots[*slot] = Some(edge);
            *slot += 1;
        }
        let edges: Vec<Edge> = slots.into_iter().flatten().collect();

        debug!(
            node_count,
            edge_count = edges.len(),
            has_root = root.is_some(),
            "Built graph store"
        );

        Ok(Self {
            nodes: stored,
            ids,
            edge_offsets,
            edges,
            root,
            reverse: OnceLock::new(),
        })
    }

    /// Parses snapshot JSON from a reader and ingests it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on I/O failure, malformed JSON, or any
    /// ingestion error of [`GraphStore::from_snapshot`].
    pub fn from_json_reader(mut input: impl Read) -> Result<Self, GraphError> {
        let mut json = String::new();
        input.read_to_string(&mut json)?;
        let snapshot: SnapshotRecord = serde_json::from_str(&json)?;
        Self::from_snapshot(snapshot)
    }

    /// Loads and ingests a snapshot JSON file.
    ///
    /// # Errors
    ///
    /// See [`GraphStore::from_json_reader`].
    pub fn load_snapshot(path: &Path) -> Result<Self, GraphError> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the root-set node, if the snapshot has one.
    pub fn root(&self) -> Option<NodeOrdinal> {
        self.root
    }

    /// Returns the root-set node or a `MissingRoot` error.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::is_missing_root`] if the snapshot has no root.
    pub fn require_root(&self) -> Result<NodeOrdinal, GraphError> {
        self.root.ok_or_else(GraphError::missing_root)
    }

    /// Iterates over all ordinals in ingestion order.
    pub fn ordinals(&self) -> impl Iterator<Item = NodeOrdinal> + use<> {
        (0..self.nodes.len()).map(NodeOrdinal::new)
    }

    /// Looks up the ordinal of a node id.
    pub fn ordinal_of(&self, id: NodeId) -> Option<NodeOrdinal> {
        self.ids.get_index_of(&id).map(NodeOrdinal::new)
    }

    /// Looks up the ordinal of a node id, failing for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::is_invalid_argument`] for unknown ids.
    pub fn require_ordinal(
        &self,
        id: NodeId,
    ) -> Result<NodeOrdinal, GraphError> {
        self.ordinal_of(id)
            .ok_or_else(|| GraphError::unknown_node(id))
    }

    /// Returns the node with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::is_invalid_argument`] for unknown ids.
    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.require_ordinal(id).map(|ordinal| self.node_at(ordinal))
    }

    /// Returns the node at an ordinal issued by this store.
    pub fn node_at(&self, ordinal: NodeOrdinal) -> &Node {
        &self.nodes[ordinal.index()]
    }

    /// Returns all nodes in ordinal order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the outgoing edges of a node in producer order.
    pub fn outgoing_edges(&self, ordinal: NodeOrdinal) -> &[Edge] {
        let i = ordinal.index();
        &self.edges[self.edge_offsets[i]..self.edge_offsets[i + 1]]
    }

    /// Returns the forward positions of a node's outgoing edges.
    pub fn outgoing_positions(&self, ordinal: NodeOrdinal) -> Range<usize> {
        let i = ordinal.index();
        self.edge_offsets[i]..self.edge_offsets[i + 1]
    }

    /// Returns the edge at a forward position.
    pub fn edge_at(&self, position: usize) -> &Edge {
        &self.edges[position]
    }

    /// Returns the forward positions of every edge pointing at a node.
    ///
    /// Positions are ordered by retaining node ordinal, then by the
    /// retaining node's edge order. The reverse index is built on the first
    /// call.
    pub fn incoming_positions(&self, ordinal: NodeOrdinal) -> &[usize] {
        self.reverse_index().positions_of(ordinal)
    }

    /// Returns the incoming edges of a node.
    pub fn incoming_edges(
        &self,
        ordinal: NodeOrdinal,
    ) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming_positions(ordinal)
            .iter()
            .map(|&position| &self.edges[position])
    }

    /// Returns the class a node is aggregated under.
    pub fn class_key(&self, ordinal: NodeOrdinal) -> ClassKey {
        let node = self.node_at(ordinal);
        ClassKey::new(node.name.clone(), node.node_type)
    }

    fn reverse_index(&self) -> &ReverseIndex {
        self.reverse
            .get_or_init(|| ReverseIndex::build(self.nodes.len(), &self.edges))
    }
}
