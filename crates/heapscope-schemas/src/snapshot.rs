//! Snapshot ingestion schema.
//!
//! A snapshot is a flat list of node records and a flat list of edge records
//! that reference nodes by id. The producer (a heap profiler) is an external
//! collaborator; this module only fixes the deserialized shape.
//!
//! ## Terminology
//!
//! - **Node**: one heap object. Its `id` is unique within a snapshot.
//! - **Edge**: one reference from a node to another. Its label is either a
//!   property name or an element index.
//! - **Root**: the synthetic node every live object is reachable from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the node used as the root when a snapshot does not name one.
pub const GC_ROOTS_NAME: &str = "(GC roots)";

/// Snapshot-assigned node identifier.
///
/// Ids are unique within one snapshot. They are not guaranteed to be stable
/// across independently captured snapshots, so nothing outside a single
/// snapshot should rely on them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Kind of heap object a node represents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Internal VM object with no user-visible class.
    Hidden,
    /// Internal array (backing stores, descriptor arrays).
    Array,
    /// Flat string.
    String,
    /// Regular object; its name is the constructor name.
    #[default]
    Object,
    /// Compiled code.
    Code,
    /// Function closure.
    Closure,
    /// Regular expression.
    Regexp,
    /// Boxed heap number.
    Number,
    /// Object owned by the embedder (DOM nodes and similar).
    Native,
    /// Bookkeeping node that exists only to structure the snapshot.
    Synthetic,
    /// Rope string made by concatenation.
    ConcatenatedString,
    /// String that views a slice of another string.
    SlicedString,
    /// Symbol value.
    Symbol,
    /// Arbitrary-precision integer.
    Bigint,
}

impl NodeType {
    /// All node types, in declaration order.
    pub const ALL: [NodeType; 14] = [
        NodeType::Hidden,
        NodeType::Array,
        NodeType::String,
        NodeType::Object,
        NodeType::Code,
        NodeType::Closure,
        NodeType::Regexp,
        NodeType::Number,
        NodeType::Native,
        NodeType::Synthetic,
        NodeType::ConcatenatedString,
        NodeType::SlicedString,
        NodeType::Symbol,
        NodeType::Bigint,
    ];

    /// Returns the kebab-case wire name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Hidden => "hidden",
            NodeType::Array => "array",
            NodeType::String => "string",
            NodeType::Object => "object",
            NodeType::Code => "code",
            NodeType::Closure => "closure",
            NodeType::Regexp => "regexp",
            NodeType::Number => "number",
            NodeType::Native => "native",
            NodeType::Synthetic => "synthetic",
            NodeType::ConcatenatedString => "concatenated-string",
            NodeType::SlicedString => "sliced-string",
            NodeType::Symbol => "symbol",
            NodeType::Bigint => "bigint",
        }
    }

    /// Returns true for nodes that only structure the snapshot.
    ///
    /// Why: bookkeeping nodes such as `(GC roots)` are excluded from
    /// user-facing class aggregates and diffs.
    pub fn is_bookkeeping(self) -> bool {
        matches!(self, NodeType::Synthetic)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of reference an edge represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    /// VM-internal field.
    Internal,
    /// Named property.
    #[default]
    Property,
    /// Indexed element.
    Element,
    /// Link that is not visible from user code.
    Hidden,
    /// Display-only link that surfaces a deep object near the root.
    Shortcut,
    /// Reference that does not keep its target alive.
    Weak,
}

impl EdgeType {
    /// Returns the kebab-case wire name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Internal => "internal",
            EdgeType::Property => "property",
            EdgeType::Element => "element",
            EdgeType::Hidden => "hidden",
            EdgeType::Shortcut => "shortcut",
            EdgeType::Weak => "weak",
        }
    }

    /// Returns true if the edge participates in distance computation.
    ///
    /// Weak edges never shorten a path; shortcut edges do.
    pub fn counts_for_distance(self) -> bool {
        !matches!(self, EdgeType::Weak)
    }

    /// Returns true if the edge can make its source a dominator of its
    /// target.
    ///
    /// Weak edges do not retain, and shortcut edges exist only for display,
    /// so neither may become a structural parent.
    pub fn counts_for_dominance(self) -> bool {
        !matches!(self, EdgeType::Weak | EdgeType::Shortcut)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label carried by an edge: a property name or an element index.
///
/// Serializes as `{"name": "..."}` or `{"index": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeLabel {
    /// Property or variable name.
    Name(String),
    /// Array element or internal slot index.
    Index(u32),
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeLabel::Name(name) => f.write_str(name),
            EdgeLabel::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for EdgeLabel {
    fn from(value: &str) -> Self {
        EdgeLabel::Name(value.to_owned())
    }
}

impl From<u32> for EdgeLabel {
    fn from(value: u32) -> Self {
        EdgeLabel::Index(value)
    }
}

/// One heap object as emitted by the snapshot producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Snapshot-unique id.
    pub id: NodeId,
    /// Display name (constructor name, string contents, and so on).
    #[serde(default)]
    pub name: String,
    /// Object kind.
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    /// Bytes owned directly by this object.
    #[serde(default)]
    pub self_size: u64,
}

/// One reference as emitted by the snapshot producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Id of the referencing node.
    pub from: NodeId,
    /// Id of the referenced node.
    pub to: NodeId,
    /// Reference kind.
    #[serde(rename = "type", default)]
    pub edge_type: EdgeType,
    /// Property name or element index, when the producer emits one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<EdgeLabel>,
}

/// A complete, deserialized heap snapshot.
///
/// Edges appear grouped however the producer likes; the graph store keeps
/// their relative order per source node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Id of the root-set node. When absent, the node named
    /// [`GC_ROOTS_NAME`] is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeId>,
    /// All heap objects.
    pub nodes: Vec<NodeRecord>,
    /// All references between them.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}
