//! Error types for the heapscope-graph crate.

use std::backtrace::Backtrace;
use std::fmt;

use heapscope_schemas::NodeId;

/// Error type for snapshot ingestion and graph queries.
///
/// Uses the canonical struct pattern with backtrace capture and `is_xxx()`
/// helper methods. Ingestion errors are fatal for the snapshot; query errors
/// are local and leave the store untouched.
///
/// Why: every crate downstream of the store (analysis, diff, view) reports
/// through this one classification, so callers branch on a single type.
#[derive(Debug)]
pub struct GraphError {
    kind: GraphErrorKind,
    backtrace: Backtrace,
}

/// Internal error variants. Not exposed publicly; use `is_xxx()` methods.
#[derive(Debug)]
pub(crate) enum GraphErrorKind {
    /// An edge or the root designation names a node that does not exist.
    InvalidReference { referrer: String, missing: NodeId },
    /// Two nodes share an id.
    DuplicateNode(NodeId),
    /// The snapshot has more nodes than ordinals can address.
    TooManyNodes(usize),
    /// The snapshot has no root-set node.
    MissingRoot,
    /// A query received an argument that does not fit this store.
    InvalidArgument(String),
    /// Failed to deserialize snapshot JSON.
    Deserialization(serde_json::Error),
    /// I/O error when reading a snapshot.
    Io(std::io::Error),
}

impl GraphError {
    /// Creates an error from an error kind, capturing a backtrace.
    pub(crate) fn new(kind: GraphErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates an error for a reference to a node id that does not exist.
    pub(crate) fn invalid_reference(
        referrer: impl Into<String>,
        missing: NodeId,
    ) -> Self {
        Self::new(GraphErrorKind::InvalidReference {
            referrer: referrer.into(),
            missing,
        })
    }

    /// Creates an error for a snapshot without a root-set node.
    pub fn missing_root() -> Self {
        Self::new(GraphErrorKind::MissingRoot)
    }

    /// Creates an error for a query argument that does not fit the store.
    ///
    /// Why: analysis and view crates validate their own inputs (column
    /// names, mismatched passes) and report them under the same class.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(GraphErrorKind::InvalidArgument(message.into()))
    }

    /// Creates an error for a query naming an unknown node id.
    pub fn unknown_node(id: NodeId) -> Self {
        Self::invalid_argument(format!("no node with id {id}"))
    }

    /// Returns true if an edge or the root named a non-existent node.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self.kind, GraphErrorKind::InvalidReference { .. })
    }

    /// Returns true if two nodes shared an id.
    pub fn is_duplicate_node(&self) -> bool {
        matches!(self.kind, GraphErrorKind::DuplicateNode(_))
    }

    /// Returns true if the snapshot had more nodes than the store can hold.
    pub fn is_too_many_nodes(&self) -> bool {
        matches!(self.kind, GraphErrorKind::TooManyNodes(_))
    }

    /// Returns true if the snapshot had no root-set node.
    pub fn is_missing_root(&self) -> bool {
        matches!(self.kind, GraphErrorKind::MissingRoot)
    }

    /// Returns true if a query argument was rejected.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, GraphErrorKind::InvalidArgument(_))
    }

    /// Returns true if snapshot JSON could not be parsed.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, GraphErrorKind::Deserialization(_))
    }

    /// Returns true if reading the snapshot failed.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, GraphErrorKind::Io(_))
    }

    /// Returns the backtrace captured when this error was created.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for GraphErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphErrorKind::InvalidReference { referrer, missing } => {
                write!(f, "{referrer} references unknown node {missing}")
            }
            GraphErrorKind::DuplicateNode(id) => {
                write!(f, "duplicate node id {id}")
            }
            GraphErrorKind::TooManyNodes(count) => {
                write!(f, "snapshot has {count} nodes, more than fit in u32")
            }
            GraphErrorKind::MissingRoot => {
                write!(f, "snapshot has no root-set node")
            }
            GraphErrorKind::InvalidArgument(message) => {
                write!(f, "invalid argument: {message}")
            }
            GraphErrorKind::Deserialization(err) => {
                write!(f, "failed to deserialize snapshot: {err}")
            }
            GraphErrorKind::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl fmt::Display for GraphError {
    /// Formats the error with a summary and captured backtrace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;

        // Empty unless RUST_BACKTRACE is set.
        write!(f, "{}", self.backtrace)
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            GraphErrorKind::Deserialization(err) => Some(err),
            GraphErrorKind::Io(err) => Some(err),
            GraphErrorKind::InvalidReference { .. }
            | GraphErrorKind::DuplicateNode(_)
            | GraphErrorKind::TooManyNodes(_)
            | GraphErrorKind::MissingRoot
            | GraphErrorKind::InvalidArgument(_) => None,
        }
    }
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        Self::new(GraphErrorKind::Io(err))
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(GraphErrorKind::Deserialization(err))
    }
}
