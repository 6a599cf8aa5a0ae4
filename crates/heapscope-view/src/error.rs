//! Error types for view construction.
//!
//! Covers column lookups, row addressing, graph query failures, and loading
//! the view configuration.

use std::{fmt, io};

use heapscope_graph::GraphError;

/// Errors that can occur while building or updating a view.
///
/// Why: presentation code reports rejected arguments and configuration
/// problems through one type, while keeping graph errors inspectable.
#[derive(Debug)]
pub struct ViewError {
    kind: ViewErrorKind,
}

/// The specific category of view error.
#[derive(Debug)]
enum ViewErrorKind {
    /// The column id is not defined for this view.
    UnknownColumn { view: &'static str, column: String },
    /// A row index does not address an existing row.
    RowOutOfRange { row: usize, len: usize },
    /// A graph query failed.
    Graph(GraphError),
    /// Failed to deserialize the view configuration.
    Deserialize(serde_json::Error),
    /// I/O error reading the view configuration.
    Io(io::Error),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViewErrorKind::UnknownColumn { view, column } => {
                write!(f, "unknown {view} column `{column}`")
            }
            ViewErrorKind::RowOutOfRange { row, len } => {
                write!(f, "row {row} out of range for {len} rows")
            }
            ViewErrorKind::Graph(e) => write!(f, "{e}"),
            ViewErrorKind::Deserialize(e) => {
                write!(f, "failed to deserialize view config: {e}")
            }
            ViewErrorKind::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ViewErrorKind::Graph(e) => Some(e),
            ViewErrorKind::Deserialize(e) => Some(e),
            ViewErrorKind::Io(e) => Some(e),
            ViewErrorKind::UnknownColumn { .. }
            | ViewErrorKind::RowOutOfRange { .. } => None,
        }
    }
}

impl ViewError {
    pub(crate) fn unknown_column(
        view: &'static str,
        column: impl Into<String>,
    ) -> Self {
        Self {
            kind: ViewErrorKind::UnknownColumn {
                view,
                column: column.into(),
            },
        }
    }

    pub(crate) fn row_out_of_range(row: usize, len: usize) -> Self {
        Self {
            kind: ViewErrorKind::RowOutOfRange { row, len },
        }
    }

    pub(crate) fn deserialize(err: serde_json::Error) -> Self {
        Self {
            kind: ViewErrorKind::Deserialize(err),
        }
    }

    /// Returns true if an argument was rejected: an unknown column, a bad
    /// row index, or a graph query with an unknown node.
    pub fn is_invalid_argument(&self) -> bool {
        match &self.kind {
            ViewErrorKind::UnknownColumn { .. }
            | ViewErrorKind::RowOutOfRange { .. } => true,
            ViewErrorKind::Graph(e) => e.is_invalid_argument(),
            ViewErrorKind::Deserialize(_) | ViewErrorKind::Io(_) => false,
        }
    }

    /// Returns true if the column id was not recognized.
    pub fn is_unknown_column(&self) -> bool {
        matches!(self.kind, ViewErrorKind::UnknownColumn { .. })
    }

    /// Returns the underlying graph error, if any.
    pub fn graph_error(&self) -> Option<&GraphError> {
        match &self.kind {
            ViewErrorKind::Graph(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if the view configuration could not be parsed.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ViewErrorKind::Deserialize(_))
    }

    /// Returns true if reading the view configuration failed.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ViewErrorKind::Io(_))
    }
}

impl From<GraphError> for ViewError {
    fn from(err: GraphError) -> Self {
        Self {
            kind: ViewErrorKind::Graph(err),
        }
    }
}

impl From<io::Error> for ViewError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: ViewErrorKind::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use heapscope_schemas::NodeId;

    use super::*;

    #[test]
    fn unknown_column_is_invalid_argument() {
        let err = ViewError::unknown_column("summary", "bogus");
        assert!(err.is_invalid_argument());
        assert!(err.is_unknown_column());
        assert_eq!(err.to_string(), "unknown summary column `bogus`");
        assert!(err.source().is_none());
    }

    #[test]
    fn graph_errors_keep_their_classification() {
        let err = ViewError::from(GraphError::unknown_node(NodeId(5)));
        assert!(err.is_invalid_argument());
        assert!(err.graph_error().is_some());
        assert!(err.source().is_some());

        let err = ViewError::from(GraphError::missing_root());
        assert!(!err.is_invalid_argument());
        assert!(err.graph_error().unwrap().is_missing_root());
    }

    #[test]
    fn row_out_of_range_message() {
        let err = ViewError::row_out_of_range(7, 3);
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("row 7"));
    }
}
