//! Rows describing individual objects: class instances and the objects an
//! object references.

use heapscope_analysis::HeapAnalysis;
use heapscope_graph::{GraphStore, NodeOrdinal};
use heapscope_schemas::{EdgeType, NodeId};
use serde::Serialize;

use crate::columns::{Column, ObjectColumn, SortValue, SortableRow, sort_rows};
use crate::error::ViewError;

/// A store together with its analysis.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzedSnapshot<'a> {
    pub store: &'a GraphStore,
    pub analysis: &'a HeapAnalysis,
}

impl<'a> AnalyzedSnapshot<'a> {
    pub fn new(store: &'a GraphStore, analysis: &'a HeapAnalysis) -> Self {
        Self { store, analysis }
    }
}

/// One object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRow {
    /// Snapshot id.
    pub id: NodeId,
    /// Display text: class label and id.
    pub object: String,
    /// Hops from the root; `None` when unreachable.
    pub distance: Option<u32>,
    pub shallow_size: u64,
    pub retained_size: u64,
    #[serde(skip)]
    pub ordinal: NodeOrdinal,
}

impl InstanceRow {
    /// Describes the node at `ordinal`.
    pub fn new(snapshot: AnalyzedSnapshot<'_>, ordinal: NodeOrdinal) -> Self {
        let node = snapshot.store.node_at(ordinal);
        Self {
            id: node.id,
            object: format!(
                "{} {}",
                snapshot.store.class_key(ordinal),
                node.id
            ),
            distance: snapshot.analysis.distance(ordinal),
            shallow_size: node.self_size,
            retained_size: snapshot.analysis.retained_size(ordinal),
            ordinal,
        }
    }
}

impl SortableRow for InstanceRow {
    type Column = ObjectColumn;
    type Key<'a> = NodeId;

    fn value(&self, column: ObjectColumn) -> SortValue<'_> {
        match column {
            ObjectColumn::Object => SortValue::Text(&self.object),
            ObjectColumn::Distance => SortValue::distance(self.distance),
            ObjectColumn::ShallowSize => SortValue::size(self.shallow_size),
            ObjectColumn::RetainedSize => SortValue::size(self.retained_size),
        }
    }

    fn row_key(&self) -> NodeId {
        self.id
    }
}

/// One outgoing reference and the object it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRow {
    /// Property name or element index.
    pub edge_name: String,
    pub edge_type: EdgeType,
    /// Display text: edge name, class label, and id of the target.
    pub object: String,
    /// The referenced object.
    pub target: InstanceRow,
    /// Forward position of the edge in the store.
    #[serde(skip)]
    pub position: usize,
}

impl SortableRow for EdgeRow {
    type Column = ObjectColumn;
    type Key<'a> = usize;

    fn value(&self, column: ObjectColumn) -> SortValue<'_> {
        match column {
            ObjectColumn::Object => SortValue::Text(&self.object),
            column => self.target.value(column),
        }
    }

    fn row_key(&self) -> usize {
        self.position
    }
}

/// Builds sorted rows for a set of instances.
///
/// # Errors
///
/// Returns [`ViewError::is_unknown_column`] for unknown column ids.
pub fn instance_rows(
    snapshot: AnalyzedSnapshot<'_>,
    instances: &[NodeOrdinal],
    column: &str,
    ascending: bool,
) -> Result<Vec<InstanceRow>, ViewError> {
    let column = ObjectColumn::parse(column)?;
    let mut rows: Vec<InstanceRow> = instances
        .iter()
        .map(|&ordinal| InstanceRow::new(snapshot, ordinal))
        .collect();
    sort_rows(&mut rows, column, ascending);
    Ok(rows)
}

/// Builds sorted rows for every reference held by the node with `id`.
///
/// # Errors
///
/// Returns [`ViewError::is_invalid_argument`] for unknown ids or columns.
pub fn edge_rows(
    snapshot: AnalyzedSnapshot<'_>,
    id: NodeId,
    column: &str,
    ascending: bool,
) -> Result<Vec<EdgeRow>, ViewError> {
    let column = ObjectColumn::parse(column)?;
    let store = snapshot.store;
    let from = store.require_ordinal(id)?;

    let mut rows: Vec<EdgeRow> = store
        .outgoing_edges(from)
        .iter()
        .zip(store.outgoing_positions(from))
        .map(|(edge, position)| {
            let target = InstanceRow::new(snapshot, edge.to);
            let edge_name = edge.label_text();
            EdgeRow {
                object: format!("{edge_name} :: {}", target.object),
                edge_name,
                edge_type: edge.edge_type,
                target,
                position,
            }
        })
        .collect();
    sort_rows(&mut rows, column, ascending);
    Ok(rows)
}
