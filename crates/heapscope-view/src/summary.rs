//! Summary view: one row per class, expandable into instances.

use heapscope_analysis::{ClassAggregate, ClassStatistics};
use heapscope_graph::ClassKey;
use serde::Serialize;
use tracing::debug;

use crate::columns::{
    Column, SortValue, SortableRow, SummaryColumn, sort_rows,
};
use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::objects::{AnalyzedSnapshot, InstanceRow, instance_rows};
use crate::paging::ChildPage;

/// One class in the summary view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    /// Class label.
    pub object: String,
    pub distance: Option<u32>,
    pub count: usize,
    pub shallow_size: u64,
    pub retained_size: u64,
    #[serde(skip)]
    pub class: ClassKey,
}

impl SummaryRow {
    fn new(class: &ClassKey, aggregate: &ClassAggregate) -> Self {
        Self {
            object: class.label(),
            distance: aggregate.distance,
            count: aggregate.count,
            shallow_size: aggregate.shallow_size,
            retained_size: aggregate.retained_size,
            class: class.clone(),
        }
    }
}

impl SortableRow for SummaryRow {
    type Column = SummaryColumn;
    type Key<'a> = &'a ClassKey;

    fn value(&self, column: SummaryColumn) -> SortValue<'_> {
        match column {
            SummaryColumn::Object => SortValue::Text(&self.object),
            SummaryColumn::Distance => SortValue::distance(self.distance),
            SummaryColumn::Count => SortValue::count(self.count),
            SummaryColumn::ShallowSize => SortValue::size(self.shallow_size),
            SummaryColumn::RetainedSize => SortValue::size(self.retained_size),
        }
    }

    fn row_key(&self) -> &ClassKey {
        &self.class
    }
}

/// Builds the summary rows sorted by `column`.
///
/// # Errors
///
/// Returns [`ViewError::is_unknown_column`] for unknown column ids.
pub fn summary_rows(
    classes: &ClassStatistics,
    column: &str,
    ascending: bool,
) -> Result<Vec<SummaryRow>, ViewError> {
    let column = SummaryColumn::parse(column)?;
    let mut rows: Vec<SummaryRow> = classes
        .iter()
        .map(|(class, aggregate)| SummaryRow::new(class, aggregate))
        .collect();
    sort_rows(&mut rows, column, ascending);
    debug!(row_count = rows.len(), column = column.id(), "Built summary");
    Ok(rows)
}

/// Builds the collapsed instance list of one class.
///
/// Instances are sorted by `column`, an instance column id, and revealed
/// `config.default_populate_count` at a time.
///
/// # Errors
///
/// Returns [`ViewError::is_unknown_column`] for unknown column ids.
pub fn class_instances(
    snapshot: AnalyzedSnapshot<'_>,
    aggregate: &ClassAggregate,
    column: &str,
    ascending: bool,
    config: &ViewConfig,
) -> Result<ChildPage<InstanceRow>, ViewError> {
    let rows =
        instance_rows(snapshot, &aggregate.instances, column, ascending)?;
    Ok(ChildPage::new(rows, config.default_populate_count))
}

#[cfg(test)]
mod tests {
    use heapscope_analysis::analyze;
    use heapscope_graph::GraphStore;
    use heapscope_schemas::{NodeType, SnapshotBuilder};

    use super::*;

    /// Classes with distinct counts, sizes, and distances.
    fn make_classes() -> GraphStore {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        let holder = builder.add_object("holder", 8);
        builder.property(root, holder, "h");
        for i in 0..3 {
            let item = builder.add_object("Item", 10);
            builder.property(holder, item, &format!("item{i}"));
        }
        let blob = builder.add_node("", 500, NodeType::Native);
        builder.property(root, blob, "blob");
        GraphStore::from_snapshot(builder.build()).unwrap()
    }

    #[test]
    fn summary_rows_sort_by_each_column() {
        let store = make_classes();
        let analysis = analyze(&store).unwrap();

        let labels = |column, ascending| -> Vec<String> {
            summary_rows(&analysis.classes, column, ascending)
                .unwrap()
                .into_iter()
                .map(|row| row.object)
                .collect()
        };

        assert_eq!(labels("object", true), vec!["(native)", "holder", "Item"]);
        assert_eq!(labels("count", false), vec!["Item", "holder", "(native)"]);
        assert_eq!(
            labels("retainedSize", false),
            vec!["(native)", "holder", "Item"]
        );
        assert_eq!(
            labels("distance", true),
            vec!["(native)", "holder", "Item"]
        );
    }

    #[test]
    fn every_column_yields_its_sort_type() {
        let store = make_classes();
        let analysis = analyze(&store).unwrap();
        let rows = summary_rows(&analysis.classes, "object", true).unwrap();
        for &column in SummaryColumn::ALL {
            for row in &rows {
                assert!(
                    column.sort_type().admits(row.value(column)),
                    "{}",
                    column.id()
                );
            }
        }
    }

    #[test]
    fn summary_rejects_instance_only_column() {
        let store = make_classes();
        let analysis = analyze(&store).unwrap();
        let err =
            summary_rows(&analysis.classes, "addedCount", true).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn class_instances_start_collapsed() {
        let store = make_classes();
        let analysis = analyze(&store).unwrap();
        let (_, item) = analysis.classes.find_by_label("Item").unwrap();
        let config = ViewConfig {
            default_populate_count: 2,
            ..ViewConfig::default()
        };

        let mut page = class_instances(
            AnalyzedSnapshot::new(&store, &analysis),
            item,
            "object",
            true,
            &config,
        )
        .unwrap();
        assert!(page.visible().is_empty());
        page.expand();
        assert_eq!(page.visible().len(), 2);
        assert_eq!(page.pager().remaining(), 1);
    }
}
