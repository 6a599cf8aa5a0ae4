//! Comparison view: per-class changes between two snapshots.

use heapscope_diff::{ClassDiff, SnapshotDiff};
use heapscope_graph::ClassKey;
use serde::Serialize;
use tracing::debug;

use crate::columns::{
    Column, ComparisonColumn, ObjectColumn, SortValue, SortableRow, sort_rows,
};
use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::objects::{AnalyzedSnapshot, InstanceRow, instance_rows};
use crate::paging::{BucketPager, ShowMore};

/// One class in the comparison view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub object: String,
    pub added_count: usize,
    pub removed_count: usize,
    pub count_delta: i64,
    pub added_size: u64,
    pub removed_size: u64,
    pub size_delta: i64,
    #[serde(skip)]
    pub class: ClassKey,
}

impl SortableRow for ComparisonRow {
    type Column = ComparisonColumn;
    type Key<'a> = &'a ClassKey;

    fn value(&self, column: ComparisonColumn) -> SortValue<'_> {
        match column {
            ComparisonColumn::Object => SortValue::Text(&self.object),
            ComparisonColumn::AddedCount => SortValue::count(self.added_count),
            ComparisonColumn::RemovedCount => {
                SortValue::count(self.removed_count)
            }
            ComparisonColumn::CountDelta => SortValue::delta(self.count_delta),
            ComparisonColumn::AddedSize => SortValue::size(self.added_size),
            ComparisonColumn::RemovedSize => SortValue::size(self.removed_size),
            ComparisonColumn::SizeDelta => SortValue::delta(self.size_delta),
        }
    }

    fn row_key(&self) -> &ClassKey {
        &self.class
    }
}

/// Builds the comparison rows sorted by `column`.
///
/// # Errors
///
/// Returns [`ViewError::is_unknown_column`] for unknown column ids.
pub fn comparison_rows(
    diff: &SnapshotDiff,
    column: &str,
    ascending: bool,
) -> Result<Vec<ComparisonRow>, ViewError> {
    let column = ComparisonColumn::parse(column)?;
    let mut rows: Vec<ComparisonRow> = diff
        .iter()
        .map(|(class, change)| ComparisonRow {
            object: class.label(),
            added_count: change.added_count,
            removed_count: change.removed_count,
            count_delta: change.count_delta,
            added_size: change.added_size,
            removed_size: change.removed_size,
            size_delta: change.size_delta,
            class: class.clone(),
        })
        .collect();
    sort_rows(&mut rows, column, ascending);
    debug!(row_count = rows.len(), column = column.id(), "Built comparison");
    Ok(rows)
}

/// Instances behind one comparison row.
///
/// Added instances come from the target snapshot and are listed first;
/// removed instances come from the base snapshot.
#[derive(Debug, Clone)]
pub struct ComparisonChildren {
    added: Vec<InstanceRow>,
    removed: Vec<InstanceRow>,
    pager: BucketPager,
}

impl ComparisonChildren {
    /// Builds the children of `change`, each bucket sorted by `column`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::is_unknown_column`] for unknown column ids.
    pub fn new(
        base: AnalyzedSnapshot<'_>,
        target: AnalyzedSnapshot<'_>,
        change: &ClassDiff,
        column: &str,
        ascending: bool,
        config: &ViewConfig,
    ) -> Result<Self, ViewError> {
        let added = instance_rows(target, &change.added, column, ascending)?;
        let removed = instance_rows(base, &change.removed, column, ascending)?;
        let pager = BucketPager::new(
            added.len(),
            removed.len(),
            config.default_populate_count,
        );
        Ok(Self {
            added,
            removed,
            pager,
        })
    }

    /// Returns the revealed added instances.
    pub fn visible_added(&self) -> &[InstanceRow] {
        &self.added[..self.pager.added_revealed()]
    }

    /// Returns the revealed removed instances.
    pub fn visible_removed(&self) -> &[InstanceRow] {
        &self.removed[..self.pager.removed_revealed()]
    }

    /// Returns the number of revealed rows across both buckets.
    pub fn visible_count(&self) -> usize {
        self.pager.added_revealed() + self.pager.removed_revealed()
    }

    /// Re-sorts both buckets. Reveal counts are unchanged.
    pub fn sort(&mut self, column: ObjectColumn, ascending: bool) {
        sort_rows(&mut self.added, column, ascending);
        sort_rows(&mut self.removed, column, ascending);
    }

    /// Reveals the next chunk.
    pub fn show_more(&mut self) -> usize {
        self.pager.show_more()
    }

    /// Reveals everything.
    pub fn show_all(&mut self) -> usize {
        self.pager.show_all()
    }

    /// Returns the "show more" offer, or `None` when nothing is hidden.
    pub fn affordance(&self) -> Option<ShowMore> {
        self.pager.affordance()
    }
}

#[cfg(test)]
mod tests {
    use heapscope_analysis::analyze;
    use heapscope_diff::diff;
    use heapscope_graph::GraphStore;
    use heapscope_schemas::SnapshotBuilder;

    use super::*;

    fn make_items(count: usize, size: u64) -> GraphStore {
        let mut builder = SnapshotBuilder::new();
        let root = builder.root();
        for i in 0..count {
            let item = builder.add_object("Item", size);
            builder.property(root, item, &format!("item{i}"));
        }
        let other = builder.add_object("Other", 1);
        builder.property(root, other, "other");
        GraphStore::from_snapshot(builder.build()).unwrap()
    }

    #[test]
    fn comparison_rows_sort_by_delta() {
        let base = make_items(2, 10);
        let target = make_items(5, 10);
        let result = diff(&base, &target);

        let rows = comparison_rows(&result, "countDelta", false).unwrap();
        assert_eq!(rows[0].object, "Item");
        assert_eq!(rows[0].count_delta, 3);
        assert_eq!(rows[0].size_delta, 30);
        assert_eq!(rows[1].object, "Other");
        assert_eq!(rows[1].count_delta, 0);

        let err = comparison_rows(&result, "retainedSize", true).unwrap_err();
        assert!(err.is_unknown_column());
    }

    #[test]
    fn every_column_yields_its_sort_type() {
        let result = diff(&make_items(1, 4), &make_items(3, 4));
        let rows = comparison_rows(&result, "object", true).unwrap();
        for &column in ComparisonColumn::ALL {
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
    fn children_list_added_before_removed() {
        let base = make_items(3, 10);
        let target = make_items(2, 10);
        let base_analysis = analyze(&base).unwrap();
        let target_analysis = analyze(&target).unwrap();
        let result = diff(&base, &target);
        let (_, change) = result.find_by_label("Item").unwrap();
        let config = ViewConfig {
            default_populate_count: 3,
            ..ViewConfig::default()
        };

        let mut children = ComparisonChildren::new(
            AnalyzedSnapshot::new(&base, &base_analysis),
            AnalyzedSnapshot::new(&target, &target_analysis),
            change,
            "object",
            true,
            &config,
        )
        .unwrap();
        assert_eq!(children.visible_added().len(), 2);
        assert_eq!(children.visible_removed().len(), 1);
        assert_eq!(children.affordance(), Some(ShowMore { next: 2, all: 2 }));

        assert_eq!(children.show_more(), 2);
        assert_eq!(children.visible_removed().len(), 3);
        assert_eq!(children.affordance(), None);
    }
}
