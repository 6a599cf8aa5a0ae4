//! Column definitions and the sort contract.
//!
//! Every view names its columns with fixed string ids, and each column has
//! one sort type. Sorting is always a total order: rows that compare equal
//! on the chosen column fall back to a key unique to the row, so sorting
//! descending yields exactly the reverse of sorting ascending.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::ViewError;

/// How a column's values compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    /// Case-insensitive text, ties broken by byte order.
    Text,
    /// Signed counts and distances.
    Number,
    /// Byte sizes and size deltas.
    Size,
}

impl SortType {
    /// Returns true if `value` is a cell of this sort type: text for
    /// [`SortType::Text`], integers otherwise.
    pub fn admits(self, value: SortValue<'_>) -> bool {
        matches!(
            (self, value),
            (SortType::Text, SortValue::Text(_))
                | (SortType::Number | SortType::Size, SortValue::Int(_))
        )
    }
}

/// Value of one cell, as used for sorting.
#[derive(Debug, Clone, Copy)]
pub enum SortValue<'a> {
    /// Text cell.
    Text(&'a str),
    /// Number or size cell.
    Int(i128),
}

impl SortValue<'_> {
    /// Sort value of an optional distance; unreachable sorts last
    /// ascending.
    pub fn distance(distance: Option<u32>) -> Self {
        SortValue::Int(distance.map_or(i128::from(i64::MAX), i128::from))
    }

    /// Sort value of an instance count.
    pub fn count(value: usize) -> Self {
        SortValue::Int(i128::try_from(value).unwrap_or(i128::MAX))
    }

    /// Sort value of a byte size.
    pub fn size(value: u64) -> Self {
        SortValue::Int(i128::from(value))
    }

    /// Sort value of a signed delta.
    pub fn delta(value: i64) -> Self {
        SortValue::Int(i128::from(value))
    }
}

impl PartialEq for SortValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortValue<'_> {}

impl PartialOrd for SortValue<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => collate(a, b),
            (SortValue::Int(a), SortValue::Int(b)) => a.cmp(b),
            (SortValue::Text(_), SortValue::Int(_)) => Ordering::Less,
            (SortValue::Int(_), SortValue::Text(_)) => Ordering::Greater,
        }
    }
}

/// Text collation: Unicode lowercase first, then raw bytes.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// A view column with a fixed string id and sort type.
pub trait Column: Copy + Sized + 'static {
    /// View name used in error messages.
    const VIEW: &'static str;
    /// Every column of the view, in display order.
    const ALL: &'static [Self];

    /// Returns the column id.
    fn id(self) -> &'static str;

    /// Returns how the column sorts.
    fn sort_type(self) -> SortType;

    /// Looks up a column by id.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::is_unknown_column`] for ids this view does not
    /// define.
    fn parse(id: &str) -> Result<Self, ViewError> {
        Self::ALL
            .iter()
            .copied()
            .find(|column| column.id() == id)
            .ok_or_else(|| ViewError::unknown_column(Self::VIEW, id))
    }
}

/// A row that can be sorted by the columns of its view.
pub trait SortableRow {
    /// Column set of the view.
    type Column: Column;
    /// Key unique to the row within one view.
    type Key<'a>: Ord
    where
        Self: 'a;

    /// Returns the cell value for `column`.
    fn value(&self, column: Self::Column) -> SortValue<'_>;

    /// Returns the tie-breaking key.
    fn row_key(&self) -> Self::Key<'_>;
}

/// Compares two rows by `column`, then by row key.
pub fn compare_rows<R: SortableRow>(
    a: &R,
    b: &R,
    column: R::Column,
) -> Ordering {
    a.value(column)
        .cmp(&b.value(column))
        .then_with(|| a.row_key().cmp(&b.row_key()))
}

/// Sorts rows by `column` in the given direction.
pub fn sort_rows<R: SortableRow>(
    rows: &mut [R],
    column: R::Column,
    ascending: bool,
) {
    debug_assert!(
        rows.iter()
            .all(|row| column.sort_type().admits(row.value(column))),
        "column `{}` produced a cell of the wrong sort type",
        column.id(),
    );
    if ascending {
        rows.sort_by(|a, b| compare_rows(a, b, column));
    } else {
        rows.sort_by(|a, b| compare_rows(b, a, column));
    }
}

/// Columns of the summary view (one row per class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryColumn {
    Object,
    Distance,
    Count,
    ShallowSize,
    RetainedSize,
}

impl Column for SummaryColumn {
    const VIEW: &'static str = "summary";
    const ALL: &'static [Self] = &[
        SummaryColumn::Object,
        SummaryColumn::Distance,
        SummaryColumn::Count,
        SummaryColumn::ShallowSize,
        SummaryColumn::RetainedSize,
    ];

    fn id(self) -> &'static str {
        match self {
            SummaryColumn::Object => "object",
            SummaryColumn::Distance => "distance",
            SummaryColumn::Count => "count",
            SummaryColumn::ShallowSize => "shallowSize",
            SummaryColumn::RetainedSize => "retainedSize",
        }
    }

    fn sort_type(self) -> SortType {
        match self {
            SummaryColumn::Object => SortType::Text,
            SummaryColumn::Distance | SummaryColumn::Count => SortType::Number,
            SummaryColumn::ShallowSize | SummaryColumn::RetainedSize => {
                SortType::Size
            }
        }
    }
}

/// Columns of instance and edge rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectColumn {
    Object,
    Distance,
    ShallowSize,
    RetainedSize,
}

impl Column for ObjectColumn {
    const VIEW: &'static str = "object";
    const ALL: &'static [Self] = &[
        ObjectColumn::Object,
        ObjectColumn::Distance,
        ObjectColumn::ShallowSize,
        ObjectColumn::RetainedSize,
    ];

    fn id(self) -> &'static str {
        match self {
            ObjectColumn::Object => "object",
            ObjectColumn::Distance => "distance",
            ObjectColumn::ShallowSize => "shallowSize",
            ObjectColumn::RetainedSize => "retainedSize",
        }
    }

    fn sort_type(self) -> SortType {
        match self {
            ObjectColumn::Object => SortType::Text,
            ObjectColumn::Distance => SortType::Number,
            ObjectColumn::ShallowSize | ObjectColumn::RetainedSize => {
                SortType::Size
            }
        }
    }
}

/// Columns of the comparison view (one row per class).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonColumn {
    Object,
    AddedCount,
    RemovedCount,
    CountDelta,
    AddedSize,
    RemovedSize,
    SizeDelta,
}

impl Column for ComparisonColumn {
    const VIEW: &'static str = "comparison";
    const ALL: &'static [Self] = &[
        ComparisonColumn::Object,
        ComparisonColumn::AddedCount,
        ComparisonColumn::RemovedCount,
        ComparisonColumn::CountDelta,
        ComparisonColumn::AddedSize,
        ComparisonColumn::RemovedSize,
        ComparisonColumn::SizeDelta,
    ];

    fn id(self) -> &'static str {
        match self {
            ComparisonColumn::Object => "object",
            ComparisonColumn::AddedCount => "addedCount",
            ComparisonColumn::RemovedCount => "removedCount",
            ComparisonColumn::CountDelta => "countDelta",
            ComparisonColumn::AddedSize => "addedSize",
            ComparisonColumn::RemovedSize => "removedSize",
            ComparisonColumn::SizeDelta => "sizeDelta",
        }
    }

    fn sort_type(self) -> SortType {
        match self {
            ComparisonColumn::Object => SortType::Text,
            ComparisonColumn::AddedCount
            | ComparisonColumn::RemovedCount
            | ComparisonColumn::CountDelta => SortType::Number,
            ComparisonColumn::AddedSize
            | ComparisonColumn::RemovedSize
            | ComparisonColumn::SizeDelta => SortType::Size,
        }
    }
}
