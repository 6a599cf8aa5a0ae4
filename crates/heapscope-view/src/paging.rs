//! Incremental reveal of long child lists.
//!
//! Expanding a row with thousands of children reveals only the first chunk.
//! The rest is offered through a "show more" affordance that names both the
//! next chunk and everything that remains.

use serde::Serialize;

use crate::columns::{SortableRow, sort_rows};

/// What the "show more" control offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowMore {
    /// Rows revealed by the next "show more".
    pub next: usize,
    /// Rows revealed by "show all".
    pub all: usize,
}

/// Reveal state for one child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    total: usize,
    revealed: usize,
    chunk: usize,
}

impl Pager {
    /// Creates a pager revealing up to `chunk` of `total` rows.
    ///
    /// A chunk of zero is treated as one.
    pub fn new(total: usize, chunk: usize) -> Self {
        let chunk = chunk.max(1);
        Self {
            total,
            revealed: total.min(chunk),
            chunk,
        }
    }

    /// Returns the number of rows.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns the number of revealed rows.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    /// Returns the number of hidden rows.
    pub fn remaining(&self) -> usize {
        self.total - self.revealed
    }

    /// Reveals the next chunk and returns how many rows were added.
    pub fn show_more(&mut self) -> usize {
        let added = self.chunk.min(self.remaining());
        self.revealed += added;
        added
    }

    /// Reveals every remaining row and returns how many were added.
    pub fn show_all(&mut self) -> usize {
        let added = self.remaining();
        self.revealed = self.total;
        added
    }

    /// Returns the "show more" offer, or `None` when nothing is hidden.
    pub fn affordance(&self) -> Option<ShowMore> {
        let remaining = self.remaining();
        (remaining > 0).then(|| ShowMore {
            next: self.chunk.min(remaining),
            all: remaining,
        })
    }
}

/// Sorted children of one expandable row.
///
/// Collapsing hides the rows but keeps the reveal count, so expanding again
/// shows the same rows and the same affordance.
#[derive(Debug, Clone)]
pub struct ChildPage<T> {
    rows: Vec<T>,
    pager: Pager,
    expanded: bool,
}

impl<T> ChildPage<T> {
    /// Creates a collapsed page over `rows`.
    pub fn new(rows: Vec<T>, populate_count: usize) -> Self {
        let pager = Pager::new(rows.len(), populate_count);
        Self {
            rows,
            pager,
            expanded: false,
        }
    }

    /// Shows the revealed rows.
    pub fn expand(&mut self) {
        self.expanded = true;
    }

    /// Hides every row without forgetting how many were revealed.
    pub fn collapse(&mut self) {
        self.expanded = false;
    }

    /// Returns true while expanded.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Returns the rows currently on screen.
    pub fn visible(&self) -> &[T] {
        if self.expanded {
            &self.rows[..self.pager.revealed()]
        } else {
            &[]
        }
    }

    /// Returns every row, revealed or not.
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Returns the reveal state.
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Reveals the next chunk.
    pub fn show_more(&mut self) -> usize {
        self.pager.show_more()
    }

    /// Reveals everything.
    pub fn show_all(&mut self) -> usize {
        self.pager.show_all()
    }

    /// Returns the "show more" offer while expanded.
    pub fn affordance(&self) -> Option<ShowMore> {
        if self.expanded {
            self.pager.affordance()
        } else {
            None
        }
    }
}

impl<T: SortableRow> ChildPage<T> {
    /// Re-sorts every row. The reveal count is unchanged.
    pub fn sort(&mut self, column: T::Column, ascending: bool) {
        sort_rows(&mut self.rows, column, ascending);
    }
}

/// Reveal state for a comparison row's two child buckets.
///
/// Added instances are listed before removed ones. A reveal budget fills the
/// added bucket first and spills the rest into the removed bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPager {
    added_total: usize,
    removed_total: usize,
    added_revealed: usize,
    removed_revealed: usize,
    chunk: usize,
}

impl BucketPager {
    /// Creates a pager and reveals the first chunk.
    pub fn new(added_total: usize, removed_total: usize, chunk: usize) -> Self {
        let mut pager = Self {
            added_total,
            removed_total,
            added_revealed: 0,
            removed_revealed: 0,
            chunk: chunk.max(1),
        };
        pager.reveal(pager.chunk);
        pager
    }

    fn reveal(&mut self, budget: usize) -> usize {
        let added = budget.min(self.added_total - self.added_revealed);
        self.added_revealed += added;
        let removed =
            (budget - added).min(self.removed_total - self.removed_revealed);
        self.removed_revealed += removed;
        added + removed
    }

    /// Returns the number of revealed added rows.
    pub fn added_revealed(&self) -> usize {
        self.added_revealed
    }

    /// Returns the number of revealed removed rows.
    pub fn removed_revealed(&self) -> usize {
        self.removed_revealed
    }

    /// Returns the number of hidden rows across both buckets.
    pub fn remaining(&self) -> usize {
        (self.added_total - self.added_revealed)
            + (self.removed_total - self.removed_revealed)
    }

    /// Reveals the next chunk and returns how many rows were added.
    pub fn show_more(&mut self) -> usize {
        self.reveal(self.chunk)
    }

    /// Reveals every remaining row and returns how many were added.
    pub fn show_all(&mut self) -> usize {
        self.reveal(self.remaining())
    }

    /// Returns the "show more" offer, or `None` when nothing is hidden.
    pub fn affordance(&self) -> Option<ShowMore> {
        let remaining = self.remaining();
        (remaining > 0).then(|| ShowMore {
            next: self.chunk.min(remaining),
            all: remaining,
        })
    }
}
