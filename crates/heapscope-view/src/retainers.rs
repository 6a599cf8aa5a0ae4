//! Retainer tree: who keeps an object alive, level by level.
//!
//! The queried object is the implicit root of the tree. Its retainers form
//! the first level, their retainers the second, and so on. Building the tree
//! auto-expands singleton chains so a lone path to the holder is visible
//! without clicking through it; every other row is expanded on demand.
//! Each expanded level reveals `default_populate_count` retainers at a time.

use heapscope_graph::{NodeOrdinal, Retainer, RetainerIndex};
use heapscope_schemas::{EdgeType, NodeId};
use serde::Serialize;
use tracing::debug;

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::paging::{Pager, ShowMore};

/// One (retaining object, retaining reference) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetainerRow {
    /// Level below the queried object; direct retainers are at depth 1.
    pub depth: usize,
    pub id: NodeId,
    /// Class label of the retaining object.
    pub name: String,
    pub edge_type: EdgeType,
    /// Property name or element index of the reference.
    pub edge_name: String,
    pub self_size: u64,
    /// Number of references to the retaining object.
    pub retainer_count: usize,
    /// Whether this row's own retainers are listed below it.
    pub expanded: bool,
    #[serde(skip)]
    pub node: NodeOrdinal,
}

/// Retainers of one expanded object, in index order.
#[derive(Debug, Clone)]
struct Level {
    entries: Vec<usize>,
    pager: Pager,
}

impl Level {
    fn new(entries: Vec<usize>, populate_count: usize) -> Self {
        let pager = Pager::new(entries.len(), populate_count);
        Self { entries, pager }
    }

    fn revealed(&self) -> &[usize] {
        &self.entries[..self.pager.revealed()]
    }
}

#[derive(Debug, Clone)]
struct Entry {
    row: RetainerRow,
    children: Option<Level>,
}

/// Retainer tree of one object.
///
/// Rows are addressed by their position in [`RetainerTree::rows`], which
/// lists the revealed rows in presentation order. Operations that take a
/// `parent` address the queried object with `None` and a row with
/// `Some(row)`.
#[derive(Debug, Clone)]
pub struct RetainerTree<'a> {
    index: RetainerIndex<'a>,
    target: NodeOrdinal,
    populate_count: usize,
    entries: Vec<Entry>,
    top: Level,
}

impl<'a> RetainerTree<'a> {
    /// Builds the tree for the object with `id`, auto-expanding up to
    /// `config.auto_expand_depth` levels.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::is_invalid_argument`] for unknown ids.
    pub fn build(
        index: RetainerIndex<'a>,
        id: NodeId,
        config: &ViewConfig,
    ) -> Result<Self, ViewError> {
        let target = index.store().require_ordinal(id)?;
        // Direct retainers are always listed, even with auto-expansion off.
        let cap = config.auto_expand_depth.max(1);
        let chain = index.auto_expand_from(target, cap);
        let populate_count = config.default_populate_count;

        // The walk only descends through a level with exactly one row, so
        // each level's rows belong to the single row of the level above.
        let mut entries = Vec::with_capacity(chain.rows.len());
        let mut levels: Vec<Vec<usize>> = Vec::new();
        for row in &chain.rows {
            if levels.len() < row.depth {
                levels.push(Vec::new());
            }
            levels[row.depth - 1].push(entries.len());
            entries.push(Entry {
                row: make_row(index, row.depth, &row.retainer),
                children: None,
            });
        }

        let mut levels = levels.into_iter();
        let first_level = levels.next().unwrap_or_default();
        let top = Level::new(first_level, populate_count);
        let mut parent = top.entries.first().copied();
        for level in levels {
            let Some(owner) = parent else { break };
            parent = level.first().copied();
            let entry = &mut entries[owner];
            entry.row.expanded = true;
            entry.children = Some(Level::new(level, populate_count));
        }

        debug!(
            row_count = entries.len(),
            stop = ?chain.stop,
            "Built retainer tree"
        );
        Ok(Self {
            index,
            target,
            populate_count,
            entries,
            top,
        })
    }

    /// Returns the queried object.
    pub fn target(&self) -> NodeOrdinal {
        self.target
    }

    /// Arena indices of the revealed rows, in presentation order.
    fn visible(&self) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack: Vec<usize> =
            self.top.revealed().iter().rev().copied().collect();
        while let Some(entry) = stack.pop() {
            order.push(entry);
            if let Some(level) = &self.entries[entry].children {
                stack.extend(level.revealed().iter().rev());
            }
        }
        order
    }

    fn entry_at(&self, row: usize) -> Result<usize, ViewError> {
        let visible = self.visible();
        visible
            .get(row)
            .copied()
            .ok_or_else(|| ViewError::row_out_of_range(row, visible.len()))
    }

    fn level_mut(
        &mut self,
        parent: Option<usize>,
    ) -> Result<Option<&mut Level>, ViewError> {
        match parent {
            None => Ok(Some(&mut self.top)),
            Some(row) => {
                let entry = self.entry_at(row)?;
                Ok(self.entries[entry].children.as_mut())
            }
        }
    }

    /// Returns the revealed rows in presentation order.
    pub fn rows(&self) -> Vec<&RetainerRow> {
        self.visible()
            .into_iter()
            .map(|entry| &self.entries[entry].row)
            .collect()
    }

    /// Deepest revealed level, or 0 for an unretained object.
    pub fn depth(&self) -> usize {
        self.rows().iter().map(|row| row.depth).max().unwrap_or(0)
    }

    /// Lists the retainers of row `row` directly below it, revealing the
    /// first chunk.
    ///
    /// Returns the number of newly revealed rows; expanding an expanded row
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::is_invalid_argument`] if `row` is out of range.
    pub fn expand(&mut self, row: usize) -> Result<usize, ViewError> {
        let owner = self.entry_at(row)?;
        if self.entries[owner].children.is_some() {
            return Ok(0);
        }
        let RetainerRow { depth, node, .. } = self.entries[owner].row;

        let first = self.entries.len();
        for retainer in self.index.retainers_at(node) {
            self.entries.push(Entry {
                row: make_row(self.index, depth + 1, &retainer),
                children: None,
            });
        }
        let retainers = (first..self.entries.len()).collect();
        let level = Level::new(retainers, self.populate_count);
        let revealed = level.pager.revealed();

        let entry = &mut self.entries[owner];
        entry.row.expanded = true;
        entry.children = Some(level);
        Ok(revealed)
    }

    /// Reveals the next chunk of `parent`'s retainers.
    ///
    /// Returns the number of newly revealed rows, 0 for a collapsed row.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::is_invalid_argument`] if `parent` is out of
    /// range.
    pub fn show_more(
        &mut self,
        parent: Option<usize>,
    ) -> Result<usize, ViewError> {
        Ok(self
            .level_mut(parent)?
            .map_or(0, |level| level.pager.show_more()))
    }

    /// Reveals every retainer of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::is_invalid_argument`] if `parent` is out of
    /// range.
    pub fn show_all(
        &mut self,
        parent: Option<usize>,
    ) -> Result<usize, ViewError> {
        Ok(self
            .level_mut(parent)?
            .map_or(0, |level| level.pager.show_all()))
    }

    /// Returns the "show more" offer below `parent`, or `None` when nothing
    /// is hidden there.
    pub fn affordance(&self, parent: Option<usize>) -> Option<ShowMore> {
        let level = match parent {
            None => &self.top,
            Some(row) => {
                let entry = self.entry_at(row).ok()?;
                self.entries[entry].children.as_ref()?
            }
        };
        level.pager.affordance()
    }
}

fn make_row(
    index: RetainerIndex<'_>,
    depth: usize,
    retainer: &Retainer,
) -> RetainerRow {
    let store = index.store();
    let node = store.node_at(retainer.node);
    RetainerRow {
        depth,
        id: retainer.id,
        name: store.class_key(retainer.node).label(),
        edge_type: retainer.edge_type,
        edge_name: store.edge_at(retainer.edge_position).label_text(),
        self_size: node.self_size,
        retainer_count: index.retainer_count(retainer.node),
        expanded: false,
        node: retainer.node,
    }
}
