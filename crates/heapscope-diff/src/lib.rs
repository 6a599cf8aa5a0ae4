//! Class-level comparison of two heap snapshots.
//!
//! Snapshots captured at different times assign ids independently, so the
//! comparison never matches nodes by id. Instead every node is placed in its
//! class (name and type): all instances of the target snapshot count as
//! added, all instances of the base snapshot as removed, and the per-class
//! deltas show growth or shrinkage.
//!
//! ## Usage
//!
//! ```no_run
//! use heapscope_diff::diff;
//! use heapscope_graph::GraphStore;
//!
//! let before = GraphStore::load_snapshot("before.json".as_ref()).unwrap();
//! let after = GraphStore::load_snapshot("after.json".as_ref()).unwrap();
//! for (class, change) in diff(&before, &after).iter() {
//!     println!("{class}: {:+}", change.count_delta);
//! }
//! ```

use heapscope_graph::{ClassKey, GraphStore, NodeOrdinal};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, debug_span};

/// Change of one class between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassDiff {
    /// Instances present in the target snapshot.
    pub added_count: usize,
    /// Instances present in the base snapshot.
    pub removed_count: usize,
    /// Σ self size of added instances.
    pub added_size: u64,
    /// Σ self size of removed instances.
    pub removed_size: u64,
    /// `added_count - removed_count`.
    pub count_delta: i64,
    /// `added_size - removed_size`.
    pub size_delta: i64,
    /// Added instances, as ordinals of the target store.
    #[serde(skip)]
    pub added: Vec<NodeOrdinal>,
    /// Removed instances, as ordinals of the base store.
    #[serde(skip)]
    pub removed: Vec<NodeOrdinal>,
}

impl ClassDiff {
    /// Returns true if nothing was added or removed.
    pub fn is_empty(&self) -> bool {
        self.added_count == 0 && self.removed_count == 0
    }
}

/// Per-class changes: base classes first, then classes new in the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    classes: IndexMap<ClassKey, ClassDiff>,
}

impl SnapshotDiff {
    /// Returns the change for a class.
    pub fn get(&self, key: &ClassKey) -> Option<&ClassDiff> {
        self.classes.get(key)
    }

    /// Returns the change for a class label (name, or `(type)`).
    pub fn find_by_label(
        &self,
        label: &str,
    ) -> Option<(&ClassKey, &ClassDiff)> {
        self.classes.iter().find(|(key, _)| key.label() == label)
    }

    /// Iterates over classes in diff order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClassKey, &ClassDiff)> {
        self.classes.iter()
    }

    /// Returns the number of classes present on either side.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if neither snapshot has any classified node.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Instances and their total self size, per class.
type ClassIndex = IndexMap<ClassKey, (Vec<NodeOrdinal>, u64)>;

fn index_classes(store: &GraphStore) -> ClassIndex {
    let mut index = ClassIndex::new();
    for ordinal in store.ordinals() {
        let key = store.class_key(ordinal);
        if key.is_bookkeeping() {
            continue;
        }
        let (instances, size) = index.entry(key).or_default();
        instances.push(ordinal);
        *size = size.saturating_add(store.node_at(ordinal).self_size);
    }
    index
}

/// Signed `added - removed`, saturating at the `i64` bounds.
fn delta(added: u64, removed: u64) -> i64 {
    let wide = i128::from(added) - i128::from(removed);
    i64::try_from(wide).unwrap_or(if wide < 0 { i64::MIN } else { i64::MAX })
}

/// Compares `base` against `target` class by class.
///
/// Neither store is modified. A class that exists on one side only is
/// reported with zeros for the other side.
pub fn diff(base: &GraphStore, target: &GraphStore) -> SnapshotDiff {
    let _span = debug_span!(
        "diff",
        base_nodes = base.node_count(),
        target_nodes = target.node_count()
    )
    .entered();

    let (base_index, target_index) =
        rayon::join(|| index_classes(base), || index_classes(target));

    let mut classes: IndexMap<ClassKey, ClassDiff> = IndexMap::new();
    for (key, (removed, removed_size)) in base_index {
        let entry = classes.entry(key).or_default();
        entry.removed_count = removed.len();
        entry.removed_size = removed_size;
        entry.removed = removed;
    }
    for (key, (added, added_size)) in target_index {
        let entry = classes.entry(key).or_default();
        entry.added_count = added.len();
        entry.added_size = added_size;
        entry.added = added;
    }
    for change in classes.values_mut() {
        change.count_delta =
            delta(change.added_count as u64, change.removed_count as u64);
        change.size_delta = delta(change.added_size, change.removed_size);
    }

    debug!(class_count = classes.len(), "Compared snapshots");
    SnapshotDiff { classes }
}
