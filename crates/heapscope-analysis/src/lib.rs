//! Dominance and size analysis for heap graphs.
//!
//! This crate answers "what keeps this alive, and how much would freeing it
//! release?" for one [`GraphStore`].
//!
//! ## Algorithm
//!
//! 1. Breadth-first distances from the root over non-weak edges
//! 2. Dominator tree over retaining edges (petgraph's `simple_fast`), with
//!    unreachable regions attached under the root
//! 3. Retained sizes accumulated bottom-up over the dominator tree
//! 4. Per-class aggregates keyed by (name, type)
//!
//! Overall statistics only need shallow sizes and can also be computed on
//! their own, synchronously or on a tokio blocking thread.
//!
//! ## Usage
//!
//! ```no_run
//! use heapscope_analysis::analyze;
//! use heapscope_graph::GraphStore;
//!
//! let store = GraphStore::load_snapshot("heap.json".as_ref()).unwrap();
//! let analysis = analyze(&store).unwrap();
//! for (class, aggregate) in analysis.classes.iter() {
//!     println!("{class}: {}", aggregate.retained_size);
//! }
//! ```

mod deferred;
mod distance;
mod dominators;
mod sizes;
#[cfg(test)]
mod testutil;

use heapscope_graph::{GraphError, GraphStore, NodeOrdinal};
use tracing::debug_span;

#[doc(inline)]
pub use crate::deferred::spawn_statistics;
#[doc(inline)]
pub use crate::distance::{Distances, compute_distances};
#[doc(inline)]
pub use crate::dominators::{DominatorTree, OrphanKind, compute_dominators};
#[doc(inline)]
pub use crate::sizes::{
    ClassAggregate, ClassStatistics, RetainedSizes, class_statistics,
    overall_statistics,
};

/// Every per-snapshot analysis result.
#[derive(Debug, Clone)]
pub struct HeapAnalysis {
    /// Hop counts from the root.
    pub distances: Distances,
    /// Immediate-dominator tree.
    pub dominators: DominatorTree,
    /// Retained size per node.
    pub retained: RetainedSizes,
    /// Per-class aggregates.
    pub classes: ClassStatistics,
}

impl HeapAnalysis {
    /// Returns the retained size of a node.
    pub fn retained_size(&self, ordinal: NodeOrdinal) -> u64 {
        self.retained.get(ordinal)
    }

    /// Returns the distance of a node, or `None` when unreachable.
    pub fn distance(&self, ordinal: NodeOrdinal) -> Option<u32> {
        self.distances.get(ordinal)
    }
}

/// Runs distances, dominators, retained sizes, and class aggregation.
///
/// # Errors
///
/// Returns [`GraphError::is_missing_root`] if the store has no root. No
/// partial result is produced.
pub fn analyze(store: &GraphStore) -> Result<HeapAnalysis, GraphError> {
    let _span =
        debug_span!("analyze", node_count = store.node_count()).entered();

    let distances = compute_distances(store)?;
    let dominators = compute_dominators(store, &distances)?;
    let retained = RetainedSizes::compute(store, &dominators)?;
    let classes = class_statistics(store, &distances, &retained);

    Ok(HeapAnalysis {
        distances,
        dominators,
        retained,
        classes,
    })
}
