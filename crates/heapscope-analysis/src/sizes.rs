//! Retained sizes and per-class aggregates.

use heapscope_graph::{ClassKey, GraphError, GraphStore, NodeOrdinal};
use heapscope_schemas::Statistics;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, debug_span};

use crate::distance::Distances;
use crate::dominators::DominatorTree;

/// Retained size of every node.
///
/// A node's retained size is its own size plus the retained sizes of its
/// dominator-tree children: the memory that would be freed if the node
/// became unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedSizes {
    values: Vec<u64>,
}

impl RetainedSizes {
    /// Accumulates retained sizes bottom-up over the dominator tree.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::is_invalid_argument`] if `tree` was built for a
    /// store of a different size.
    pub fn compute(
        store: &GraphStore,
        tree: &DominatorTree,
    ) -> Result<Self, GraphError> {
        let _span = debug_span!("compute_retained_sizes").entered();
        if tree.len() != store.node_count() {
            return Err(GraphError::invalid_argument(format!(
                "dominator tree covers {} nodes, store has {}",
                tree.len(),
                store.node_count()
            )));
        }

        // Preorder from the root; reversing it visits children before
        // parents, so one pass suffices.
        let mut order = Vec::with_capacity(store.node_count());
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(tree.children(node).iter().rev().copied());
        }

        let mut values: Vec<u64> =
            store.nodes().iter().map(|node| node.self_size).collect();
        for &node in order.iter().rev() {
            if let Some(parent) = tree.tree_parent(node) {
                values[parent.index()] =
                    values[parent.index()].saturating_add(values[node.index()]);
            }
        }

        debug!(
            root_retained = values[tree.root().index()],
            "Computed retained sizes"
        );
        Ok(Self { values })
    }

    /// Returns the retained size of a node.
    pub fn get(&self, ordinal: NodeOrdinal) -> u64 {
        self.values[ordinal.index()]
    }
}

/// Aggregate of every instance of one class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassAggregate {
    /// Number of instances.
    pub count: usize,
    /// Σ self size.
    pub shallow_size: u64,
    /// Σ instance retained size.
    ///
    /// Instances that dominate one another are counted once each, so this
    /// can exceed the memory freed by dropping every instance.
    pub retained_size: u64,
    /// Minimum instance distance; `None` if no instance is reachable.
    pub distance: Option<u32>,
    /// Instance ordinals in ingestion order.
    #[serde(skip)]
    pub instances: Vec<NodeOrdinal>,
}

/// Per-class aggregates in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassStatistics {
    classes: IndexMap<ClassKey, ClassAggregate>,
}

impl ClassStatistics {
    /// Returns the aggregate for a class.
    pub fn get(&self, key: &ClassKey) -> Option<&ClassAggregate> {
        self.classes.get(key)
    }

    /// Returns the aggregate for a class label (name, or `(type)`).
    ///
    /// When several classes share a label the first one seen wins.
    pub fn find_by_label(
        &self,
        label: &str,
    ) -> Option<(&ClassKey, &ClassAggregate)> {
        self.classes.iter().find(|(key, _)| key.label() == label)
    }

    /// Iterates over classes in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClassKey, &ClassAggregate)> {
        self.classes.iter()
    }

    /// Returns the number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if there are no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Groups every non-bookkeeping node by class.
pub fn class_statistics(
    store: &GraphStore,
    distances: &Distances,
    retained: &RetainedSizes,
) -> ClassStatistics {
    let _span = debug_span!("class_statistics").entered();
    let mut classes: IndexMap<ClassKey, ClassAggregate> = IndexMap::new();

    for ordinal in store.ordinals() {
        let key = store.class_key(ordinal);
        if key.is_bookkeeping() {
            continue;
        }
        let node = store.node_at(ordinal);
        let aggregate = classes.entry(key).or_default();
        aggregate.count += 1;
        aggregate.shallow_size =
            aggregate.shallow_size.saturating_add(node.self_size);
        aggregate.retained_size =
            aggregate.retained_size.saturating_add(retained.get(ordinal));
        aggregate.distance = match (aggregate.distance, distances.get(ordinal))
        {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        aggregate.instances.push(ordinal);
    }

    debug!(class_count = classes.len(), "Aggregated classes");
    ClassStatistics { classes }
}

/// Buckets every node's shallow size.
///
/// Independent of dominance, so it also works on stores without a root.
pub fn overall_statistics(store: &GraphStore) -> Statistics {
    let _span = debug_span!("overall_statistics").entered();
    let mut statistics = Statistics::default();
    for node in store.nodes() {
        statistics.record(node.node_type, node.self_size);
    }
    debug!(total = statistics.total, "Computed statistics");
    statistics
}
