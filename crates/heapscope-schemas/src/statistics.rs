//! Overall statistics record.
//!
//! Shallow sizes are reported per coarse bucket. Every node type belongs to
//! exactly one bucket, so the buckets partition the heap and sum to `total`.

use serde::{Deserialize, Serialize};

use crate::snapshot::NodeType;

/// Coarse reporting bucket for shallow sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsBucket {
    /// Embedder-owned objects.
    Native,
    /// Compiled code.
    Code,
    /// All string representations.
    Strings,
    /// Internal arrays.
    JsArrays,
    /// VM bookkeeping and hidden objects.
    System,
    /// Everything else on the managed heap.
    JsObjects,
}

impl StatisticsBucket {
    /// Returns the bucket a node type reports into.
    pub fn for_node_type(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Native => StatisticsBucket::Native,
            NodeType::Code => StatisticsBucket::Code,
            NodeType::String
            | NodeType::ConcatenatedString
            | NodeType::SlicedString => StatisticsBucket::Strings,
            NodeType::Array => StatisticsBucket::JsArrays,
            NodeType::Hidden | NodeType::Synthetic => StatisticsBucket::System,
            NodeType::Object
            | NodeType::Closure
            | NodeType::Regexp
            | NodeType::Number
            | NodeType::Symbol
            | NodeType::Bigint => StatisticsBucket::JsObjects,
        }
    }
}

/// Shallow-size totals for one snapshot.
///
/// `v8heap` is everything except native objects, i.e. the part of the heap
/// the managed runtime owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Sum of every node's shallow size.
    pub total: u64,
    /// `total - native`.
    pub v8heap: u64,
    /// Native bucket.
    pub native: u64,
    /// Code bucket.
    pub code: u64,
    /// Strings bucket.
    pub strings: u64,
    /// Internal arrays bucket.
    pub js_arrays: u64,
    /// System bucket.
    pub system: u64,
    /// Remaining managed objects.
    pub js_objects: u64,
}

impl Statistics {
    /// Adds `size` bytes to the bucket of `node_type`. Sums saturate at
    /// `u64::MAX`.
    pub fn record(&mut self, node_type: NodeType, size: u64) {
        self.total = self.total.saturating_add(size);
        let bucket = match StatisticsBucket::for_node_type(node_type) {
            StatisticsBucket::Native => &mut self.native,
            StatisticsBucket::Code => &mut self.code,
            StatisticsBucket::Strings => &mut self.strings,
            StatisticsBucket::JsArrays => &mut self.js_arrays,
            StatisticsBucket::System => &mut self.system,
            StatisticsBucket::JsObjects => &mut self.js_objects,
        };
        *bucket = bucket.saturating_add(size);
        self.v8heap = self.total.saturating_sub(self.native);
    }

    /// Returns the sum of all buckets.
    ///
    /// Equals `total` for any statistics built through [`Statistics::record`].
    pub fn bucket_sum(&self) -> u64 {
        [
            self.native,
            self.code,
            self.strings,
            self.js_arrays,
            self.system,
            self.js_objects,
        ]
        .into_iter()
        .fold(0, u64::saturating_add)
    }
}
