//! In-memory heap graph and retainer queries.
//!
//! This crate turns a [`SnapshotRecord`](heapscope_schemas::SnapshotRecord)
//! into an immutable [`GraphStore`]: nodes in dense ordinal order, edges in
//! compressed-sparse-row form, and a lazily built reverse index. Everything
//! downstream (dominance, sizes, diffs, views) reads the store and never
//! mutates it.
//!
//! ## Usage
//!
//! ```no_run
//! use heapscope_graph::{GraphStore, RetainerIndex};
//! use heapscope_schemas::NodeId;
//!
//! let store = GraphStore::load_snapshot("heap.json".as_ref()).unwrap();
//! let index = RetainerIndex::new(&store);
//! let retainers = index.retainers_of(NodeId(42)).unwrap();
//! println!("{} retainers", retainers.len());
//! ```
//!
//! Why: ingestion validates references once, so every later pass can index
//! by ordinal without re-checking ids.

mod class;
mod error;
mod retainers;
mod store;

#[doc(inline)]
pub use crate::class::ClassKey;
#[doc(inline)]
pub use crate::error::GraphError;
#[doc(inline)]
pub use crate::retainers::{
    ChainRow, ChainStop, DEFAULT_AUTO_EXPAND_DEPTH, Retainer, RetainerChain,
    RetainerIndex,
};
#[doc(inline)]
pub use crate::store::{Edge, GraphStore, Node, NodeOrdinal};
