//! Presentation rows for heap analyses.
//!
//! Turns analysis results into the rows a heap-profiler front end shows:
//! the per-class summary, the instances and references behind each class,
//! the class-level comparison of two snapshots, and the retainer tree of
//! one object. Every view sorts by named columns under one contract
//! (descending is exactly the reverse of ascending) and reveals long child
//! lists a chunk at a time.
//!
//! ## Usage
//!
//! ```no_run
//! use heapscope_analysis::analyze;
//! use heapscope_graph::GraphStore;
//! use heapscope_view::{
//!     AnalyzedSnapshot, ViewConfig, class_instances, summary_rows,
//! };
//!
//! let store = GraphStore::load_snapshot("heap.json".as_ref()).unwrap();
//! let analysis = analyze(&store).unwrap();
//! let rows = summary_rows(&analysis.classes, "retainedSize", false).unwrap();
//!
//! let top = &rows[0];
//! let aggregate = analysis.classes.get(&top.class).unwrap();
//! let mut instances = class_instances(
//!     AnalyzedSnapshot::new(&store, &analysis),
//!     aggregate,
//!     "retainedSize",
//!     false,
//!     &ViewConfig::default(),
//! )
//! .unwrap();
//! instances.expand();
//! ```
//!
//! Why: the analysis crates answer questions about the graph; this crate
//! owns the decisions about order and how much of an answer to show.

mod columns;
mod comparison;
mod config;
mod error;
mod objects;
mod paging;
mod retainers;
mod summary;

#[doc(inline)]
pub use crate::columns::{
    Column, ComparisonColumn, ObjectColumn, SortType, SortValue, SortableRow,
    SummaryColumn, collate, compare_rows, sort_rows,
};
#[doc(inline)]
pub use crate::comparison::{
    ComparisonChildren, ComparisonRow, comparison_rows,
};
#[doc(inline)]
pub use crate::config::{ViewConfig, load_view_config};
#[doc(inline)]
pub use crate::error::ViewError;
#[doc(inline)]
pub use crate::objects::{
    AnalyzedSnapshot, EdgeRow, InstanceRow, edge_rows, instance_rows,
};
#[doc(inline)]
pub use crate::paging::{BucketPager, ChildPage, Pager, ShowMore};
#[doc(inline)]
pub use crate::retainers::{RetainerRow, RetainerTree};
#[doc(inline)]
pub use crate::summary::{SummaryRow, class_instances, summary_rows};
