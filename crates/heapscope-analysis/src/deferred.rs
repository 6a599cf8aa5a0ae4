//! Statistics computed off the caller's thread.

use std::sync::Arc;

use heapscope_graph::GraphStore;
use heapscope_schemas::Statistics;
use tokio::task::JoinHandle;

use crate::sizes::overall_statistics;

/// Computes [`overall_statistics`] on tokio's blocking pool.
///
/// The caller awaits the handle when it needs the figures, typically after
/// the summary view is already on screen.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn_statistics(store: Arc<GraphStore>) -> JoinHandle<Statistics> {
    tokio::task::spawn_blocking(move || overall_statistics(&store))
}
