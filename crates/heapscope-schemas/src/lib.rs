//! Schema definitions for heapscope input and output formats.
//!
//! This crate contains the data structures that describe a heap snapshot as
//! it arrives from the snapshot producer (nodes, edges, and the root set) and
//! the statistics record the analysis hands back to presentation code. These
//! types are serialized to JSON.
//!
//! The schemas are designed to be:
//! - **Typed**: node and edge kinds are closed enums, edge labels are a
//!   tagged union rather than untyped keys
//! - **Id-referential**: edges refer to nodes by their snapshot id, exactly
//!   as producers emit them
//! - **Shared**: used by the graph store, the analysis passes, the differ,
//!   and the CLI
//!
//! Why: keeping the wire types in one crate guarantees that ingestion,
//! analysis, and tooling agree on a single serialization contract.

mod builder;
mod snapshot;
mod statistics;
#[cfg(test)]
mod testutil;

#[doc(inline)]
pub use builder::*;
#[doc(inline)]
pub use snapshot::*;
#[doc(inline)]
pub use statistics::*;
