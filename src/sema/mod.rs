//! Name resolution over the module graph.
//!
//! Everything here is a read-side query on [`AstContext`](crate::ast::AstContext):
//! - import-graph traversal and link-library collection
//! - direct, qualified, and dynamic member lookup with result filtering
//! - per-fixity operator resolution across imports
//! - protocol conformance queries over the class hierarchy
//! - the memoized per-module lookup indices backing all of the above
//!
//! Queries never mutate the graph; the only writes are cache fills behind
//! locks, so a fully parsed context can be queried from many threads.

mod cache;
mod conformance;
mod diagnostics;
mod imports;
mod lookup;
mod operators;

pub use conformance::ConformanceResult;
pub use diagnostics::{DiagnosticCollector, DiagnosticSink, SemaDiagnostic};
pub use lookup::{LookupKind, LookupOptions, VisibilityReason, VisibleDeclConsumer};
pub use operators::{OperatorLookup, OperatorRedefinition};
