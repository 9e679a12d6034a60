//! # vela
//!
//! Core library for the Vela front-end: the module graph, declaration
//! arena, and the name-resolution queries the rest of the compiler is
//! built on.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! sema    → Name resolution: imports, qualified lookup, operators,
//!   ↓       conformances, lookup caches
//! ast     → Module graph + declaration arena (AstContext)
//!   ↓
//! base    → Primitives (BufferId, SourceLoc, Name interning)
//! ```

/// Foundation types: BufferId, SourceLoc, Name interning
pub mod base;

/// Module graph and declaration arena
pub mod ast;

/// Name resolution queries over the graph
pub mod sema;

// Re-export the types nearly every caller touches
pub use ast::{AccessPath, AstContext, DeclId, ImportedModule, Module, ModuleId, Stage};
pub use base::{Interner, Name, SourceLoc};
pub use sema::{LookupKind, LookupOptions};
