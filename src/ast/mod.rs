//! The module graph and declaration arena.
//!
//! This module holds everything the rest of the compiler treats as "the
//! AST" at module granularity: the compilation context that owns all
//! storage, the three module variants, declarations with their nominal
//! structure, and the access paths import records are written with.
//!
//! ## Design Principles
//!
//! 1. **Arena ownership**: every cross-reference is a typed index into
//!    [`AstContext`]; nothing is freed individually
//! 2. **Staged reads**: artifacts are readable only once the stage that
//!    produces them has been reached
//! 3. **Write-once wiring**: import records, link libraries, superclasses,
//!    and override links are set exactly once by their owning phase

mod context;
mod decl;
mod ids;
mod loader;
mod module;
mod path;

pub use context::{AstContext, Component};
pub use decl::{
    Access, ConformanceEntry, ConformanceRecord, Decl, DeclKind, ExtensionData, Fixity,
    NominalData, Ty,
};
pub use ids::{ComponentId, ConformanceId, DeclId, ModuleId};
pub use loader::ModuleLoader;
pub use module::{
    DeclIndex, ImportRecord, LibraryKind, LinkLibrary, LoadedModule, LoadedOrigin, Module,
    ModuleKind, SourceKind, SourceModule, Stage,
};
pub use path::{AccessPath, ImportedModule, PathElem};
