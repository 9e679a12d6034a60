//! The module loader capability.

use crate::ast::{DeclId, Fixity, ModuleId};
use crate::base::Name;

/// Backing store of a loaded module.
///
/// Implemented outside this crate by the serialized-module reader and the
/// foreign-interface bridge. Any loading I/O happens behind this trait;
/// from this core's point of view every call is a plain synchronous query.
/// Declarations a loader hands back must already be materialized in the
/// owning compilation context's arena.
pub trait ModuleLoader: Send + Sync {
    /// Look up an operator declaration of the given fixity by name, or
    /// `None` if the module declares no such operator.
    fn operator_decl(&self, module: ModuleId, name: Name, fixity: Fixity) -> Option<DeclId>;

    /// Enumerate the module's top-level declarations, in the loader's
    /// stable order.
    fn top_level_decls(&self, module: ModuleId) -> Vec<DeclId>;
}
