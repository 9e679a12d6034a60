//! Transitive, re-export-aware traversal of the import graph.
//!
//! Visibility is asymmetric: a module sees all of its own imports, but
//! importing it only exposes the imports it re-exported. The traversal is
//! breadth-first over import records in declaration order, deduplicated by
//! [`ImportedModule`] equality, so a module reached through two path-equal
//! imports is visited once and visitation order is reproducible.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::ast::{AccessPath, AstContext, ImportedModule, LinkLibrary, ModuleId};

impl AstContext {
    /// Visit every module visible from `module` through its transitive
    /// imports.
    ///
    /// If `top_path` is given, `module` itself is visited first, paired
    /// with that path. The visitor returns whether traversal continues;
    /// returning `false` stops the walk before any further module.
    pub fn for_all_visible_modules<F>(
        &self,
        module: ModuleId,
        top_path: Option<AccessPath>,
        mut visitor: F,
    ) where
        F: FnMut(&ImportedModule) -> bool,
    {
        let mut visited: FxHashSet<ImportedModule> = FxHashSet::default();
        let mut queue: VecDeque<ImportedModule> = VecDeque::new();

        if let Some(path) = top_path {
            let this = ImportedModule::new(path, module);
            visited.insert(this.clone());
            if !visitor(&this) {
                return;
            }
        }

        // From the starting module every direct import is visible, even
        // private ones; re-export chains take over beyond them.
        let include_private = self.module(module).is_source();
        for record in self.module(module).imported_modules(include_private) {
            queue.push_back(record.import.clone());
        }

        while let Some(next) = queue.pop_front() {
            if !visited.insert(next.clone()) {
                continue;
            }
            trace!(module = ?next.module, "visiting imported module");
            if !visitor(&next) {
                return;
            }
            for record in self.module(next.module).imported_modules(false) {
                queue.push_back(record.import.clone());
            }
        }
    }

    /// [`Self::for_all_visible_modules`] without early termination.
    pub fn for_each_visible_module<F>(
        &self,
        module: ModuleId,
        top_path: Option<AccessPath>,
        mut f: F,
    ) where
        F: FnMut(&ImportedModule),
    {
        self.for_all_visible_modules(module, top_path, |import| {
            f(import);
            true
        });
    }

    /// Invoke `f` once per link-library requirement of `module` and its
    /// transitively visible imports. The same library may be reported more
    /// than once if several modules require it.
    pub fn collect_link_libraries<F>(&self, module: ModuleId, mut f: F)
    where
        F: FnMut(&LinkLibrary),
    {
        self.for_each_visible_module(module, Some(AccessPath::new()), |import| {
            for library in self.module(import.module).link_libraries() {
                f(library);
            }
        });
    }
}
