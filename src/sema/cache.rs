//! The memoized per-module lookup indices.
//!
//! Each source module carries two lazily populated slots: the locally
//! visible top-level declarations, and the class-member index that backs
//! dynamic lookup. Both are an optimization layer only. Correctness never
//! depends on a slot being populated; recomputation is deterministic and
//! idempotent, so concurrent populations can only duplicate work, never
//! disagree.

use std::sync::Arc;

use tracing::debug;

use crate::ast::{AstContext, DeclId, DeclIndex, DeclKind, ModuleId};
use crate::base::Name;

impl AstContext {
    /// Store a computed visible-declaration set for `module`, overwriting
    /// any prior value.
    ///
    /// # Panics
    /// Panics for non-source modules, which have no cache slot.
    pub fn cache_visible_decls(&self, module: ModuleId, decls: Vec<DeclId>) {
        let index = self.decl_index_of(decls);
        let source = self
            .module(module)
            .as_source()
            .expect("only source modules cache visible declarations");
        *source.cache.visible.write() = Some(Arc::new(index));
    }

    /// The stored visible-declaration set.
    ///
    /// # Panics
    /// Panics if nothing was ever cached for `module`, and for non-source
    /// modules.
    pub fn cached_visible_decls(&self, module: ModuleId) -> Arc<DeclIndex> {
        let source = self
            .module(module)
            .as_source()
            .expect("only source modules cache visible declarations");
        source
            .cache
            .visible
            .read()
            .clone()
            .expect("visible declarations were never cached")
    }

    /// Drop both memoized slots. The next lookup recomputes them.
    pub fn clear_lookup_cache(&self, module: ModuleId) {
        let source = self
            .module(module)
            .as_source()
            .expect("only source modules cache visible declarations");
        *source.cache.visible.write() = None;
        *source.cache.class_members.write() = None;
    }

    /// The visible-declaration set, computing and memoizing it on first
    /// use. Lookup paths go through here so presence of an explicit
    /// `cache_visible_decls` call is never required for correctness.
    pub(crate) fn visible_decls(&self, module: ModuleId) -> Arc<DeclIndex> {
        let source = self
            .module(module)
            .as_source()
            .expect("only source modules have a visible-declaration index");

        if let Some(cached) = source.cache.visible.read().clone() {
            return cached;
        }

        debug!(module = ?module, "computing visible declarations");
        let index = Arc::new(self.compute_visible_decls(module));

        let mut slot = source.cache.visible.write();
        // Another thread may have populated the slot meanwhile; keep the
        // first stored value so handed-out Arcs stay identical.
        if let Some(cached) = slot.clone() {
            return cached;
        }
        *slot = Some(index.clone());
        index
    }

    /// The class-member index, computing and memoizing it on first use.
    pub(crate) fn class_member_index(&self, module: ModuleId) -> Arc<DeclIndex> {
        let source = self
            .module(module)
            .as_source()
            .expect("only source modules have a class-member index");

        if let Some(cached) = source.cache.class_members.read().clone() {
            return cached;
        }

        debug!(module = ?module, "computing class-member index");
        let pairs = self.class_member_pairs(&self.top_level_decls(module));
        let index = Arc::new(DeclIndex::from_ordered(pairs));

        let mut slot = source.cache.class_members.write();
        if let Some(cached) = slot.clone() {
            return cached;
        }
        *slot = Some(index.clone());
        index
    }

    /// The fresh computation behind the visible-declaration slot: the
    /// module's top-level value declarations in declaration order.
    fn compute_visible_decls(&self, module: ModuleId) -> DeclIndex {
        let source = self
            .module(module)
            .as_source()
            .expect("only source modules have a visible-declaration index");
        let decls = source
            .decls()
            .iter()
            .copied()
            .filter(|&decl| self.decl(decl).is_value())
            .collect();
        self.decl_index_of(decls)
    }

    /// Members of class declarations and of extensions extending classes,
    /// in declaration order. Shared by the memoized source-module index and
    /// the on-demand loaded-module path.
    pub(crate) fn class_member_pairs(&self, top_level: &[DeclId]) -> Vec<(Name, DeclId)> {
        let mut pairs = Vec::new();
        for &decl in top_level {
            match self.decl(decl).kind() {
                DeclKind::Class(data) => {
                    self.push_value_members(data.members(), &mut pairs);
                }
                DeclKind::Extension(ext) if self.decl(ext.extended).is_class() => {
                    self.push_value_members(ext.members(), &mut pairs);
                }
                _ => {}
            }
        }
        pairs
    }

    fn push_value_members(&self, members: &[DeclId], pairs: &mut Vec<(Name, DeclId)>) {
        for &member in members {
            let d = self.decl(member);
            if d.is_value() {
                pairs.push((d.name, member));
            }
        }
    }

    fn decl_index_of(&self, decls: Vec<DeclId>) -> DeclIndex {
        DeclIndex::from_ordered(
            decls
                .into_iter()
                .map(|decl| (self.decl(decl).name, decl))
                .collect(),
        )
    }
}
