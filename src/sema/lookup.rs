//! Name lookup: local value lookup, visible-declaration enumeration,
//! qualified lookup over a type's hierarchy, and the class-member index
//! behind dynamic lookup.
//!
//! The local operations never traverse imports; composing modules is the
//! caller's business (usually through the import walker). Qualified lookup
//! walks one type's hierarchy in a fixed order: the type and its extensions,
//! then ascending superclasses, then conformed protocols and their
//! transitive refinements, each scope contributing members in declaration
//! order. Filters run after collection, so the surviving results keep that
//! order.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::ast::{Access, AccessPath, AstContext, DeclId, DeclIndex, ModuleId, Ty};
use crate::base::Name;

/// Whether a reference was spelled with a qualifying context.
///
/// Module-local lookup answers both the same way; the kind is carried for
/// the loaders and logs that distinguish them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LookupKind {
    Unqualified,
    Qualified,
}

/// Independently toggleable qualified-lookup flags.
///
/// There is no `Default`; start from a preset, or from [`Self::NONE`]
/// (which enables nothing) and toggle flags from there.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LookupOptions {
    /// Walk the superclass chain after the type itself.
    pub visit_supertypes: bool,
    /// Also visit conformed protocols and their transitive refinements.
    pub include_protocol_members: bool,
    /// Drop results not accessible from the vantage module.
    pub remove_non_visible: bool,
    /// Drop results another result overrides.
    pub remove_overridden: bool,
    /// Consult the class-member index of every visible module instead of
    /// walking the type's own hierarchy.
    pub dynamic_lookup: bool,
}

impl LookupOptions {
    /// Every flag off. Lookup stops at the type's own scope and nothing
    /// is filtered.
    pub const NONE: Self = Self {
        visit_supertypes: false,
        include_protocol_members: false,
        remove_non_visible: false,
        remove_overridden: false,
        dynamic_lookup: false,
    };

    /// Default flags for qualified lookup on a type.
    pub const QUALIFIED_DEFAULT: Self = Self {
        visit_supertypes: true,
        include_protocol_members: false,
        remove_non_visible: true,
        remove_overridden: true,
        dynamic_lookup: false,
    };

    /// Default flags for unqualified lookup.
    pub const UNQUALIFIED_DEFAULT: Self = Self::QUALIFIED_DEFAULT;

    /// Constructor references: constructors are not inherited, so only the
    /// visibility filter applies.
    pub const CONSTRUCTOR: Self = Self {
        visit_supertypes: false,
        include_protocol_members: false,
        remove_non_visible: true,
        remove_overridden: false,
        dynamic_lookup: false,
    };

    pub fn with_protocol_members(mut self) -> Self {
        self.include_protocol_members = true;
        self
    }

    pub fn with_dynamic_lookup(mut self) -> Self {
        self.dynamic_lookup = true;
        self
    }
}

/// Why an enumerated declaration is visible.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VisibilityReason {
    /// Declared at the enumerated scope itself.
    Direct,
    /// Reachable only through dynamic (existential) dispatch.
    Dynamic,
}

/// Receives each declaration an enumeration finds, with why it is visible.
pub trait VisibleDeclConsumer {
    fn found_decl(&mut self, decl: DeclId, reason: VisibilityReason);
}

impl VisibleDeclConsumer for Vec<(DeclId, VisibilityReason)> {
    fn found_decl(&mut self, decl: DeclId, reason: VisibilityReason) {
        self.push((decl, reason));
    }
}

impl AstContext {
    /// Append the declarations named `name` declared directly in `module`.
    ///
    /// A non-empty access path restricts the lookup to the entity the
    /// scoped import names; imports are never traversed. Results keep
    /// declaration order and append to `results`.
    ///
    /// # Panics
    /// Panics if the access path has more than one component.
    pub fn lookup_value(
        &self,
        module: ModuleId,
        path: &AccessPath,
        name: Name,
        kind: LookupKind,
        results: &mut Vec<DeclId>,
    ) {
        assert!(
            path.len() <= 1,
            "scoped imports name at most one top-level declaration"
        );
        if let Some(first) = path.first() {
            if first.name != name {
                return;
            }
        }
        trace!(?module, ?kind, "local value lookup");

        let m = self.module(module);
        if m.is_source() {
            results.extend_from_slice(self.visible_decls(module).named(name));
        } else if let Some(loaded) = m.as_loaded() {
            for decl in loaded.loader().top_level_decls(module) {
                let d = self.decl(decl);
                if d.name == name && d.is_value() {
                    results.push(decl);
                }
            }
        }
    }

    /// Enumerate everything locally visible in `module`: top-level value
    /// declarations as [`VisibilityReason::Direct`], then the class-member
    /// index as [`VisibilityReason::Dynamic`].
    ///
    /// # Panics
    /// Panics if the access path has more than one component.
    pub fn lookup_visible_decls(
        &self,
        module: ModuleId,
        path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        assert!(
            path.len() <= 1,
            "scoped imports name at most one top-level declaration"
        );

        let m = self.module(module);
        if m.is_source() {
            let index = self.visible_decls(module);
            for &decl in index.decls() {
                if self.passes_path(path, self.decl(decl).name) {
                    consumer.found_decl(decl, VisibilityReason::Direct);
                }
            }
        } else if let Some(loaded) = m.as_loaded() {
            for decl in loaded.loader().top_level_decls(module) {
                if self.decl(decl).is_value() && self.passes_path(path, self.decl(decl).name) {
                    consumer.found_decl(decl, VisibilityReason::Direct);
                }
            }
        }

        self.lookup_class_members(module, path, consumer);
    }

    /// Enumerate every class member of `module`, the scope set behind
    /// dynamic lookup. A non-empty access path restricts enumeration to
    /// members of the nominal it names.
    ///
    /// # Panics
    /// Panics if the access path has more than one component.
    pub fn lookup_class_members(
        &self,
        module: ModuleId,
        path: &AccessPath,
        consumer: &mut dyn VisibleDeclConsumer,
    ) {
        assert!(
            path.len() <= 1,
            "scoped imports name at most one top-level declaration"
        );
        let index = self.class_members_of(module);
        for &decl in index.decls() {
            if self.class_member_passes_path(decl, path) {
                consumer.found_decl(decl, VisibilityReason::Dynamic);
            }
        }
    }

    /// Append the class members of `module` named `name`.
    ///
    /// # Panics
    /// Panics if the access path has more than one component.
    pub fn lookup_class_member(
        &self,
        module: ModuleId,
        path: &AccessPath,
        name: Name,
        results: &mut Vec<DeclId>,
    ) {
        assert!(
            path.len() <= 1,
            "scoped imports name at most one top-level declaration"
        );
        let index = self.class_members_of(module);
        for &decl in index.named(name) {
            if self.class_member_passes_path(decl, path) {
                results.push(decl);
            }
        }
    }

    /// Find the members of `ty` named `name`, as seen from `module`.
    ///
    /// Replaces the contents of `results` and returns whether anything was
    /// found. Scopes are visited in a fixed order (the type and its
    /// extensions, ascending superclasses, then protocols when requested),
    /// and the visibility/override filters run on the collected set, so
    /// repeated calls against the same state give identical ordered
    /// results.
    pub fn lookup_qualified(
        &self,
        module: ModuleId,
        ty: Ty,
        name: Name,
        options: LookupOptions,
        results: &mut Vec<DeclId>,
    ) -> bool {
        results.clear();

        if options.dynamic_lookup {
            self.lookup_dynamic(module, name, results);
        } else if let Some(start) = ty.nominal() {
            self.lookup_hierarchy(start, name, options, results);
        }
        // AnyObject without dynamic lookup has no hierarchy to walk.

        if options.remove_non_visible {
            results.retain(|&decl| self.decl_visible_from(decl, module));
        }
        if options.remove_overridden {
            self.remove_overridden(results);
        }
        trace!(?ty, found = results.len(), "qualified lookup");
        !results.is_empty()
    }

    // ------------------------------------------------------------------
    // Qualified lookup internals
    // ------------------------------------------------------------------

    /// Collect `name` over the static hierarchy of `start`.
    fn lookup_hierarchy(
        &self,
        start: DeclId,
        name: Name,
        options: LookupOptions,
        results: &mut Vec<DeclId>,
    ) {
        let mut visited: FxHashSet<DeclId> = FxHashSet::default();
        let mut scopes: Vec<DeclId> = Vec::new();

        // The type itself, then the superclass chain upward.
        let mut current = Some(start);
        while let Some(nominal) = current {
            if !visited.insert(nominal) {
                break;
            }
            scopes.push(nominal);
            self.collect_named_members(nominal, name, results);
            if !options.visit_supertypes {
                break;
            }
            current = self
                .decl(nominal)
                .nominal()
                .and_then(|data| data.superclass());
        }

        if !options.include_protocol_members {
            return;
        }

        // Protocols the visited scopes conform to, then transitive
        // refinements, breadth-first with the same visited set.
        let mut queue: VecDeque<DeclId> = VecDeque::new();
        for &scope in &scopes {
            if let Some(data) = self.decl(scope).nominal() {
                queue.extend(data.conformances().iter().map(|entry| entry.protocol));
            }
        }
        while let Some(protocol) = queue.pop_front() {
            if !visited.insert(protocol) {
                continue;
            }
            self.collect_named_members(protocol, name, results);
            if let Some(data) = self.decl(protocol).nominal() {
                queue.extend(data.conformances().iter().map(|entry| entry.protocol));
            }
        }
    }

    /// Members named `name` of one nominal and its bound extensions, in
    /// declaration order.
    fn collect_named_members(&self, nominal: DeclId, name: Name, results: &mut Vec<DeclId>) {
        let Some(data) = self.decl(nominal).nominal() else {
            return;
        };
        for &member in data.members() {
            let d = self.decl(member);
            if d.name == name && d.is_value() {
                results.push(member);
            }
        }
        for &extension in data.extensions() {
            let Some(ext) = self.decl(extension).extension() else {
                continue;
            };
            for &member in ext.members() {
                let d = self.decl(member);
                if d.name == name && d.is_value() {
                    results.push(member);
                }
            }
        }
    }

    /// Collect `name` from the class-member index of every module visible
    /// from `module`, the module itself first. Each import's access path
    /// restricts what its module contributes.
    fn lookup_dynamic(&self, module: ModuleId, name: Name, results: &mut Vec<DeclId>) {
        let mut known: FxHashSet<DeclId> = FxHashSet::default();
        let mut collected: Vec<DeclId> = Vec::new();
        self.for_each_visible_module(module, Some(AccessPath::new()), |import| {
            collected.clear();
            self.lookup_class_member(import.module, &import.access_path, name, &mut collected);
            for &decl in &collected {
                if known.insert(decl) {
                    results.push(decl);
                }
            }
        });
    }

    /// The class-member index of any module kind: memoized for source
    /// modules, built on the fly from the loader's enumeration for loaded
    /// ones, empty for the builtin module.
    fn class_members_of(&self, module: ModuleId) -> Arc<DeclIndex> {
        let m = self.module(module);
        if m.is_source() {
            self.class_member_index(module)
        } else if m.is_loaded() {
            let pairs = self.class_member_pairs(&self.top_level_decls(module));
            Arc::new(DeclIndex::from_ordered(pairs))
        } else {
            Arc::new(DeclIndex::default())
        }
    }

    fn passes_path(&self, path: &AccessPath, name: Name) -> bool {
        path.first().is_none_or(|elem| elem.name == name)
    }

    /// Whether a class member survives an access-path restriction: the
    /// path names the nominal the member ultimately belongs to.
    fn class_member_passes_path(&self, decl: DeclId, path: &AccessPath) -> bool {
        let Some(first) = path.first() else {
            return true;
        };
        self.enclosing_nominal(decl)
            .is_some_and(|nominal| self.decl(nominal).name == first.name)
    }

    /// Access-control check from a vantage module: `Public` everywhere,
    /// `Internal` within the declaring component, `Private` within the
    /// declaring module.
    fn decl_visible_from(&self, decl: DeclId, vantage: ModuleId) -> bool {
        let d = self.decl(decl);
        match d.access {
            Access::Public => true,
            Access::Internal => {
                let declaring = self.module(d.module).component_opt();
                declaring.is_some() && declaring == self.module(vantage).component_opt()
            }
            Access::Private => d.module == vantage,
        }
    }

    /// Drop every result some other result transitively overrides.
    fn remove_overridden(&self, results: &mut Vec<DeclId>) {
        let mut overridden: FxHashSet<DeclId> = FxHashSet::default();
        for &decl in results.iter() {
            let mut base = self.decl(decl).overrides();
            while let Some(target) = base {
                if !overridden.insert(target) {
                    break;
                }
                base = self.decl(target).overrides();
            }
        }
        if !overridden.is_empty() {
            results.retain(|decl| !overridden.contains(decl));
        }
    }
}
