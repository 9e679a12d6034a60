//! Module entities and their per-variant storage.
//!
//! A [`Module`] is one unit of modularity: a parsed source module, the
//! compiler-builtin module, or an externally loaded one. The three variants
//! share a name, an owning component, and a well-formedness [`Stage`];
//! everything else is variant-specific:
//! - source modules own their declarations, operator tables, import records,
//!   link libraries, and the memoized lookup indices;
//! - the builtin module owns nothing here and is always fully formed;
//! - loaded modules hold a loader handle and answer queries through it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::ast::{ComponentId, DeclId, Fixity, ImportedModule, ModuleLoader};
use crate::base::{BufferId, Name};

// ============================================================================
// Stages
// ============================================================================

/// Well-formedness stage of a module, in compilation order.
///
/// Stages only ever advance, one step at a time. Reads that depend on a
/// later stage's output assert the stage they need.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Stage {
    /// Declarations are still being appended.
    Parsing,
    /// The declaration list is frozen.
    Parsed,
    /// Imports are resolved and operator tables are authoritative.
    NameBound,
    /// Conformance records are final.
    TypeChecked,
}

impl Stage {
    /// The only stage this one may advance to.
    pub(crate) fn successor(self) -> Option<Stage> {
        match self {
            Stage::Parsing => Some(Stage::Parsed),
            Stage::Parsed => Some(Stage::NameBound),
            Stage::NameBound => Some(Stage::TypeChecked),
            Stage::TypeChecked => None,
        }
    }
}

/// What a source module is compiled as.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SourceKind {
    /// An ordinary library source module.
    Library,
    /// The module holding the program entry point.
    Main,
    /// A read-eval-print session module.
    Interactive,
    /// Lowered intermediate input; exempt from the parse-order staging
    /// checks since it arrives with imports already known.
    Lowered,
}

/// Where a loaded module came from. Recorded for debugging only; no
/// resolution behavior branches on it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LoadedOrigin {
    /// Deserialized from a compiled module file.
    Serialized,
    /// Bridged from a foreign-language interface.
    Foreign,
}

/// Fieldless variant tag of a module.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ModuleKind {
    Source,
    Builtin,
    Loaded,
}

// ============================================================================
// Import records and link libraries
// ============================================================================

/// One resolved import of a module, as recorded by name binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportRecord {
    pub import: ImportedModule,
    /// Whether the import is re-exported to importers of this module.
    pub exported: bool,
}

impl ImportRecord {
    pub fn new(import: ImportedModule, exported: bool) -> Self {
        Self { import, exported }
    }
}

/// Kind of library named by a link requirement.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LibraryKind {
    Dynamic,
    Static,
}

/// A library the final link must pull in because this module was imported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkLibrary {
    pub name: SmolStr,
    pub kind: LibraryKind,
}

impl LinkLibrary {
    pub fn new(name: impl Into<SmolStr>, kind: LibraryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ============================================================================
// Memoized lookup indices
// ============================================================================

/// An ordered set of declarations with a by-name index.
///
/// Built by the lookup layer and memoized per source module: one instance
/// for the locally visible top-level declarations, one for the class-member
/// index backing dynamic lookup. Order is declaration order.
#[derive(Debug, Default)]
pub struct DeclIndex {
    decls: Vec<DeclId>,
    by_name: FxHashMap<Name, Vec<DeclId>>,
}

impl DeclIndex {
    pub(crate) fn from_ordered(pairs: Vec<(Name, DeclId)>) -> Self {
        let mut decls = Vec::with_capacity(pairs.len());
        let mut by_name: FxHashMap<Name, Vec<DeclId>> = FxHashMap::default();
        for (name, decl) in pairs {
            decls.push(decl);
            by_name.entry(name).or_default().push(decl);
        }
        Self { decls, by_name }
    }

    /// All declarations, in declaration order.
    pub fn decls(&self) -> &[DeclId] {
        &self.decls
    }

    /// Declarations with the given name, in declaration order.
    pub fn named(&self, name: Name) -> &[DeclId] {
        self.by_name.get(&name).map(|v| &**v).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// The two memoized lookup slots of a source module.
///
/// Population is guarded per slot; redundant recomputation is tolerated
/// because recomputation is deterministic.
#[derive(Default)]
pub(crate) struct LookupCache {
    pub(crate) visible: RwLock<Option<Arc<DeclIndex>>>,
    pub(crate) class_members: RwLock<Option<Arc<DeclIndex>>>,
}

// ============================================================================
// Module variants
// ============================================================================

/// Storage owned by a source module.
pub struct SourceModule {
    kind: SourceKind,
    decls: Vec<DeclId>,
    prefix_operators: IndexMap<Name, DeclId>,
    infix_operators: IndexMap<Name, DeclId>,
    postfix_operators: IndexMap<Name, DeclId>,
    imports: OnceCell<Box<[ImportRecord]>>,
    link_libraries: OnceCell<Box<[LinkLibrary]>>,
    import_buffer: OnceCell<BufferId>,
    builtin_access: bool,
    pub(crate) cache: LookupCache,
}

impl SourceModule {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            decls: Vec::new(),
            prefix_operators: IndexMap::new(),
            infix_operators: IndexMap::new(),
            postfix_operators: IndexMap::new(),
            imports: OnceCell::new(),
            link_libraries: OnceCell::new(),
            import_buffer: OnceCell::new(),
            builtin_access: false,
            cache: LookupCache::default(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Top-level declarations in parse order.
    pub fn decls(&self) -> &[DeclId] {
        &self.decls
    }

    /// Whether this module may name the builtin module explicitly.
    pub fn has_builtin_access(&self) -> bool {
        self.builtin_access
    }

    /// The operator table for one fixity.
    pub fn operator_table(&self, fixity: Fixity) -> &IndexMap<Name, DeclId> {
        match fixity {
            Fixity::Prefix => &self.prefix_operators,
            Fixity::Infix => &self.infix_operators,
            Fixity::Postfix => &self.postfix_operators,
        }
    }

    pub(crate) fn operator_table_mut(&mut self, fixity: Fixity) -> &mut IndexMap<Name, DeclId> {
        match fixity {
            Fixity::Prefix => &mut self.prefix_operators,
            Fixity::Infix => &mut self.infix_operators,
            Fixity::Postfix => &mut self.postfix_operators,
        }
    }
}

/// Storage owned by a loaded module.
pub struct LoadedModule {
    debug_name: SmolStr,
    origin: LoadedOrigin,
    loader: Arc<dyn ModuleLoader>,
    imports: OnceCell<Box<[ImportRecord]>>,
}

impl LoadedModule {
    /// The name shown in debug output; distinct from the logical name for
    /// foreign-bridged modules whose on-disk name differs.
    pub fn debug_name(&self) -> &SmolStr {
        &self.debug_name
    }

    pub fn origin(&self) -> LoadedOrigin {
        self.origin
    }

    pub fn loader(&self) -> &Arc<dyn ModuleLoader> {
        &self.loader
    }
}

enum ModuleRepr {
    Source(SourceModule),
    Builtin,
    Loaded(LoadedModule),
}

// ============================================================================
// Module
// ============================================================================

/// One unit of modularity.
///
/// Created once by its owning phase (parser, loader, or context setup) and
/// alive until the whole compilation context is torn down.
pub struct Module {
    name: Name,
    component: Option<ComponentId>,
    stage: Stage,
    repr: ModuleRepr,
}

impl Module {
    pub(crate) fn new_source(name: Name, component: ComponentId, kind: SourceKind) -> Self {
        Self {
            name,
            component: Some(component),
            stage: Stage::Parsing,
            repr: ModuleRepr::Source(SourceModule::new(kind)),
        }
    }

    pub(crate) fn new_builtin(name: Name) -> Self {
        Self {
            name,
            component: None,
            stage: Stage::TypeChecked,
            repr: ModuleRepr::Builtin,
        }
    }

    pub(crate) fn new_loaded(
        name: Name,
        debug_name: SmolStr,
        origin: LoadedOrigin,
        component: ComponentId,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        Self {
            name,
            component: Some(component),
            stage: Stage::TypeChecked,
            repr: ModuleRepr::Loaded(LoadedModule {
                debug_name,
                origin,
                loader,
                imports: OnceCell::new(),
            }),
        }
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn kind(&self) -> ModuleKind {
        match self.repr {
            ModuleRepr::Source(_) => ModuleKind::Source,
            ModuleRepr::Builtin => ModuleKind::Builtin,
            ModuleRepr::Loaded(_) => ModuleKind::Loaded,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The component this module is compiled in.
    ///
    /// # Panics
    /// Panics for the builtin module, which belongs to no component.
    pub fn component(&self) -> ComponentId {
        self.component
            .expect("builtin module belongs to no component")
    }

    pub(crate) fn component_opt(&self) -> Option<ComponentId> {
        self.component
    }

    pub fn is_source(&self) -> bool {
        matches!(self.repr, ModuleRepr::Source(_))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.repr, ModuleRepr::Builtin)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.repr, ModuleRepr::Loaded(_))
    }

    pub fn as_source(&self) -> Option<&SourceModule> {
        match &self.repr {
            ModuleRepr::Source(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_source_mut(&mut self) -> Option<&mut SourceModule> {
        match &mut self.repr {
            ModuleRepr::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_loaded(&self) -> Option<&LoadedModule> {
        match &self.repr {
            ModuleRepr::Loaded(l) => Some(l),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Staging
    // ------------------------------------------------------------------

    /// Advance to the next stage.
    ///
    /// # Panics
    /// Panics for non-source modules (they are constructed fully formed),
    /// and for any transition that is not the exact successor.
    pub(crate) fn advance_stage(&mut self, to: Stage) {
        assert!(
            self.is_source(),
            "only source modules advance stages; {:?} modules are constructed at TypeChecked",
            self.kind()
        );
        match self.stage.successor() {
            Some(next) if next == to => self.stage = to,
            _ => panic!("invalid stage transition {:?} -> {:?}", self.stage, to),
        }
    }

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------

    /// The resolved import records.
    ///
    /// Empty until name binding installs them. The builtin module imports
    /// nothing.
    ///
    /// # Panics
    /// Panics for a source module that has not reached [`Stage::Parsed`],
    /// unless its kind is [`SourceKind::Lowered`].
    pub fn imports(&self) -> &[ImportRecord] {
        match &self.repr {
            ModuleRepr::Source(s) => {
                assert!(
                    self.stage >= Stage::Parsed || s.kind == SourceKind::Lowered,
                    "imports read before module is parsed"
                );
                s.imports.get().map(|b| &**b).unwrap_or(&[])
            }
            ModuleRepr::Builtin => &[],
            ModuleRepr::Loaded(l) => l.imports.get().map(|b| &**b).unwrap_or(&[]),
        }
    }

    /// Import records, optionally restricted to re-exported ones.
    pub fn imported_modules(&self, include_private: bool) -> impl Iterator<Item = &ImportRecord> {
        self.imports()
            .iter()
            .filter(move |record| include_private || record.exported)
    }

    /// Install the import records.
    ///
    /// # Panics
    /// Panics if imports were already set, or on the builtin module.
    pub(crate) fn set_imports(&mut self, records: Vec<ImportRecord>) {
        let slot = match &self.repr {
            ModuleRepr::Source(s) => &s.imports,
            ModuleRepr::Loaded(l) => &l.imports,
            ModuleRepr::Builtin => panic!("builtin module has no imports"),
        };
        if slot.set(records.into_boxed_slice()).is_err() {
            panic!("imports already set");
        }
    }

    // ------------------------------------------------------------------
    // Link libraries and import buffers
    // ------------------------------------------------------------------

    /// Libraries the final link must pull in for this module.
    pub fn link_libraries(&self) -> &[LinkLibrary] {
        match &self.repr {
            ModuleRepr::Source(s) => s.link_libraries.get().map(|b| &**b).unwrap_or(&[]),
            _ => &[],
        }
    }

    /// Install the link-library list.
    ///
    /// # Panics
    /// Panics if the list was already set, or on a non-source module.
    pub(crate) fn set_link_libraries(&mut self, libraries: Vec<LinkLibrary>) {
        let source = match &self.repr {
            ModuleRepr::Source(s) => s,
            _ => panic!("only source modules carry link libraries"),
        };
        if source.link_libraries.set(libraries.into_boxed_slice()).is_err() {
            panic!("link libraries already set");
        }
    }

    /// The buffer this module was synthesized from, for modules created by
    /// an import statement.
    pub fn import_buffer(&self) -> Option<BufferId> {
        match &self.repr {
            ModuleRepr::Source(s) => s.import_buffer.get().copied(),
            _ => None,
        }
    }

    /// Record the buffer this module was synthesized from.
    ///
    /// # Panics
    /// Panics if a buffer was already recorded, or on a non-source module.
    pub(crate) fn set_import_buffer(&mut self, buffer: BufferId) {
        let source = match &self.repr {
            ModuleRepr::Source(s) => s,
            _ => panic!("only source modules have an import buffer"),
        };
        if source.import_buffer.set(buffer).is_err() {
            panic!("import buffer already set");
        }
    }

    // ------------------------------------------------------------------
    // Source-only mutation
    // ------------------------------------------------------------------

    /// Append a top-level declaration.
    ///
    /// # Panics
    /// Panics unless this is a source module still at [`Stage::Parsing`].
    pub(crate) fn push_top_level(&mut self, decl: DeclId) {
        assert!(
            self.stage == Stage::Parsing,
            "top-level declarations are appended only while parsing"
        );
        match &mut self.repr {
            ModuleRepr::Source(s) => s.decls.push(decl),
            _ => panic!("only source modules own a declaration list"),
        }
    }

    pub(crate) fn set_source_kind(&mut self, kind: SourceKind) {
        match &mut self.repr {
            ModuleRepr::Source(s) => s.kind = kind,
            _ => panic!("only source modules have a source kind"),
        }
    }

    pub(crate) fn set_builtin_access(&mut self, allowed: bool) {
        match &mut self.repr {
            ModuleRepr::Source(s) => s.builtin_access = allowed,
            _ => panic!("only source modules track builtin access"),
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("stage", &self.stage)
            .finish()
    }
}
