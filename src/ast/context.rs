//! The compilation context: sole owner of modules, declarations, and
//! conformance records.
//!
//! Every cross-reference in the module graph is an index into the arenas
//! held here. Nothing is freed individually; the context is torn down as a
//! whole when compilation ends. Construction entry points assert the
//! contracts the owning phases must keep (parse-time appends, write-once
//! import lists, monotonic stages); reads hand out plain borrows.

use std::sync::Arc;

use smol_str::SmolStr;

use crate::ast::{
    Access, ComponentId, ConformanceEntry, ConformanceId, ConformanceRecord, Decl, DeclId,
    DeclKind, ImportRecord, LinkLibrary, LoadedOrigin, Module, ModuleId, ModuleLoader, SourceKind,
    Stage,
};
use crate::base::{BufferId, Interner, Name, SourceLoc};

/// Name of the builtin module.
const BUILTIN_MODULE_NAME: &str = "Builtin";

/// Name of the standard library module.
const STDLIB_MODULE_NAME: &str = "vela";

/// A group of modules compiled together in one build invocation.
#[derive(Debug, Default)]
pub struct Component {
    modules: Vec<ModuleId>,
}

impl Component {
    /// Modules of this component, in creation order.
    pub fn modules(&self) -> &[ModuleId] {
        &self.modules
    }
}

/// The arena owning every module, declaration, and conformance record of
/// one compilation.
pub struct AstContext {
    interner: Interner,
    components: Vec<Component>,
    modules: Vec<Module>,
    decls: Vec<Decl>,
    conformances: Vec<ConformanceRecord>,
    builtin: ModuleId,
    stdlib_name: Name,
}

impl AstContext {
    /// Create a context with the builtin module already constructed.
    ///
    /// The builtin module belongs to no component and starts, like every
    /// non-source module, at [`Stage::TypeChecked`].
    pub fn new() -> Self {
        let interner = Interner::new();
        let builtin_name = interner.intern(BUILTIN_MODULE_NAME);
        let stdlib_name = interner.intern(STDLIB_MODULE_NAME);
        let modules = vec![Module::new_builtin(builtin_name)];
        Self {
            interner,
            components: Vec::new(),
            modules,
            decls: Vec::new(),
            conformances: Vec::new(),
            builtin: ModuleId::new(0),
            stdlib_name,
        }
    }

    // ------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Intern an identifier, operator spelling, or module name.
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    // ------------------------------------------------------------------
    // Components and modules
    // ------------------------------------------------------------------

    pub fn add_component(&mut self) -> ComponentId {
        let id = ComponentId::new(self.components.len() as u32);
        self.components.push(Component::default());
        id
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.index() as usize]
    }

    /// The process-wide builtin module.
    pub fn builtin_module(&self) -> ModuleId {
        self.builtin
    }

    /// Create a source module at [`Stage::Parsing`] and register it with
    /// its component.
    pub fn add_source_module(
        &mut self,
        name: Name,
        component: ComponentId,
        kind: SourceKind,
    ) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        self.modules.push(Module::new_source(name, component, kind));
        self.components[component.index() as usize].modules.push(id);
        id
    }

    /// Create a loaded module, fully formed at [`Stage::TypeChecked`],
    /// answering declaration queries through `loader`.
    pub fn add_loaded_module(
        &mut self,
        name: Name,
        debug_name: SmolStr,
        origin: LoadedOrigin,
        component: ComponentId,
        loader: Arc<dyn ModuleLoader>,
    ) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        self.modules
            .push(Module::new_loaded(name, debug_name, origin, component, loader));
        self.components[component.index() as usize].modules.push(id);
        id
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index() as usize]
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index() as usize]
    }

    /// The module's name as a string, for logs and tests.
    pub fn module_name(&self, id: ModuleId) -> SmolStr {
        self.interner.get(self.module(id).name())
    }

    /// The component a module is compiled in.
    ///
    /// # Panics
    /// Panics for the builtin module, which belongs to no component.
    pub fn component_of(&self, module: ModuleId) -> ComponentId {
        self.module(module).component()
    }

    /// Whether this is the standard library module.
    pub fn is_stdlib_module(&self, module: ModuleId) -> bool {
        self.module(module).name() == self.stdlib_name && !self.module(module).is_builtin()
    }

    // ------------------------------------------------------------------
    // Staging and per-module settings
    // ------------------------------------------------------------------

    /// Advance a source module to the next stage.
    ///
    /// # Panics
    /// Panics on non-source modules and on any transition that is not the
    /// exact successor of the current stage.
    pub fn advance_stage(&mut self, module: ModuleId, to: Stage) {
        self.module_mut(module).advance_stage(to);
    }

    /// Install a source or loaded module's import records. Write-once.
    pub fn set_imports(&mut self, module: ModuleId, records: Vec<ImportRecord>) {
        self.module_mut(module).set_imports(records);
    }

    /// Install a source module's link-library list. Write-once.
    pub fn set_link_libraries(&mut self, module: ModuleId, libraries: Vec<LinkLibrary>) {
        self.module_mut(module).set_link_libraries(libraries);
    }

    /// Record the buffer a source module was synthesized from. Write-once.
    pub fn set_import_buffer(&mut self, module: ModuleId, buffer: BufferId) {
        self.module_mut(module).set_import_buffer(buffer);
    }

    /// Change a source module's kind tag.
    pub fn set_source_kind(&mut self, module: ModuleId, kind: SourceKind) {
        self.module_mut(module).set_source_kind(kind);
    }

    /// Record whether a source module may name the builtin module.
    pub fn set_builtin_access(&mut self, module: ModuleId, allowed: bool) {
        self.module_mut(module).set_builtin_access(allowed);
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Allocate a declaration owned by `module`.
    ///
    /// # Panics
    /// Panics for the builtin module, which owns no declarations here.
    pub fn alloc_decl(
        &mut self,
        module: ModuleId,
        name: Name,
        loc: SourceLoc,
        access: Access,
        kind: DeclKind,
    ) -> DeclId {
        assert!(
            !self.module(module).is_builtin(),
            "builtin module owns no declarations"
        );
        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(Decl {
            name,
            loc,
            module,
            access,
            parent: None,
            overrides: None,
            kind,
        });
        id
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index() as usize]
    }

    pub(crate) fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index() as usize]
    }

    /// Append a declaration to its module's top-level list.
    ///
    /// # Panics
    /// Panics if the declaration belongs to a different module, or if the
    /// module is not a source module at [`Stage::Parsing`].
    pub fn add_top_level_decl(&mut self, module: ModuleId, decl: DeclId) {
        assert!(
            self.decl(decl).module == module,
            "declaration belongs to a different module"
        );
        self.module_mut(module).push_top_level(decl);
    }

    /// Top-level declarations of any module kind: stored list for source
    /// modules, loader enumeration for loaded ones, empty for the builtin.
    pub fn top_level_decls(&self, module: ModuleId) -> Vec<DeclId> {
        let m = self.module(module);
        if let Some(source) = m.as_source() {
            source.decls().to_vec()
        } else if let Some(loaded) = m.as_loaded() {
            loaded.loader().top_level_decls(module)
        } else {
            Vec::new()
        }
    }

    /// Append a member to a nominal declaration.
    ///
    /// # Panics
    /// Panics if `nominal` has no nominal payload, if the member lives in a
    /// different module, or if a source module's parse stage is over.
    pub fn add_member(&mut self, nominal: DeclId, member: DeclId) {
        assert!(
            self.decl(member).module == self.decl(nominal).module,
            "member belongs to a different module than its nominal"
        );
        self.assert_appendable(self.decl(nominal).module);
        self.decl_mut(member).parent = Some(nominal);
        self.decl_mut(nominal)
            .nominal_mut()
            .expect("members can only be added to nominal declarations")
            .members
            .push(member);
    }

    /// Append a member to an extension declaration.
    pub fn add_extension_member(&mut self, extension: DeclId, member: DeclId) {
        assert!(
            self.decl(member).module == self.decl(extension).module,
            "member belongs to a different module than its extension"
        );
        self.assert_appendable(self.decl(extension).module);
        self.decl_mut(member).parent = Some(extension);
        self.decl_mut(extension)
            .extension_mut()
            .expect("extension members can only be added to extensions")
            .members
            .push(member);
    }

    fn assert_appendable(&self, module: ModuleId) {
        let m = self.module(module);
        if m.is_source() {
            assert!(
                m.stage() == Stage::Parsing,
                "members are appended only while parsing"
            );
        }
    }

    /// Bind an extension to the nominal it extends. Called during name
    /// binding, once the extended name has been resolved.
    pub fn bind_extension(&mut self, extension: DeclId) {
        let extended = self
            .decl(extension)
            .extension()
            .expect("only extensions can be bound")
            .extended;
        self.decl_mut(extended)
            .nominal_mut()
            .expect("extensions must extend a nominal declaration")
            .extensions
            .push(extension);
    }

    /// Record a class's superclass. Write-once.
    pub fn set_superclass(&mut self, class: DeclId, superclass: DeclId) {
        assert!(self.decl(class).is_class(), "only classes have a superclass");
        assert!(
            self.decl(superclass).is_class(),
            "a superclass must be a class"
        );
        let data = self
            .decl_mut(class)
            .nominal_mut()
            .expect("classes carry nominal data");
        assert!(data.superclass.is_none(), "superclass already set");
        data.superclass = Some(superclass);
    }

    /// Record that `decl` overrides `base`. Write-once.
    pub fn set_overridden(&mut self, decl: DeclId, base: DeclId) {
        assert!(decl != base, "a declaration cannot override itself");
        let d = self.decl_mut(decl);
        assert!(d.overrides.is_none(), "override already recorded");
        d.overrides = Some(base);
    }

    /// The nominal a member ultimately belongs to, looking through the
    /// extension it was declared in.
    pub fn enclosing_nominal(&self, decl: DeclId) -> Option<DeclId> {
        let parent = self.decl(decl).parent()?;
        match self.decl(parent).kind() {
            DeclKind::Extension(ext) => Some(ext.extended),
            _ => Some(parent),
        }
    }

    // ------------------------------------------------------------------
    // Conformances
    // ------------------------------------------------------------------

    /// Record a declared conformance of `nominal` to `protocol`, initially
    /// unchecked.
    pub fn declare_conformance(&mut self, nominal: DeclId, protocol: DeclId) {
        assert!(
            self.decl(protocol).is_protocol(),
            "conformance target must be a protocol"
        );
        self.decl_mut(nominal)
            .nominal_mut()
            .expect("only nominal declarations conform to protocols")
            .conformances
            .push(ConformanceEntry::new(protocol));
    }

    /// Attach a checked conformance record to a previously declared
    /// conformance. Idempotent: re-checking returns the existing record.
    ///
    /// # Panics
    /// Panics if no conformance of `nominal` to `protocol` was declared.
    pub fn mark_conformance_checked(
        &mut self,
        nominal: DeclId,
        protocol: DeclId,
    ) -> ConformanceId {
        let existing = self
            .decl(nominal)
            .nominal()
            .and_then(|data| {
                data.conformances
                    .iter()
                    .find(|entry| entry.protocol == protocol)
            })
            .map(|entry| entry.record)
            .expect("conformance was never declared");
        if let Some(id) = existing {
            return id;
        }

        let id = ConformanceId::new(self.conformances.len() as u32);
        self.conformances.push(ConformanceRecord { nominal, protocol });
        let data = self
            .decl_mut(nominal)
            .nominal_mut()
            .expect("only nominal declarations conform to protocols");
        let entry = data
            .conformances
            .iter_mut()
            .find(|entry| entry.protocol == protocol)
            .expect("conformance was never declared");
        entry.record = Some(id);
        id
    }

    pub fn conformance(&self, id: ConformanceId) -> &ConformanceRecord {
        &self.conformances[id.index() as usize]
    }
}

impl Default for AstContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_module_is_preformed() {
        let ctx = AstContext::new();
        let builtin = ctx.builtin_module();

        assert!(ctx.module(builtin).is_builtin());
        assert_eq!(ctx.module(builtin).stage(), Stage::TypeChecked);
        assert_eq!(ctx.module_name(builtin).as_str(), "Builtin");
    }

    #[test]
    #[should_panic(expected = "belongs to no component")]
    fn test_builtin_component_is_fatal() {
        let ctx = AstContext::new();
        let _ = ctx.component_of(ctx.builtin_module());
    }

    #[test]
    fn test_source_module_registration() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let name = ctx.intern("app");
        let module = ctx.add_source_module(name, component, SourceKind::Main);

        assert_eq!(ctx.component(component).modules(), &[module]);
        assert_eq!(ctx.component_of(module), component);
        assert_eq!(ctx.module(module).stage(), Stage::Parsing);
    }

    #[test]
    fn test_stdlib_probe() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let stdlib = ctx.intern("vela");
        let app = ctx.intern("app");
        let m1 = ctx.add_source_module(stdlib, component, SourceKind::Library);
        let m2 = ctx.add_source_module(app, component, SourceKind::Library);

        assert!(ctx.is_stdlib_module(m1));
        assert!(!ctx.is_stdlib_module(m2));
        assert!(!ctx.is_stdlib_module(ctx.builtin_module()));
    }

    #[test]
    fn test_top_level_decls_preserve_order() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let module = ctx.add_source_module(ctx.intern("a"), component, SourceKind::Library);

        let first = ctx.alloc_decl(
            module,
            ctx.intern("x"),
            SourceLoc::from_raw(0),
            Access::Internal,
            DeclKind::Var,
        );
        let second = ctx.alloc_decl(
            module,
            ctx.intern("y"),
            SourceLoc::from_raw(8),
            Access::Internal,
            DeclKind::Func,
        );
        ctx.add_top_level_decl(module, first);
        ctx.add_top_level_decl(module, second);

        assert_eq!(ctx.top_level_decls(module), vec![first, second]);
    }

    #[test]
    #[should_panic(expected = "builtin module owns no declarations")]
    fn test_alloc_into_builtin_is_fatal() {
        let mut ctx = AstContext::new();
        let builtin = ctx.builtin_module();
        ctx.alloc_decl(
            builtin,
            ctx.intern("x"),
            SourceLoc::INVALID,
            Access::Public,
            DeclKind::Var,
        );
    }

    #[test]
    fn test_member_parent_links() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let module = ctx.add_source_module(ctx.intern("a"), component, SourceKind::Library);

        let class = ctx.alloc_decl(
            module,
            ctx.intern("C"),
            SourceLoc::from_raw(0),
            Access::Public,
            DeclKind::class(),
        );
        let method = ctx.alloc_decl(
            module,
            ctx.intern("f"),
            SourceLoc::from_raw(10),
            Access::Public,
            DeclKind::Func,
        );
        ctx.add_member(class, method);

        assert_eq!(ctx.decl(method).parent(), Some(class));
        assert_eq!(ctx.enclosing_nominal(method), Some(class));
        assert_eq!(ctx.decl(class).nominal().unwrap().members(), &[method]);
    }

    #[test]
    fn test_extension_member_resolves_to_extended_nominal() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let module = ctx.add_source_module(ctx.intern("a"), component, SourceKind::Library);

        let class = ctx.alloc_decl(
            module,
            ctx.intern("C"),
            SourceLoc::from_raw(0),
            Access::Public,
            DeclKind::class(),
        );
        let ext = ctx.alloc_decl(
            module,
            ctx.intern("C"),
            SourceLoc::from_raw(20),
            Access::Public,
            DeclKind::extension(class),
        );
        let method = ctx.alloc_decl(
            module,
            ctx.intern("g"),
            SourceLoc::from_raw(30),
            Access::Public,
            DeclKind::Func,
        );
        ctx.add_extension_member(ext, method);
        ctx.bind_extension(ext);

        assert_eq!(ctx.enclosing_nominal(method), Some(class));
        assert_eq!(ctx.decl(class).nominal().unwrap().extensions(), &[ext]);
    }

    #[test]
    fn test_conformance_checking_is_idempotent() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let module = ctx.add_source_module(ctx.intern("a"), component, SourceKind::Library);

        let proto = ctx.alloc_decl(
            module,
            ctx.intern("P"),
            SourceLoc::from_raw(0),
            Access::Public,
            DeclKind::protocol(),
        );
        let class = ctx.alloc_decl(
            module,
            ctx.intern("C"),
            SourceLoc::from_raw(10),
            Access::Public,
            DeclKind::class(),
        );
        ctx.declare_conformance(class, proto);

        let a = ctx.mark_conformance_checked(class, proto);
        let b = ctx.mark_conformance_checked(class, proto);

        assert_eq!(a, b);
        assert_eq!(ctx.conformance(a).nominal, class);
        assert_eq!(ctx.conformance(a).protocol, proto);
    }

    #[test]
    #[should_panic(expected = "conformance was never declared")]
    fn test_checking_undeclared_conformance_is_fatal() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let module = ctx.add_source_module(ctx.intern("a"), component, SourceKind::Library);

        let proto = ctx.alloc_decl(
            module,
            ctx.intern("P"),
            SourceLoc::from_raw(0),
            Access::Public,
            DeclKind::protocol(),
        );
        let class = ctx.alloc_decl(
            module,
            ctx.intern("C"),
            SourceLoc::from_raw(10),
            Access::Public,
            DeclKind::class(),
        );
        ctx.mark_conformance_checked(class, proto);
    }

    #[test]
    #[should_panic(expected = "superclass already set")]
    fn test_superclass_write_once() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let module = ctx.add_source_module(ctx.intern("a"), component, SourceKind::Library);

        let base = ctx.alloc_decl(
            module,
            ctx.intern("Base"),
            SourceLoc::from_raw(0),
            Access::Public,
            DeclKind::class(),
        );
        let derived = ctx.alloc_decl(
            module,
            ctx.intern("Derived"),
            SourceLoc::from_raw(10),
            Access::Public,
            DeclKind::class(),
        );
        ctx.set_superclass(derived, base);
        ctx.set_superclass(derived, base);
    }
}
