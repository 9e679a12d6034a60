//! Operator definition and lookup.
//!
//! Every source module keeps one table per fixity, so `prefix -` and
//! `postfix -` coexist while a second `infix <*>` in the same module is a
//! redefinition. Lookup consults the module's own table first; only when
//! that misses does it search the transitively visible imports, counting
//! distinct declarations so the caller can tell an absent operator from an
//! ambiguously multiply-defined one.

use smol_str::SmolStr;
use thiserror::Error;
use tracing::debug;

use crate::ast::{AstContext, DeclId, DeclKind, Fixity, ModuleId};
use crate::base::Name;

/// Outcome of an operator lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperatorLookup {
    /// No visible module defines the operator at this fixity.
    Missing,
    Found(DeclId),
    /// Distinct declarations from several visible modules, in visitation
    /// order.
    Ambiguous(Vec<DeclId>),
}

impl OperatorLookup {
    /// The unique declaration, if exactly one was found.
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            OperatorLookup::Found(decl) => Some(*decl),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, OperatorLookup::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, OperatorLookup::Ambiguous(_))
    }
}

/// A module defined the same operator twice at one fixity.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{fixity} operator `{name}` is already defined in this module")]
pub struct OperatorRedefinition {
    pub fixity: Fixity,
    pub name: SmolStr,
    /// The declaration already occupying the table slot.
    pub existing: DeclId,
}

impl AstContext {
    /// Enter an operator declaration into its module's fixity table.
    ///
    /// # Panics
    /// Panics if `decl` is not an operator declaration, belongs to a
    /// different module, or `module` is not a source module.
    pub fn define_operator(
        &mut self,
        module: ModuleId,
        decl: DeclId,
    ) -> Result<(), OperatorRedefinition> {
        let d = self.decl(decl);
        let fixity = match d.kind() {
            DeclKind::Operator(fixity) => *fixity,
            _ => panic!("only operator declarations enter operator tables"),
        };
        assert!(d.module == module, "operator declared in a different module");
        let name = d.name;
        let spelling = self.interner().get(name);

        let table = self
            .module_mut(module)
            .as_source_mut()
            .expect("only source modules define operators")
            .operator_table_mut(fixity);
        if let Some(&existing) = table.get(&name) {
            return Err(OperatorRedefinition {
                fixity,
                name: spelling,
                existing,
            });
        }
        table.insert(name, decl);
        Ok(())
    }

    /// Resolve an operator reference from `module`.
    ///
    /// The module's own table wins outright. Otherwise every transitively
    /// visible import is consulted and distinct matches are counted: none
    /// is [`OperatorLookup::Missing`], several is
    /// [`OperatorLookup::Ambiguous`]. The same declaration reached through
    /// more than one import path stays unambiguous.
    pub fn lookup_operator(&self, module: ModuleId, name: Name, fixity: Fixity) -> OperatorLookup {
        let m = self.module(module);
        if let Some(source) = m.as_source() {
            if let Some(&decl) = source.operator_table(fixity).get(&name) {
                return OperatorLookup::Found(decl);
            }
            let mut found: Vec<DeclId> = Vec::new();
            self.for_each_visible_module(module, None, |import| {
                if let Some(decl) = self.module_operator(import.module, name, fixity) {
                    if !found.contains(&decl) {
                        found.push(decl);
                    }
                }
            });
            match found.len() {
                0 => OperatorLookup::Missing,
                1 => OperatorLookup::Found(found[0]),
                _ => {
                    debug!(
                        operator = %self.interner().get(name),
                        %fixity,
                        candidates = found.len(),
                        "ambiguous operator reference"
                    );
                    OperatorLookup::Ambiguous(found)
                }
            }
        } else if let Some(loaded) = m.as_loaded() {
            match loaded.loader().operator_decl(module, name, fixity) {
                Some(decl) => OperatorLookup::Found(decl),
                None => OperatorLookup::Missing,
            }
        } else {
            OperatorLookup::Missing
        }
    }

    pub fn lookup_prefix_operator(&self, module: ModuleId, name: Name) -> OperatorLookup {
        self.lookup_operator(module, name, Fixity::Prefix)
    }

    pub fn lookup_infix_operator(&self, module: ModuleId, name: Name) -> OperatorLookup {
        self.lookup_operator(module, name, Fixity::Infix)
    }

    pub fn lookup_postfix_operator(&self, module: ModuleId, name: Name) -> OperatorLookup {
        self.lookup_operator(module, name, Fixity::Postfix)
    }

    /// One module's own answer for an operator, without import traversal.
    fn module_operator(&self, module: ModuleId, name: Name, fixity: Fixity) -> Option<DeclId> {
        let m = self.module(module);
        if let Some(source) = m.as_source() {
            source.operator_table(fixity).get(&name).copied()
        } else if let Some(loaded) = m.as_loaded() {
            loaded.loader().operator_decl(module, name, fixity)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use once_cell::sync::OnceCell;
    use rstest::rstest;

    use super::*;
    use crate::ast::{
        Access, AccessPath, ImportRecord, ImportedModule, LoadedOrigin, ModuleLoader, SourceKind,
        Stage,
    };
    use crate::base::SourceLoc;

    fn parsed_module(ctx: &mut AstContext, name: &str) -> ModuleId {
        let component = ctx.add_component();
        let module = ctx.add_source_module(ctx.intern(name), component, SourceKind::Library);
        ctx.advance_stage(module, Stage::Parsed);
        module
    }

    fn define(ctx: &mut AstContext, module: ModuleId, spelling: &str, fixity: Fixity) -> DeclId {
        let name = ctx.intern(spelling);
        let decl = ctx.alloc_decl(
            module,
            name,
            SourceLoc::from_raw(0),
            Access::Public,
            DeclKind::Operator(fixity),
        );
        ctx.define_operator(module, decl).unwrap();
        decl
    }

    /// A plain whole-module import: empty access path.
    fn import(target: ModuleId, exported: bool) -> ImportRecord {
        ImportRecord::new(ImportedModule::new(AccessPath::new(), target), exported)
    }

    #[rstest]
    #[case(Fixity::Prefix)]
    #[case(Fixity::Infix)]
    #[case(Fixity::Postfix)]
    fn test_define_then_lookup_finds_local(#[case] fixity: Fixity) {
        let mut ctx = AstContext::new();
        let module = parsed_module(&mut ctx, "A");
        let decl = define(&mut ctx, module, "<*>", fixity);

        let name = ctx.intern("<*>");
        assert_eq!(ctx.lookup_operator(module, name, fixity), OperatorLookup::Found(decl));
    }

    #[test]
    fn test_fixities_are_independent_tables() {
        let mut ctx = AstContext::new();
        let module = parsed_module(&mut ctx, "A");
        let prefix = define(&mut ctx, module, "-", Fixity::Prefix);
        let postfix = define(&mut ctx, module, "-", Fixity::Postfix);

        let name = ctx.intern("-");
        assert_eq!(ctx.lookup_prefix_operator(module, name).decl(), Some(prefix));
        assert_eq!(ctx.lookup_postfix_operator(module, name).decl(), Some(postfix));
        assert_eq!(ctx.lookup_infix_operator(module, name), OperatorLookup::Missing);
    }

    #[test]
    fn test_redefinition_reports_existing() {
        let mut ctx = AstContext::new();
        let module = parsed_module(&mut ctx, "A");
        let first = define(&mut ctx, module, "<*>", Fixity::Infix);

        let name = ctx.intern("<*>");
        let second = ctx.alloc_decl(
            module,
            name,
            SourceLoc::from_raw(40),
            Access::Public,
            DeclKind::Operator(Fixity::Infix),
        );
        let err = ctx.define_operator(module, second).unwrap_err();

        assert_eq!(err.existing, first);
        assert_eq!(err.fixity, Fixity::Infix);
        assert_eq!(err.to_string(), "infix operator `<*>` is already defined in this module");
        // The losing definition did not displace the table entry.
        assert_eq!(ctx.lookup_infix_operator(module, name).decl(), Some(first));
    }

    #[test]
    fn test_lookup_through_import() {
        let mut ctx = AstContext::new();
        let a = parsed_module(&mut ctx, "A");
        let b = parsed_module(&mut ctx, "B");
        let decl = define(&mut ctx, a, "<*>", Fixity::Infix);
        ctx.set_imports(b, vec![import(a, false)]);

        let name = ctx.intern("<*>");
        assert_eq!(ctx.lookup_infix_operator(b, name), OperatorLookup::Found(decl));
    }

    #[test]
    fn test_local_definition_shadows_import() {
        let mut ctx = AstContext::new();
        let a = parsed_module(&mut ctx, "A");
        let b = parsed_module(&mut ctx, "B");
        define(&mut ctx, a, "<*>", Fixity::Infix);
        let local = define(&mut ctx, b, "<*>", Fixity::Infix);
        ctx.set_imports(b, vec![import(a, false)]);

        let name = ctx.intern("<*>");
        assert_eq!(ctx.lookup_infix_operator(b, name), OperatorLookup::Found(local));
    }

    #[test]
    fn test_ambiguous_across_imports() {
        let mut ctx = AstContext::new();
        let a1 = parsed_module(&mut ctx, "A1");
        let a2 = parsed_module(&mut ctx, "A2");
        let b = parsed_module(&mut ctx, "B");
        let d1 = define(&mut ctx, a1, "<*>", Fixity::Infix);
        let d2 = define(&mut ctx, a2, "<*>", Fixity::Infix);
        ctx.set_imports(b, vec![import(a1, false), import(a2, false)]);

        let name = ctx.intern("<*>");
        let result = ctx.lookup_infix_operator(b, name);
        assert!(result.is_ambiguous());
        assert_eq!(result, OperatorLookup::Ambiguous(vec![d1, d2]));
    }

    #[test]
    fn test_same_decl_through_two_import_paths() {
        let mut ctx = AstContext::new();
        let a = parsed_module(&mut ctx, "A");
        let b = parsed_module(&mut ctx, "B");
        let decl = define(&mut ctx, a, "<*>", Fixity::Infix);

        // A whole-module import and a scoped one reach the same table.
        let scoped = ImportedModule::new(
            AccessPath::single(ctx.intern("Vector"), SourceLoc::from_raw(20)),
            a,
        );
        ctx.set_imports(
            b,
            vec![import(a, false), ImportRecord::new(scoped, false)],
        );

        let name = ctx.intern("<*>");
        assert_eq!(ctx.lookup_infix_operator(b, name), OperatorLookup::Found(decl));
    }

    #[test]
    fn test_reexport_makes_operator_visible() {
        let mut ctx = AstContext::new();
        let a = parsed_module(&mut ctx, "A");
        let b = parsed_module(&mut ctx, "B");
        let c = parsed_module(&mut ctx, "C");
        let decl = define(&mut ctx, a, "<*>", Fixity::Infix);
        ctx.set_imports(b, vec![import(a, true)]);
        ctx.set_imports(c, vec![import(b, false)]);

        let name = ctx.intern("<*>");
        assert_eq!(ctx.lookup_infix_operator(c, name), OperatorLookup::Found(decl));
    }

    #[test]
    fn test_private_import_blocks_transitive_operator() {
        let mut ctx = AstContext::new();
        let a = parsed_module(&mut ctx, "A");
        let b = parsed_module(&mut ctx, "B");
        let c = parsed_module(&mut ctx, "C");
        define(&mut ctx, a, "<*>", Fixity::Infix);
        ctx.set_imports(b, vec![import(a, false)]);
        ctx.set_imports(c, vec![import(b, false)]);

        let name = ctx.intern("<*>");
        assert_eq!(ctx.lookup_infix_operator(c, name), OperatorLookup::Missing);
    }

    struct SingleOperator {
        name: Name,
        fixity: Fixity,
        decl: OnceCell<DeclId>,
    }

    impl ModuleLoader for SingleOperator {
        fn operator_decl(&self, _module: ModuleId, name: Name, fixity: Fixity) -> Option<DeclId> {
            (self.name == name && self.fixity == fixity).then(|| *self.decl.get().unwrap())
        }

        fn top_level_decls(&self, _module: ModuleId) -> Vec<DeclId> {
            Vec::new()
        }
    }

    #[test]
    fn test_loaded_module_answers_through_loader() {
        let mut ctx = AstContext::new();
        let component = ctx.add_component();
        let name = ctx.intern("<*>");
        let loader = Arc::new(SingleOperator {
            name,
            fixity: Fixity::Postfix,
            decl: OnceCell::new(),
        });
        let loaded = ctx.add_loaded_module(
            ctx.intern("vecmath"),
            "vecmath".into(),
            LoadedOrigin::Serialized,
            component,
            loader.clone(),
        );
        let decl = ctx.alloc_decl(
            loaded,
            name,
            SourceLoc::INVALID,
            Access::Public,
            DeclKind::Operator(Fixity::Postfix),
        );
        loader.decl.set(decl).unwrap();

        assert_eq!(ctx.lookup_postfix_operator(loaded, name).decl(), Some(decl));
        assert_eq!(ctx.lookup_prefix_operator(loaded, name), OperatorLookup::Missing);

        // A source module importing the loaded one sees the same answer.
        let user = parsed_module(&mut ctx, "app");
        ctx.set_imports(user, vec![import(loaded, false)]);
        assert_eq!(ctx.lookup_postfix_operator(user, name).decl(), Some(decl));
    }

    #[test]
    fn test_missing_everywhere() {
        let mut ctx = AstContext::new();
        let module = parsed_module(&mut ctx, "A");
        let name = ctx.intern("<!>");

        assert_eq!(ctx.lookup_infix_operator(module, name), OperatorLookup::Missing);
        assert_eq!(
            ctx.lookup_infix_operator(ctx.builtin_module(), name),
            OperatorLookup::Missing
        );
    }
}
