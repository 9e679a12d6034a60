//! Classified semantic findings and the sink they report through.
//!
//! The resolution core never formats or emits messages; it produces
//! classified findings and hands them to whatever [`DiagnosticSink`] the
//! driving phase supplies. Rendering, source ranges, and notes belong to
//! the diagnostic layer above.

use smol_str::SmolStr;
use thiserror::Error;

use crate::ast::{AstContext, DeclId, Fixity, ModuleId};
use crate::base::Name;
use crate::sema::operators::{OperatorLookup, OperatorRedefinition};

/// A user-facing finding produced by the resolution core.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SemaDiagnostic {
    /// Distinct operator declarations imported from several modules, with
    /// no unique resolution.
    #[error("ambiguous {fixity} operator `{name}`")]
    AmbiguousOperator {
        fixity: Fixity,
        name: SmolStr,
        /// The competing declarations, in import-visitation order.
        candidates: Vec<DeclId>,
    },
    /// A module defined the same operator twice at one fixity.
    #[error(transparent)]
    OperatorRedefinition(#[from] OperatorRedefinition),
}

/// Capability consumed by phases that surface findings as they resolve.
pub trait DiagnosticSink {
    fn report(&mut self, diag: SemaDiagnostic);
}

/// A sink that keeps every finding, for drivers and tests.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diags: Vec<SemaDiagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// All findings, in report order.
    pub fn diags(&self) -> &[SemaDiagnostic] {
        &self.diags
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Take all findings, leaving the collector empty.
    pub fn take(&mut self) -> Vec<SemaDiagnostic> {
        std::mem::take(&mut self.diags)
    }

    pub fn clear(&mut self) {
        self.diags.clear();
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diag: SemaDiagnostic) {
        self.diags.push(diag);
    }
}

impl AstContext {
    /// Resolve an operator reference to a unique declaration, surfacing
    /// the ambiguous case through `sink`.
    ///
    /// A missing operator is an ordinary `None`; how to diagnose an
    /// unresolved use site is the caller's decision.
    pub fn resolve_operator(
        &self,
        module: ModuleId,
        name: Name,
        fixity: Fixity,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<DeclId> {
        match self.lookup_operator(module, name, fixity) {
            OperatorLookup::Found(decl) => Some(decl),
            OperatorLookup::Missing => None,
            OperatorLookup::Ambiguous(candidates) => {
                sink.report(SemaDiagnostic::AmbiguousOperator {
                    fixity,
                    name: self.interner().get(name),
                    candidates,
                });
                None
            }
        }
    }
}
