//! Protocol conformance lookup.
//!
//! A nominal type conforms to a protocol if any type in its inheritance
//! closure declares the conformance: the type itself, a superclass, or a
//! protocol reached through declared conformances (protocol refinement is
//! recorded as a conformance entry on the refining protocol). The walk is
//! breadth-first with a visited set, so refinement cycles terminate.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::ast::{AstContext, ConformanceId, DeclId, Stage, Ty};

/// Outcome of a conformance query.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConformanceResult {
    /// No type in the inheritance closure declares the conformance.
    DoesNotConform,
    /// The conformance is declared and verified; the record is the
    /// evidence the type checker produced.
    Conforms(ConformanceId),
    /// The conformance is declared but not verified yet. Observable only
    /// while the declaring module has not finished type checking.
    Unchecked,
}

impl ConformanceResult {
    /// The checked record, if the outcome carries one.
    pub fn record(&self) -> Option<ConformanceId> {
        match self {
            ConformanceResult::Conforms(record) => Some(*record),
            _ => None,
        }
    }
}

impl AstContext {
    /// Whether `ty` conforms to `protocol`.
    ///
    /// # Panics
    /// Panics if `protocol` is not a protocol declaration, or if a declared
    /// conformance is still unchecked after its module finished type
    /// checking.
    pub fn lookup_conformance(&self, ty: Ty, protocol: DeclId) -> ConformanceResult {
        assert!(
            self.decl(protocol).is_protocol(),
            "conformance lookup target must be a protocol"
        );
        let Some(start) = ty.nominal() else {
            // AnyObject carries no conformances; its members are reached
            // through dynamic lookup instead.
            return ConformanceResult::DoesNotConform;
        };

        let mut visited: FxHashSet<DeclId> = FxHashSet::default();
        let mut queue: VecDeque<DeclId> = VecDeque::from([start]);

        while let Some(nominal) = queue.pop_front() {
            if !visited.insert(nominal) {
                continue;
            }
            let Some(data) = self.decl(nominal).nominal() else {
                continue;
            };
            for entry in data.conformances() {
                if entry.protocol == protocol {
                    return match entry.record() {
                        Some(record) => ConformanceResult::Conforms(record),
                        None => {
                            let stage = self.module(self.decl(nominal).module).stage();
                            assert!(
                                stage < Stage::TypeChecked,
                                "unchecked conformance observed after type checking"
                            );
                            ConformanceResult::Unchecked
                        }
                    };
                }
                queue.push_back(entry.protocol);
            }
            if let Some(superclass) = data.superclass() {
                queue.push_back(superclass);
            }
        }
        ConformanceResult::DoesNotConform
    }
}
