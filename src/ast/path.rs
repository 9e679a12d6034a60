//! Access paths for imports and scoped lookups.
//!
//! An access path is the dotted identifier sequence written after `import`
//! (for example `import vela.math.Vector` carries the path `math.Vector`).
//! Each element remembers where it was written, but path equality is defined
//! over the identifier sequence only: the same path spelled at two different
//! locations must compare equal, or import-graph deduplication would visit
//! the same module once per spelling.

use std::hash::{Hash, Hasher};

use crate::ast::ModuleId;
use crate::base::{Name, SourceLoc};

/// One element of an access path: an identifier and where it was written.
#[derive(Copy, Clone, Debug)]
pub struct PathElem {
    pub name: Name,
    pub loc: SourceLoc,
}

impl PathElem {
    #[inline]
    pub const fn new(name: Name, loc: SourceLoc) -> Self {
        Self { name, loc }
    }
}

/// An ordered, position-carrying sequence of identifiers.
///
/// Equality and hashing ignore the source locations.
#[derive(Clone, Debug, Default)]
pub struct AccessPath {
    elems: Vec<PathElem>,
}

impl AccessPath {
    /// The empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-identifier path.
    pub fn single(name: Name, loc: SourceLoc) -> Self {
        Self {
            elems: vec![PathElem::new(name, loc)],
        }
    }

    /// Build a path from its elements in order.
    pub fn from_elems(elems: Vec<PathElem>) -> Self {
        Self { elems }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn first(&self) -> Option<&PathElem> {
        self.elems.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathElem> {
        self.elems.iter()
    }

    /// Whether two paths spell the same identifier sequence.
    ///
    /// Source locations are excluded; this is the equality used for
    /// import-record deduplication.
    pub fn same_path(&self, other: &AccessPath) -> bool {
        self.elems.len() == other.elems.len()
            && self
                .elems
                .iter()
                .zip(other.elems.iter())
                .all(|(a, b)| a.name == b.name)
    }
}

impl PartialEq for AccessPath {
    fn eq(&self, other: &Self) -> bool {
        self.same_path(other)
    }
}

impl Eq for AccessPath {}

impl Hash for AccessPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.elems.len().hash(state);
        for elem in &self.elems {
            elem.name.hash(state);
        }
    }
}

impl<'a> IntoIterator for &'a AccessPath {
    type Item = &'a PathElem;
    type IntoIter = std::slice::Iter<'a, PathElem>;

    fn into_iter(self) -> Self::IntoIter {
        self.elems.iter()
    }
}

/// A module made visible through some import, together with the access path
/// the import was written with.
///
/// Two values are equal iff they reference the same module and their paths
/// spell the same identifier sequence. Hashing covers the path length and
/// the module identity only; full path content is not needed for a correct
/// hash, just for the equality check itself.
#[derive(Clone, Debug)]
pub struct ImportedModule {
    pub access_path: AccessPath,
    pub module: ModuleId,
}

impl ImportedModule {
    pub fn new(access_path: AccessPath, module: ModuleId) -> Self {
        Self {
            access_path,
            module,
        }
    }
}

impl PartialEq for ImportedModule {
    fn eq(&self, other: &Self) -> bool {
        self.module == other.module && self.access_path.same_path(&other.access_path)
    }
}

impl Eq for ImportedModule {}

impl Hash for ImportedModule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.access_path.len().hash(state);
        self.module.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Interner;
    use rustc_hash::FxHashSet;

    fn loc(offset: u32) -> SourceLoc {
        SourceLoc::from_raw(offset)
    }

    #[test]
    fn test_path_equality_ignores_position() {
        let interner = Interner::new();
        let foo = interner.intern("Foo");

        let a = AccessPath::single(foo, loc(10));
        let b = AccessPath::single(foo, loc(99));

        assert_eq!(a, b);
    }

    #[test]
    fn test_path_inequality() {
        let interner = Interner::new();
        let foo = interner.intern("Foo");
        let bar = interner.intern("Bar");

        let a = AccessPath::single(foo, loc(0));
        let b = AccessPath::single(bar, loc(0));
        let ab = AccessPath::from_elems(vec![
            PathElem::new(foo, loc(0)),
            PathElem::new(bar, loc(4)),
        ]);

        assert_ne!(a, b);
        assert_ne!(a, ab);
    }

    #[test]
    fn test_imported_module_dedup() {
        let interner = Interner::new();
        let math = interner.intern("math");
        let module = ModuleId::new(3);

        let mut set = FxHashSet::default();
        set.insert(ImportedModule::new(AccessPath::single(math, loc(0)), module));
        set.insert(ImportedModule::new(AccessPath::single(math, loc(77)), module));

        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_imported_module_distinct_paths() {
        let interner = Interner::new();
        let math = interner.intern("math");
        let module = ModuleId::new(3);

        let mut set = FxHashSet::default();
        set.insert(ImportedModule::new(AccessPath::new(), module));
        set.insert(ImportedModule::new(AccessPath::single(math, loc(0)), module));

        assert_eq!(set.len(), 2);
    }
}
