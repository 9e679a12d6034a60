//! Declarations owned by the compilation context.
//!
//! The parser allocates a [`Decl`] per top-level item and member; name
//! binding and type checking then wire up superclasses, extension bindings,
//! override links, and conformance entries. Lookup never mutates a
//! declaration.

use std::fmt;

use crate::ast::{ConformanceId, DeclId, ModuleId};
use crate::base::{Name, SourceLoc};

/// Access level of a declaration.
///
/// `Internal` is the default for source declarations: visible to every
/// module of the declaring component. `Private` restricts to the declaring
/// module, `Public` exports across components.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Access {
    Private,
    Internal,
    Public,
}

/// Whether an operator declaration is prefix, infix, or postfix.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Fixity {
    Prefix,
    Infix,
    Postfix,
}

impl fmt::Display for Fixity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fixity::Prefix => write!(f, "prefix"),
            Fixity::Infix => write!(f, "infix"),
            Fixity::Postfix => write!(f, "postfix"),
        }
    }
}

/// One declared conformance of a nominal type to a protocol.
///
/// The entry is created when the conformance is written in source; the
/// record is attached later, once the type checker has verified it. An
/// entry without a record is the "declared but unchecked" state.
#[derive(Copy, Clone, Debug)]
pub struct ConformanceEntry {
    pub protocol: DeclId,
    pub(crate) record: Option<ConformanceId>,
}

impl ConformanceEntry {
    pub(crate) fn new(protocol: DeclId) -> Self {
        Self {
            protocol,
            record: None,
        }
    }

    /// The checked conformance record, if verification has run.
    pub fn record(&self) -> Option<ConformanceId> {
        self.record
    }
}

/// Evidence that a nominal type satisfies a protocol, produced by the type
/// checker once verification passes. Allocated in the compilation context
/// and referenced from the declaring [`ConformanceEntry`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ConformanceRecord {
    pub nominal: DeclId,
    pub protocol: DeclId,
}

/// Shared data of class, struct, enum, and protocol declarations.
#[derive(Clone, Debug, Default)]
pub struct NominalData {
    pub(crate) members: Vec<DeclId>,
    pub(crate) extensions: Vec<DeclId>,
    pub(crate) superclass: Option<DeclId>,
    pub(crate) conformances: Vec<ConformanceEntry>,
}

impl NominalData {
    /// Members in declaration order.
    pub fn members(&self) -> &[DeclId] {
        &self.members
    }

    /// Extensions bound to this nominal, in binding order.
    pub fn extensions(&self) -> &[DeclId] {
        &self.extensions
    }

    /// The superclass, for classes that declare one. Protocols use this
    /// for nothing; their inheritance is modeled as conformance entries.
    pub fn superclass(&self) -> Option<DeclId> {
        self.superclass
    }

    /// Declared conformances in declaration order.
    pub fn conformances(&self) -> &[ConformanceEntry] {
        &self.conformances
    }
}

/// Data of an extension declaration.
#[derive(Clone, Debug)]
pub struct ExtensionData {
    /// The nominal this extension adds members to.
    pub extended: DeclId,
    pub(crate) members: Vec<DeclId>,
}

impl ExtensionData {
    pub(crate) fn new(extended: DeclId) -> Self {
        Self {
            extended,
            members: Vec::new(),
        }
    }

    /// Extension members in declaration order.
    pub fn members(&self) -> &[DeclId] {
        &self.members
    }
}

/// The kind of a declaration, with kind-specific payload.
#[derive(Clone, Debug)]
pub enum DeclKind {
    Class(NominalData),
    Struct(NominalData),
    Enum(NominalData),
    Protocol(NominalData),
    Extension(ExtensionData),
    Func,
    Var,
    Operator(Fixity),
}

impl DeclKind {
    /// A fresh class kind with no members.
    pub fn class() -> Self {
        DeclKind::Class(NominalData::default())
    }

    /// A fresh struct kind with no members.
    pub fn strukt() -> Self {
        DeclKind::Struct(NominalData::default())
    }

    /// A fresh enum kind with no members.
    pub fn enumeration() -> Self {
        DeclKind::Enum(NominalData::default())
    }

    /// A fresh protocol kind with no members.
    pub fn protocol() -> Self {
        DeclKind::Protocol(NominalData::default())
    }

    /// A fresh extension of the given nominal.
    pub fn extension(extended: DeclId) -> Self {
        DeclKind::Extension(ExtensionData::new(extended))
    }
}

/// A declaration.
///
/// Everything the resolution core needs to know about one named item:
/// where it lives, who may see it, and its kind-specific structure.
#[derive(Clone, Debug)]
pub struct Decl {
    pub name: Name,
    pub loc: SourceLoc,
    /// The module the declaration belongs to.
    pub module: ModuleId,
    pub access: Access,
    pub(crate) parent: Option<DeclId>,
    pub(crate) overrides: Option<DeclId>,
    pub(crate) kind: DeclKind,
}

impl Decl {
    pub fn kind(&self) -> &DeclKind {
        &self.kind
    }

    /// The enclosing nominal or extension, for members.
    pub fn parent(&self) -> Option<DeclId> {
        self.parent
    }

    /// The declaration this one overrides, if any.
    pub fn overrides(&self) -> Option<DeclId> {
        self.overrides
    }

    /// Whether the declaration introduces a value or type name, as opposed
    /// to an operator or extension.
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Class(_)
                | DeclKind::Struct(_)
                | DeclKind::Enum(_)
                | DeclKind::Protocol(_)
                | DeclKind::Func
                | DeclKind::Var
        )
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self.kind, DeclKind::Protocol(_))
    }

    /// Nominal payload for class/struct/enum/protocol declarations.
    pub fn nominal(&self) -> Option<&NominalData> {
        match &self.kind {
            DeclKind::Class(n)
            | DeclKind::Struct(n)
            | DeclKind::Enum(n)
            | DeclKind::Protocol(n) => Some(n),
            _ => None,
        }
    }

    pub(crate) fn nominal_mut(&mut self) -> Option<&mut NominalData> {
        match &mut self.kind {
            DeclKind::Class(n)
            | DeclKind::Struct(n)
            | DeclKind::Enum(n)
            | DeclKind::Protocol(n) => Some(n),
            _ => None,
        }
    }

    pub fn extension(&self) -> Option<&ExtensionData> {
        match &self.kind {
            DeclKind::Extension(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn extension_mut(&mut self) -> Option<&mut ExtensionData> {
        match &mut self.kind {
            DeclKind::Extension(e) => Some(e),
            _ => None,
        }
    }
}

/// A resolved type reference, as much of the type system as module-level
/// lookup needs to see.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Ty {
    /// A class, struct, enum, or protocol.
    Nominal(DeclId),
    /// The existential "any object of any class"; members are reached
    /// through dynamic lookup only.
    AnyObject,
}

impl Ty {
    /// The underlying nominal declaration, if this is a nominal reference.
    pub fn nominal(self) -> Option<DeclId> {
        match self {
            Ty::Nominal(decl) => Some(decl),
            Ty::AnyObject => None,
        }
    }
}
