//! Source positions for declarations and access-path elements.

use std::fmt;

// Re-export from text-size for compatibility
pub use text_size::TextSize;

/// A position in source text, as a byte offset into its owning buffer.
///
/// The owning buffer is tracked separately (see [`BufferId`]); a `SourceLoc`
/// on its own is only position identity. Synthesized declarations carry
/// [`SourceLoc::INVALID`].
///
/// [`BufferId`]: crate::base::BufferId
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SourceLoc(u32);

impl SourceLoc {
    /// The location of synthesized code, present in no buffer.
    pub const INVALID: SourceLoc = SourceLoc(u32::MAX);

    /// Create a location from a byte offset.
    #[inline]
    pub fn new(offset: TextSize) -> Self {
        Self(offset.into())
    }

    /// Create a location from a raw byte offset.
    #[inline]
    pub const fn from_raw(offset: u32) -> Self {
        Self(offset)
    }

    /// Whether this location refers to real source text.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// Byte offset into the owning buffer, or `None` for synthesized code.
    #[inline]
    pub fn offset(self) -> Option<TextSize> {
        self.is_valid().then(|| TextSize::from(self.0))
    }
}

impl fmt::Debug for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "loc#{}", self.0)
        } else {
            write!(f, "loc#invalid")
        }
    }
}
