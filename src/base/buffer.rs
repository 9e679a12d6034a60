//! Identifiers for source buffers.

use std::fmt;

/// An identifier for a source buffer managed by the driver.
///
/// `BufferId` is a lightweight handle (just a u32) naming one buffer of
/// source text. The buffer contents and path live in the driver's source
/// manager, outside this crate.
///
/// Using `BufferId` instead of a path or a text handle:
/// - Makes comparisons O(1) instead of O(n)
/// - Reduces memory usage (4 bytes vs ~24+ bytes)
/// - Enables cheap copying and hashing
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BufferId(pub u32);

impl BufferId {
    /// Create a new BufferId from a raw index.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

impl From<u32> for BufferId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<BufferId> for u32 {
    #[inline]
    fn from(id: BufferId) -> Self {
        id.0
    }
}
