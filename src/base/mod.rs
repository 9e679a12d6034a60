//! Foundation types for the Vela front-end.
//!
//! This module provides fundamental types used throughout the compiler:
//! - [`Name`], [`Interner`] - Interned identifiers and operator spellings
//! - [`SourceLoc`], [`TextSize`] - Source positions
//! - [`BufferId`] - Source buffer identifiers
//!
//! This module has NO dependencies on other vela modules.

mod buffer;
mod intern;
mod span;

pub use buffer::BufferId;
pub use intern::{Interner, Name};
pub use span::{SourceLoc, TextSize};

// Re-export text-size types for convenience
pub use text_size;
