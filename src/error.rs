//! The small, caller-visible error taxonomy for the page cache.
//!
//! Out-of-range frame indices are a client bug, not a recoverable error;
//! those are asserted/panicked at the call site instead of appearing here.

use core::fmt;

/// Errors surfaced by the allocator and fill/flush path.
///
/// `Io` carries the opaque negative error code returned by the inode or
/// block-device collaborator; this crate does not interpret it, only
/// forwards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCacheError {
    /// The allocator is exhausted after waking the reclaimer and re-checking
    /// the free list; no OOM killer is wired up (see DESIGN.md).
    OutOfMemory,
    /// A hard I/O failure from `block_map`, `read_block`, or `write`.
    Io(i32),
}

impl fmt::Display for PageCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageCacheError::OutOfMemory => write!(f, "out of memory"),
            PageCacheError::Io(code) => write!(f, "I/O error (errno {code})"),
        }
    }
}

pub type Result<T> = core::result::Result<T, PageCacheError>;
