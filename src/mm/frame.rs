//! The frame descriptor: one entry per physical page-sized RAM slot.
//!
//! Free-list and hash-chain links are frame-table indices rather than
//! pointers or heap nodes (frames never move once the table is sized at
//! boot), the same intrusive-list shape the teacher's buddy allocator uses
//! for its own per-order free lists.

use alloc::vec;
use alloc::vec::Vec;

/// Sentinel meaning "no link" for hash chains.
pub const NIL: u32 = u32::MAX;

/// The `(inode, page-aligned offset)` a frame's contents currently
/// represent.
///
/// This is a weak back-reference by construction: it stores only the
/// numeric identity returned by `InodeOps::identity`, never a reference to
/// the inode itself, so a cached frame can never keep an inode alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheIdentity {
    pub inode: u64,
    pub offset: u64,
}

/// Per-frame metadata.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Stable index into the frame table; equal to this frame's position.
    pub id: u32,
    /// Kernel-virtual address of the backing page. Only meaningful when
    /// `!reserved`.
    pub vaddr: usize,
    /// Frames the allocator may never lend: kernel image, firmware,
    /// video memory. Never on the free list, never cached.
    pub reserved: bool,
    /// Outstanding loans. Zero means reclaimable (unless reserved).
    pub count: u32,
    /// The per-frame lock's busy bit (see `mm::lock`).
    pub busy: bool,
    /// Current cache identity, or `None`.
    pub identity: Option<CacheIdentity>,

    /// Free-list links. Meaningful only while the frame is actually linked
    /// (`count == 0 && !reserved`); a solitary entry self-links like the
    /// teacher's buddy-allocator free frames do.
    pub free_prev: u32,
    pub free_next: u32,

    /// Hash-chain links, `NIL` when not linked or chain-terminal.
    pub hash_prev: u32,
    pub hash_next: u32,

    /// The frame's backing bytes. Empty for reserved frames, which are
    /// never read or written by this core.
    pub data: Vec<u8>,
}

impl Frame {
    pub fn reserved(id: u32) -> Self {
        Frame {
            id,
            vaddr: 0,
            reserved: true,
            count: 0,
            busy: false,
            identity: None,
            free_prev: id,
            free_next: id,
            hash_prev: NIL,
            hash_next: NIL,
            data: Vec::new(),
        }
    }

    pub fn usable(id: u32, vaddr: usize) -> Self {
        Self::usable_sized(id, vaddr, 4096)
    }

    pub fn usable_sized(id: u32, vaddr: usize, page_size: usize) -> Self {
        Frame {
            id,
            vaddr,
            reserved: false,
            count: 0,
            busy: false,
            identity: None,
            free_prev: id,
            free_next: id,
            hash_prev: NIL,
            hash_next: NIL,
            data: vec![0u8; page_size],
        }
    }

    /// A frame is reclaimable exactly when it carries no outstanding loans
    /// and is not permanently reserved (invariant 1 in spec §3/§8).
    #[inline]
    pub fn is_reclaimable(&self) -> bool {
        self.count == 0 && !self.reserved
    }

    pub fn is_hash_linked(&self) -> bool {
        self.identity.is_some()
    }
}
