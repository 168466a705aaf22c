//! The inode-layer boundary: identity, block mapping, synchronous
//! writeback, size, and metadata locking. Implemented by the host kernel's
//! filesystem code; this crate never constructs or destroys an inode.

/// Outcome of mapping a file offset to a device block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMapResult {
    /// The offset maps to this device block.
    Block(u64),
    /// The offset falls in a hole (sparse region); callers zero-fill.
    Hole,
}

/// Identifies the block device backing an inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub major: u32,
    pub minor: u32,
}

/// The inode-layer interface this core consumes.
///
/// A cache identity stores only [`InodeOps::identity`]'s return value, a
/// weak back-reference used for equality alone; it must never be used to
/// keep the inode alive. Destroying an inode requires the filesystem layer
/// to call [`crate::mm::PageCache::evict_for_inode`] before dropping its
/// last strong reference.
pub trait InodeOps {
    /// A stable key suitable for hashing; typically the inode number.
    fn identity(&self) -> u64;

    /// Current file size in bytes.
    fn size(&self) -> u64;

    /// The filesystem block size backing this inode, in bytes.
    fn block_size(&self) -> usize;

    /// The device this inode's data blocks live on.
    fn device(&self) -> DeviceId;

    /// Serializes against truncation and metadata change for the duration
    /// of an operation; see [`crate::mm::file_read`].
    fn lock(&self);
    fn unlock(&self);

    /// Maps `offset` to a device block for reading.
    fn block_map(&self, offset: u64) -> Result<BlockMapResult, i32>;

    /// Synchronous writeback of `bytes` at `offset`; returns bytes written.
    fn write(&self, offset: u64, bytes: &[u8]) -> Result<usize, i32>;
}
