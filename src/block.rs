//! The block-layer boundary: device drivers and the buffer cache. The fill
//! path consults the buffer cache first so in-memory modified blocks are
//! never shadowed by a stale on-disk read.

use crate::inode::DeviceId;
use alloc::vec::Vec;

/// A buffer-cache block, released back to the buffer cache on drop.
///
/// This stands in for Fiwix's `struct buffer` plus its `brelse()` call;
/// owning the bytes here (rather than borrowing) keeps the trait
/// object-safe and avoids tying this crate's lifetime to the buffer
/// cache's internal locking.
pub struct Buffer {
    pub data: Vec<u8>,
}

/// The block-device driver interface this core consumes.
pub trait BlockDevice {
    /// Synchronously reads one block into `into`. `into.len()` is the
    /// filesystem's block size.
    fn read_block(&self, block: u64, into: &mut [u8]) -> Result<(), i32>;
}

/// The buffer-cache interface this core consumes.
pub trait BufferCache {
    /// Looks up `dev`'s driver.
    fn device(&self, dev: DeviceId) -> Option<&dyn BlockDevice>;

    /// Returns a buffer only if it is already resident and dirty (modified
    /// in memory); never triggers I/O.
    fn get_dirty_buffer(&self, dev: DeviceId, block: u64, blksize: usize) -> Option<Buffer>;

    /// Buffer-cache read-through: returns the block's buffer, reading it
    /// from the device if not already resident.
    fn bread(&self, dev: DeviceId, block: u64, blksize: usize) -> Option<Buffer>;
}
