//! `file_read`: orchestrates the allocator, the hash index, and the fill
//! path into the read half of the file-backed mapping and `read(2)` story.

use super::fill::{Prot, Share};
use super::PageCache;
use crate::block::BufferCache;
use crate::error::PageCacheError;
use crate::inode::InodeOps;

impl PageCache {
    /// Reads up to `buf.len()` bytes from `inode` starting at `offset`,
    /// pulling in and caching pages as needed.
    ///
    /// Returns the number of bytes actually copied. A failure after at
    /// least one page has already been copied is reported as a short read
    /// (`Ok`) rather than an error, matching the usual `read(2)` contract;
    /// a failure on the very first page is reported as `Err`.
    pub fn file_read(
        &self,
        inode: &dyn InodeOps,
        blocks: &dyn BufferCache,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize, PageCacheError> {
        inode.lock();
        let result = self.file_read_locked(inode, blocks, offset, buf);
        inode.unlock();
        result
    }

    fn file_read_locked(
        &self,
        inode: &dyn InodeOps,
        blocks: &dyn BufferCache,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<usize, PageCacheError> {
        let page_size = self.config.page_size;
        let start = offset.min(inode.size());
        let mut remaining = buf.len().min((inode.size() - start) as usize);
        let mut off = start;
        let mut total = 0usize;

        while remaining > 0 {
            let page_off = off - (off % page_size as u64);
            let poffset = (off % page_size as u64) as usize;
            let n = (page_size - poffset).min(remaining);

            let id = match self.lookup_cached(inode.identity(), page_off) {
                Some(id) => id,
                None => match self.fault_in(inode, blocks, page_off) {
                    Ok(id) => id,
                    Err(e) => {
                        return if total > 0 { Ok(total) } else { Err(e) };
                    }
                },
            };

            self.lock_frame(id);
            {
                let inner = self.inner.lock();
                buf[total..total + n].copy_from_slice(&inner.frames[id as usize].data[poffset..poffset + n]);
            }
            self.unlock_frame(id);
            self.release_frame(id);

            total += n;
            remaining -= n;
            off += n as u64;
        }

        Ok(total)
    }

    fn fault_in(
        &self,
        inode: &dyn InodeOps,
        blocks: &dyn BufferCache,
        page_off: u64,
    ) -> Result<u32, PageCacheError> {
        let id = self.allocate_frame()?;
        if let Err(e) = self.fill_for_read(id, inode, page_off, Prot::READ, Share::Shared, blocks) {
            self.release_frame(id);
            return Err(e);
        }
        Ok(id)
    }
}
