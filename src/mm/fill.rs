//! Filling a frame for a read, flushing it back to disk, and patching a
//! cached page from a concurrent write.
//!
//! The fill path forks on publication policy: a frame backing a shared or
//! read-only mapping is filled from (and published into) the page cache
//! proper, while a frame backing a private writable mapping is filled
//! straight through the buffer cache and never published, so two processes
//! privately writing the same file never observe each other's pages. There
//! is no copy-on-write bit anywhere in this design; the fork above *is* the
//! COW policy.

use super::PageCache;
use crate::block::BufferCache;
use crate::error::{PageCacheError, Result};
use crate::inode::{BlockMapResult, InodeOps};
use alloc::vec;

bitflags::bitflags! {
    /// The mapping protection a fill is being performed on behalf of.
    pub struct Prot: u8 {
        const READ = 0b01;
        const WRITE = 0b10;
    }
}

/// Whether the mapping a fill serves is shared or private.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Share {
    Shared,
    Private,
}

impl PageCache {
    /// Fills frame `id` with `inode`'s page-aligned content at `offset`.
    ///
    /// Holes read as zero. A frame is publication-eligible exactly when
    /// the mapping is read-only or shared (`cacheable`); private writable
    /// fills are routed entirely through the buffer cache and never
    /// published, so two writers never see each other's edits through this
    /// cache.
    ///
    /// `offset` must already be page-aligned; the caller (`mm::file_read`)
    /// is responsible for that alignment.
    pub fn fill_for_read(
        &self,
        id: u32,
        inode: &dyn InodeOps,
        offset: u64,
        prot: Prot,
        share: Share,
        blocks: &dyn BufferCache,
    ) -> Result<()> {
        let page_size = self.config.page_size;
        let blksize = inode.block_size();
        let dev = inode.device();
        let cacheable = !prot.contains(Prot::WRITE) || share == Share::Shared;

        let mut buf = vec![0u8; page_size];
        let mut read = 0usize;
        let mut off = offset;
        while read < page_size {
            let n = blksize.min(page_size - read);
            match inode.block_map(off).map_err(PageCacheError::Io)? {
                BlockMapResult::Hole => {
                    // Already zeroed by `vec![0u8; page_size]`.
                }
                BlockMapResult::Block(block) => {
                    if cacheable {
                        if let Some(dirty) = blocks.get_dirty_buffer(dev, block, blksize) {
                            buf[read..read + n].copy_from_slice(&dirty.data[..n]);
                        } else {
                            let driver = blocks.device(dev).ok_or(PageCacheError::Io(-5))?;
                            driver
                                .read_block(block, &mut buf[read..read + n])
                                .map_err(PageCacheError::Io)?;
                        }
                    } else {
                        let buffer = blocks.bread(dev, block, blksize).ok_or(PageCacheError::Io(-5))?;
                        buf[read..read + n].copy_from_slice(&buffer.data[..n]);
                    }
                }
            }
            read += n;
            off += n as u64;
        }

        {
            let mut inner = self.inner.lock();
            inner.frames[id as usize].data.copy_from_slice(&buf);
        }

        if cacheable {
            self.publish(id, inode.identity(), offset);
        }
        Ok(())
    }

    /// Writes frame `id`'s contents back to `inode` at `offset`, clamped to
    /// `min(file_size, length)` bytes (matching the original `write_page`'s
    /// `size = MIN(i->i_size, length)`, which clamps against the absolute
    /// file size rather than the remaining bytes past `offset`).
    pub fn flush_page(&self, id: u32, inode: &dyn InodeOps, offset: u64, length: usize) -> Result<usize> {
        let n = (length as u64).min(inode.size()) as usize;
        let data = {
            let inner = self.inner.lock();
            inner.frames[id as usize].data[..n].to_vec()
        };
        inode.write(offset, &data).map_err(PageCacheError::Io)
    }

    /// Patches `n` bytes of a cached page in place, starting at `offset`,
    /// without disturbing pages that aren't currently resident.
    ///
    /// A miss (the page isn't cached) is a silent no-op: this path exists
    /// to keep an already-cached page consistent with a write that went
    /// straight to the inode, not to pull new pages into the cache.
    pub fn update_cache(&self, inode: &dyn InodeOps, offset: u64, bytes: &[u8], n: usize) {
        let page_size = self.config.page_size as u64;
        let poffset = (offset % page_size) as usize;
        let page_off = offset - poffset as u64;
        let to_copy = (self.config.page_size - poffset).min(n);
        if to_copy == 0 {
            return;
        }
        let Some(id) = self.lookup_cached(inode.identity(), page_off) else {
            return;
        };
        self.lock_frame(id);
        {
            let mut inner = self.inner.lock();
            inner.frames[id as usize].data[poffset..poffset + to_copy]
                .copy_from_slice(&bytes[..to_copy]);
        }
        self.unlock_frame(id);
        self.release_frame(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Buffer, BlockDevice};
    use crate::inode::DeviceId;
    use crate::mm::frame::Frame;
    use crate::mm::free_list::FreeList;
    use crate::mm::hash::HashIndex;
    use crate::mm::stats::Stats;
    use crate::mm::{Config, Inner, PageCache};
    use crate::sched::SpinScheduler;
    use std::sync::Mutex as StdMutex;

    struct FakeDevice {
        blocks: StdMutex<alloc::collections::BTreeMap<u64, alloc::vec::Vec<u8>>>,
    }

    impl BlockDevice for FakeDevice {
        fn read_block(&self, block: u64, into: &mut [u8]) -> core::result::Result<(), i32> {
            let blocks = self.blocks.lock().unwrap();
            let data = blocks.get(&block).ok_or(-2)?;
            into.copy_from_slice(data);
            Ok(())
        }
    }

    struct FakeBlocks {
        dev: FakeDevice,
    }

    impl BufferCache for FakeBlocks {
        fn device(&self, _dev: DeviceId) -> Option<&dyn BlockDevice> {
            Some(&self.dev)
        }
        fn get_dirty_buffer(&self, _dev: DeviceId, _block: u64, _blksize: usize) -> Option<Buffer> {
            None
        }
        fn bread(&self, dev: DeviceId, block: u64, blksize: usize) -> Option<Buffer> {
            let mut data = alloc::vec![0u8; blksize];
            self.device(dev)?.read_block(block, &mut data).ok()?;
            Some(Buffer { data })
        }
    }

    struct FakeInode {
        id: u64,
        size: u64,
        written: StdMutex<alloc::vec::Vec<(u64, alloc::vec::Vec<u8>)>>,
    }

    impl InodeOps for FakeInode {
        fn identity(&self) -> u64 {
            self.id
        }
        fn size(&self) -> u64 {
            self.size
        }
        fn block_size(&self) -> usize {
            512
        }
        fn device(&self) -> DeviceId {
            DeviceId { major: 1, minor: 0 }
        }
        fn lock(&self) {}
        fn unlock(&self) {}
        fn block_map(&self, offset: u64) -> core::result::Result<BlockMapResult, i32> {
            if offset >= self.size {
                Ok(BlockMapResult::Hole)
            } else {
                Ok(BlockMapResult::Block(offset / 512))
            }
        }
        fn write(&self, offset: u64, bytes: &[u8]) -> core::result::Result<usize, i32> {
            self.written.lock().unwrap().push((offset, bytes.to_vec()));
            Ok(bytes.len())
        }
    }

    fn cache_with(n: usize) -> PageCache {
        let mut frames: alloc::vec::Vec<Frame> = (0..n as u32)
            .map(|id| Frame::usable_sized(id, 0, 4096))
            .collect();
        let mut free_list = FreeList::new();
        for id in 0..n as u32 {
            free_list.push_back(&mut frames, id);
        }
        static SCHED: SpinScheduler = SpinScheduler::new();
        PageCache {
            inner: spin::Mutex::new(Inner {
                frames,
                free_list,
                hash: HashIndex::new(16),
                stats: Stats {
                    free_pages: n as u64,
                    cached_frames: 0,
                    kernel_reserved_kib: 0,
                    physical_reserved_kib: 0,
                    total_pages: n as u64,
                },
            }),
            sched: &SCHED,
            config: Config::default(),
        }
    }

    #[test]
    fn fill_shared_read_publishes_and_caches() {
        let cache = cache_with(2);
        let mut blocks = alloc::collections::BTreeMap::new();
        let mut page = alloc::vec![0u8; 4096];
        page[0] = 0xAB;
        for (i, chunk) in page.chunks(512).enumerate() {
            blocks.insert(i as u64, chunk.to_vec());
        }
        let device = FakeBlocks {
            dev: FakeDevice {
                blocks: StdMutex::new(blocks),
            },
        };
        let inode = FakeInode {
            id: 1,
            size: 4096,
            written: StdMutex::new(alloc::vec::Vec::new()),
        };

        let id = cache.allocate_frame().unwrap();
        cache
            .fill_for_read(id, &inode, 0, Prot::READ, Share::Shared, &device)
            .unwrap();

        assert_eq!(cache.inner.lock().frames[id as usize].data[0], 0xAB);
        assert_eq!(cache.lookup_cached(1, 0), Some(id));
        cache.release_frame(id);
        cache.release_frame(id);
    }

    #[test]
    fn fill_private_writable_never_publishes() {
        let cache = cache_with(2);
        let blocks = alloc::collections::BTreeMap::new();
        let device = FakeBlocks {
            dev: FakeDevice {
                blocks: StdMutex::new(blocks),
            },
        };
        let inode = FakeInode {
            id: 2,
            size: 4096,
            written: StdMutex::new(alloc::vec::Vec::new()),
        };

        let id = cache.allocate_frame().unwrap();
        cache
            .fill_for_read(id, &inode, 0, Prot::READ | Prot::WRITE, Share::Private, &device)
            .unwrap();

        assert_eq!(cache.lookup_cached(2, 0), None, "private writable fill must not publish");
        cache.release_frame(id);
    }

    #[test]
    fn fill_past_eof_reads_as_hole() {
        let cache = cache_with(1);
        let blocks = alloc::collections::BTreeMap::new();
        let device = FakeBlocks {
            dev: FakeDevice {
                blocks: StdMutex::new(blocks),
            },
        };
        let inode = FakeInode {
            id: 3,
            size: 0,
            written: StdMutex::new(alloc::vec::Vec::new()),
        };

        let id = cache.allocate_frame().unwrap();
        cache
            .fill_for_read(id, &inode, 0, Prot::READ, Share::Shared, &device)
            .unwrap();
        assert!(cache.inner.lock().frames[id as usize].data.iter().all(|&b| b == 0));
        cache.release_frame(id);
    }

    #[test]
    fn update_cache_patches_only_resident_pages() {
        let cache = cache_with(2);
        let inode = FakeInode {
            id: 4,
            size: 4096,
            written: StdMutex::new(alloc::vec::Vec::new()),
        };
        // No page cached yet: must be a no-op, not a panic.
        cache.update_cache(&inode, 10, &[1, 2, 3], 3);

        let id = cache.allocate_frame().unwrap();
        cache.publish(id, 4, 0);
        cache.release_frame(id);

        cache.update_cache(&inode, 10, &[9, 9, 9], 3);
        let hit = cache.lookup_cached(4, 0).unwrap();
        assert_eq!(&cache.inner.lock().frames[hit as usize].data[10..13], &[9, 9, 9]);
        cache.release_frame(hit);
    }

    #[test]
    fn flush_page_clamps_to_inode_size() {
        let cache = cache_with(1);
        let inode = FakeInode {
            id: 5,
            size: 100,
            written: StdMutex::new(alloc::vec::Vec::new()),
        };
        let id = cache.allocate_frame().unwrap();
        {
            let mut inner = cache.inner.lock();
            inner.frames[id as usize].data[0] = 7;
        }
        let n = cache.flush_page(id, &inode, 0, 4096).unwrap();
        assert_eq!(n, 100);
        assert_eq!(inode.written.lock().unwrap().len(), 1);
        cache.release_frame(id);
    }
}
