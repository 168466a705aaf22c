//! The page cache and physical page-frame allocator.
//!
//! [`PageCache`] owns the frame table, the free list, and the hash index,
//! and exposes the loan protocol, the fill/flush path, and file-read
//! orchestration described in the module-level docs of each submodule.
//! Everything that mutates frame/list/counter state does so while holding
//! [`PageCache`]'s single internal lock, which stands in for the
//! interrupt-masked critical section the original kernel uses (see the
//! design notes on non-single-CPU platforms).

pub mod fill;
pub mod file_read;
pub mod free_list;
pub mod frame;
pub mod hash;
pub mod init;
pub mod lock;
pub mod loan;
pub mod stats;

pub use self::fill::{Prot, Share};

use self::free_list::FreeList;
use self::frame::Frame;
use self::hash::HashIndex;
use self::stats::Stats;
use crate::sched::Scheduler;
use alloc::vec::Vec;

/// Boot-time/runtime tunables. `free_watermark` is this crate's runtime
/// equivalent of Fiwix's compile-time `NR_BUF_RECLAIM`.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub page_size: usize,
    pub free_watermark: u64,
    pub hash_buckets_min: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: 4096,
            free_watermark: 4,
            hash_buckets_min: 16,
        }
    }
}

/// State guarded by the allocator's single lock.
pub(crate) struct Inner {
    pub frames: Vec<Frame>,
    pub free_list: FreeList,
    pub hash: HashIndex,
    pub stats: Stats,
}

/// The page cache and frame allocator.
///
/// Construct with [`init::init`]; there is no implicit global instance, so
/// tests can build independent caches. [`install_global`]/[`global`]
/// provide the traditional single-kernel-instance pattern for callers that
/// want it.
pub struct PageCache {
    pub(crate) inner: spin::Mutex<Inner>,
    pub(crate) sched: &'static dyn Scheduler,
    pub(crate) config: Config,
}

impl PageCache {
    pub fn config(&self) -> Config {
        self.config
    }

    pub fn valid_frame(&self, id: u32) -> bool {
        (id as usize) < self.inner.lock().frames.len()
    }

    pub fn free_pages(&self) -> u64 {
        self.inner.lock().stats.free_pages
    }

    pub fn cached_kib(&self) -> u64 {
        let inner = self.inner.lock();
        inner.stats.cached_kib(self.config.page_size)
    }

    pub fn kernel_reserved_kib(&self) -> u64 {
        self.inner.lock().stats.kernel_reserved_kib
    }

    pub fn physical_reserved_kib(&self) -> u64 {
        self.inner.lock().stats.physical_reserved_kib
    }

    pub fn total_pages(&self) -> u64 {
        self.inner.lock().stats.total_pages
    }

    /// Removes every frame whose cache identity belongs to `inode` from the
    /// hash index. Required before the filesystem layer drops its last
    /// strong reference to an inode, since a cache identity is a weak
    /// back-reference.
    pub fn evict_for_inode(&self, inode: u64) {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let ids: Vec<u32> = inner
            .frames
            .iter()
            .filter(|f| f.identity.map(|c| c.inode) == Some(inode))
            .map(|f| f.id)
            .collect();
        for id in ids {
            inner.hash.remove(&mut inner.frames, id);
            inner.stats.cached_frames -= 1;
        }
    }
}

static GLOBAL: spin::Once<PageCache> = spin::Once::new();

/// Installs the single global page cache instance.
///
/// Unlike the teacher's other subsystems, this cannot be a zero-argument
/// `lazy_static!` (the frame table's size depends on the boot-time memory
/// map); callers run [`init::init`] first, then install the result here.
pub fn install_global(cache: PageCache) -> &'static PageCache {
    GLOBAL.call_once(|| cache)
}

/// Returns the global page cache installed by [`install_global`].
///
/// # Panics
/// Panics if no instance has been installed yet.
pub fn global() -> &'static PageCache {
    GLOBAL
        .get()
        .expect("page cache not initialized: call mm::install_global first")
}
