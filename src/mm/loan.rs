//! The allocator's loan protocol: `allocate_frame`, `release_frame`, and
//! `lookup_cached`.
//!
//! A frame's `count` is a loan count, not a reference count in the Rust
//! sense. Nothing here ties a frame's lifetime to a Rust value's drop.
//! Reclaiming under memory pressure means waking a reclaim task and
//! retrying once, exactly the `get_free_page` shape in the host kernel's
//! original page allocator.

use super::PageCache;
use crate::error::{PageCacheError, Result};
use crate::sched::{Chan, SleepMode};

impl PageCache {
    /// Hands out a frame with loan count 1, blocking if none are free.
    ///
    /// Wakes the reclaim task and sleeps once; if the free list is still
    /// empty afterward, returns [`PageCacheError::OutOfMemory`] rather than
    /// retrying forever (this core does not implement an OOM killer or any
    /// other escalation policy; see DESIGN.md).
    pub fn allocate_frame(&self) -> Result<u32> {
        loop {
            let mut inner = self.inner.lock();
            if inner.free_list.is_empty() {
                drop(inner);
                self.sched.wakeup(Chan::Reclaimer);
                self.sched.sleep(Chan::Allocator, SleepMode::Uninterruptible);

                let still_empty = self.inner.lock().free_list.is_empty();
                if still_empty {
                    crate::warn!("allocate_frame: out of memory");
                    return Err(PageCacheError::OutOfMemory);
                }
                continue;
            }

            let inner = &mut *inner;
            let id = inner
                .free_list
                .pop_front(&mut inner.frames)
                .expect("checked non-empty under the same lock");

            if inner.frames[id as usize].is_hash_linked() {
                inner.hash.remove(&mut inner.frames, id);
                inner.stats.cached_frames -= 1;
            }
            inner.frames[id as usize].count = 1;
            inner.stats.free_pages -= 1;
            return Ok(id);
        }
    }

    /// Returns a loan. Once the loan count reaches zero, the frame is
    /// reinserted into the free list: at the head if it carries no cache
    /// identity, at the tail otherwise (see `mm::free_list`).
    ///
    /// Wakes [`Chan::Allocator`] once free pages exceed the configured
    /// watermark, mirroring `NR_BUF_RECLAIM` hysteresis: a single released
    /// frame should not repeatedly thrash a starved allocator awake.
    ///
    /// # Panics
    /// Panics if `id` is out of range, or if the frame has no outstanding
    /// loan to release.
    pub fn release_frame(&self, id: u32) {
        let should_wake = {
            let mut inner = self.inner.lock();
            let inner = &mut *inner;
            let frame = &mut inner.frames[id as usize];
            assert!(frame.count > 0, "release_frame: over-release of frame {id}");
            frame.count -= 1;
            if frame.count > 0 {
                return;
            }

            let has_identity = frame.is_hash_linked();
            if has_identity {
                inner.free_list.push_back(&mut inner.frames, id);
            } else {
                inner.free_list.push_front(&mut inner.frames, id);
            }
            inner.stats.free_pages += 1;
            inner.stats.free_pages > self.config.free_watermark
        };
        if should_wake {
            self.sched.wakeup(Chan::Allocator);
        }
    }

    /// Looks up a cached frame by `(inode, offset)`, taking out a loan on
    /// hit. A hit on a frame with loan count zero resurrects it from the
    /// free list before the count is bumped, so a concurrent allocator can
    /// never steal a frame this lookup is about to hand out (see spec
    /// scenario on lookup/release races).
    pub fn lookup_cached(&self, inode: u64, offset: u64) -> Option<u32> {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let id = inner.hash.lookup(&inner.frames, inode, offset)?;
        if inner.frames[id as usize].count == 0 {
            inner.free_list.remove(&mut inner.frames, id);
            inner.stats.free_pages -= 1;
        }
        inner.frames[id as usize].count += 1;
        Some(id)
    }

    /// Stamps a freshly filled, unpublished frame with a cache identity and
    /// links it into the hash index. Callers must not call this twice for
    /// the same frame without an intervening `evict_for_inode` or eviction.
    pub fn publish(&self, id: u32, inode: u64, offset: u64) {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        debug_assert!(
            inner.frames[id as usize].identity.is_none(),
            "publish: frame {id} is already cache-resident"
        );
        inner.frames[id as usize].identity = Some(super::frame::CacheIdentity { inode, offset });
        inner.hash.insert(&mut inner.frames, id);
        inner.stats.cached_frames += 1;
    }
}
