//! The per-frame busy-bit lock.
//!
//! This is distinct from the allocator's own internal lock (which stands
//! in for interrupt masking): the busy bit is a cooperative, sleep-capable
//! mutex over a single frame's contents, held across I/O, while the
//! internal lock is only ever held for short, non-blocking bookkeeping.

use super::PageCache;
use crate::sched::{Chan, SleepMode};

impl PageCache {
    /// Acquires frame `id`'s busy bit, sleeping uninterruptibly while it is
    /// held elsewhere.
    ///
    /// # Panics
    /// Panics if `id` is out of range.
    pub fn lock_frame(&self, id: u32) {
        loop {
            let mut inner = self.inner.lock();
            let frame = &mut inner.frames[id as usize];
            if frame.busy {
                drop(inner);
                self.sched.sleep(Chan::Frame(id), SleepMode::Uninterruptible);
                continue;
            }
            frame.busy = true;
            return;
        }
    }

    /// Releases frame `id`'s busy bit and wakes anyone sleeping on it.
    ///
    /// # Panics
    /// Panics if `id` is out of range.
    pub fn unlock_frame(&self, id: u32) {
        {
            let mut inner = self.inner.lock();
            inner.frames[id as usize].busy = false;
        }
        self.sched.wakeup(Chan::Frame(id));
    }
}

#[cfg(test)]
mod tests {
    use crate::mm::frame::Frame;
    use crate::mm::free_list::FreeList;
    use crate::mm::hash::HashIndex;
    use crate::mm::stats::Stats;
    use crate::mm::{Config, Inner, PageCache};
    use crate::sched::test_sched::ThreadedScheduler;

    fn one_frame_cache(sched: &'static ThreadedScheduler) -> PageCache {
        let frames = alloc::vec![Frame::usable_sized(0, 0, 4096)];
        PageCache {
            inner: spin::Mutex::new(Inner {
                frames,
                free_list: FreeList::new(),
                hash: HashIndex::new(16),
                stats: Stats::new(),
            }),
            sched,
            config: Config::default(),
        }
    }

    #[test]
    fn lock_then_unlock_round_trips() {
        let sched: &'static ThreadedScheduler = Box::leak(Box::new(ThreadedScheduler::new()));
        let cache = one_frame_cache(sched);
        cache.lock_frame(0);
        assert!(cache.inner.lock().frames[0].busy);
        cache.unlock_frame(0);
        assert!(!cache.inner.lock().frames[0].busy);
    }

    #[test]
    fn second_locker_blocks_until_release() {
        let sched: &'static ThreadedScheduler = Box::leak(Box::new(ThreadedScheduler::new()));
        let cache: &'static PageCache = Box::leak(Box::new(one_frame_cache(sched)));

        cache.lock_frame(0);
        let handle = std::thread::spawn(move || {
            cache.lock_frame(0);
            cache.unlock_frame(0);
        });

        std::thread::sleep(std::time::Duration::from_millis(20));
        cache.unlock_frame(0);
        handle.join().unwrap();
    }
}
