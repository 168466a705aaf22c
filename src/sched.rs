//! The scheduler boundary: `sleep`/`wakeup` wait-channels and the
//! interrupt-masked critical section. Both are external collaborators per
//! the core's scope; this module only declares the trait the core needs
//! and a couple of reference implementations, never a real scheduler.

/// Whether a sleeper can be woken early by a pending signal.
///
/// This core only ever requests [`SleepMode::Uninterruptible`]; the
/// `Interruptible` variant exists so the trait also describes the
/// peripheral paths (pipe and socket I/O) that share the same scheduler
/// interface in the host kernel but live outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepMode {
    Interruptible,
    Uninterruptible,
}

/// A wait-channel. The frame allocator sleeps on [`Chan::Allocator`] when
/// starved and wakes [`Chan::Reclaimer`] to ask the page-reclaim task to
/// run; the per-frame lock sleeps on [`Chan::Frame`] when a frame is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chan {
    Allocator,
    Reclaimer,
    Frame(u32),
}

/// The scheduler interface this core consumes.
///
/// Implementations must guarantee that a `wakeup(chan)` that happens-before
/// a subsequent `sleep(chan, _)` does not get lost if the sleeper re-checks
/// its condition under the same lock that serializes with the waker (this
/// core always does: see [`crate::mm::loan`]).
pub trait Scheduler: Send + Sync {
    /// Suspends the caller until `wakeup(chan)` is called.
    ///
    /// For `SleepMode::Uninterruptible`, the call cannot return early.
    fn sleep(&self, chan: Chan, mode: SleepMode);

    /// Wakes every sleeper currently blocked on `chan`.
    fn wakeup(&self, chan: Chan);
}

/// A minimal fallback scheduler for hosts with no real wait-queue: sleeping
/// busy-spins until a generation counter bumped by `wakeup` changes.
///
/// This is not how a real kernel should implement sleep/wakeup: it burns
/// CPU instead of descheduling the caller, but it keeps the crate usable
/// standalone. A production kernel should supply its own `Scheduler` backed
/// by real run-queues.
pub struct SpinScheduler {
    generation: core::sync::atomic::AtomicU64,
}

impl SpinScheduler {
    pub const fn new() -> Self {
        Self {
            generation: core::sync::atomic::AtomicU64::new(0),
        }
    }
}

impl Default for SpinScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for SpinScheduler {
    fn sleep(&self, _chan: Chan, _mode: SleepMode) {
        use core::sync::atomic::Ordering;
        let before = self.generation.load(Ordering::Acquire);
        while self.generation.load(Ordering::Acquire) == before {
            core::hint::spin_loop();
        }
    }

    fn wakeup(&self, _chan: Chan) {
        self.generation
            .fetch_add(1, core::sync::atomic::Ordering::AcqRel);
    }
}
