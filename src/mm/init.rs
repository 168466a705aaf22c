//! Boot-time frame-table construction.
//!
//! Walks the physical address range in page-size steps, classifying each
//! frame as kernel-reserved, firmware-reserved, or free, exactly the
//! three-way split the host kernel's own page-table bring-up performs
//! before the scheduler or any filesystem exists.

use super::free_list::FreeList;
use super::frame::Frame;
use super::hash::HashIndex;
use super::stats::Stats;
use super::{Config, Inner, PageCache};
use crate::bios::MemoryMap;
use crate::sched::Scheduler;
use alloc::vec::Vec;

/// Builds a [`PageCache`] covering `n_frames` page-sized slots starting at
/// `phys_base`.
///
/// `kernel_start`/`kernel_end` bound the kernel image's own physical
/// footprint (always reserved, regardless of what the firmware map says);
/// every other frame is reserved if `bios` reports it as unusable and free
/// otherwise. Free frames are appended to the free list in ascending
/// address order, matching boot memory layout.
pub fn init(
    phys_base: usize,
    n_frames: usize,
    kernel_start: usize,
    kernel_end: usize,
    bios: &dyn MemoryMap,
    sched: &'static dyn Scheduler,
    config: Config,
) -> PageCache {
    let mut frames = Vec::with_capacity(n_frames);
    let mut free_list = FreeList::new();
    let mut kernel_reserved = 0u64;
    let mut physical_reserved = 0u64;
    let mut free_pages = 0u64;

    for n in 0..n_frames {
        let id = n as u32;
        let addr = phys_base + n * config.page_size;

        if addr >= kernel_start && addr < kernel_end {
            frames.push(Frame::reserved(id));
            kernel_reserved += 1;
            continue;
        }
        if !bios.is_usable(addr) {
            frames.push(Frame::reserved(id));
            physical_reserved += 1;
            continue;
        }

        frames.push(Frame::usable_sized(id, addr, config.page_size));
        free_list.push_back(&mut frames, id);
        free_pages += 1;
    }

    let n_buckets = n_frames
        .max(config.hash_buckets_min)
        .next_power_of_two();
    let kib_per_page = (config.page_size / 1024) as u64;

    PageCache {
        inner: spin::Mutex::new(Inner {
            frames,
            free_list,
            hash: HashIndex::new(n_buckets),
            stats: Stats {
                free_pages,
                cached_frames: 0,
                kernel_reserved_kib: kernel_reserved * kib_per_page,
                physical_reserved_kib: physical_reserved * kib_per_page,
                total_pages: n_frames as u64,
            },
        }),
        sched,
        config,
    }
}
