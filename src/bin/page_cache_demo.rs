//! A small host-side harness wiring the page cache's trait boundaries to
//! in-memory fakes, exercising the core read and eviction paths end to end.
//! Not part of the public API; a sanity check you can run on a dev box
//! while the crate itself stays no_std.

use page_cache::bios::MemoryMap;
use page_cache::block::{BlockDevice, Buffer, BufferCache};
use page_cache::inode::{BlockMapResult, DeviceId, InodeOps};
use page_cache::mm::init;
use page_cache::sched::SpinScheduler;
use page_cache::{Config, Prot, Share};
use std::collections::BTreeMap;
use std::sync::Mutex;

struct RamDisk {
    blocks: Mutex<BTreeMap<u64, Vec<u8>>>,
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block: u64, into: &mut [u8]) -> Result<(), i32> {
        let blocks = self.blocks.lock().unwrap();
        match blocks.get(&block) {
            Some(data) => {
                into.copy_from_slice(data);
                Ok(())
            }
            None => Err(-2),
        }
    }
}

struct RamBufferCache {
    disk: RamDisk,
}

impl BufferCache for RamBufferCache {
    fn device(&self, _dev: DeviceId) -> Option<&dyn BlockDevice> {
        Some(&self.disk)
    }
    fn get_dirty_buffer(&self, _dev: DeviceId, _block: u64, _blksize: usize) -> Option<Buffer> {
        None
    }
    fn bread(&self, dev: DeviceId, block: u64, blksize: usize) -> Option<Buffer> {
        let mut data = vec![0u8; blksize];
        self.device(dev)?.read_block(block, &mut data).ok()?;
        Some(Buffer { data })
    }
}

struct FlatFile {
    id: u64,
    size: u64,
}

impl InodeOps for FlatFile {
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
        DeviceId { major: 8, minor: 0 }
    }
    fn lock(&self) {}
    fn unlock(&self) {}
    fn block_map(&self, offset: u64) -> Result<BlockMapResult, i32> {
        if offset >= self.size {
            Ok(BlockMapResult::Hole)
        } else {
            Ok(BlockMapResult::Block(offset / 512))
        }
    }
    fn write(&self, _offset: u64, bytes: &[u8]) -> Result<usize, i32> {
        Ok(bytes.len())
    }
}

struct AllRamUsable;
impl MemoryMap for AllRamUsable {
    fn is_usable(&self, _phys_addr: usize) -> bool {
        true
    }
}

fn main() {
    static SCHED: SpinScheduler = SpinScheduler::new();
    let cache = init::init(0, 4, 0, 0, &AllRamUsable, &SCHED, Config::default());

    let mut blocks = BTreeMap::new();
    for i in 0..8u64 {
        blocks.insert(i, vec![b'a' + (i as u8 % 26); 512]);
    }
    let device = RamBufferCache {
        disk: RamDisk {
            blocks: Mutex::new(blocks),
        },
    };
    let file = FlatFile { id: 1, size: 4096 };

    let mut buf = vec![0u8; 4096];
    let n = cache.file_read(&file, &device, 0, &mut buf).unwrap();
    println!("cold read: {n} bytes, free frames now {}", cache.free_pages());

    let n2 = cache.file_read(&file, &device, 0, &mut buf).unwrap();
    println!("warm read: {n2} bytes, cached kib = {}", cache.cached_kib());

    let id = cache.allocate_frame().unwrap();
    cache
        .fill_for_read(id, &file, 4096, Prot::READ | Prot::WRITE, Share::Private, &device)
        .unwrap();
    println!(
        "private writable fill published = {}",
        cache.lookup_cached(file.identity(), 4096).is_some()
    );
    cache.release_frame(id);
}
