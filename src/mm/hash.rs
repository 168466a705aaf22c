//! Chained hash table mapping `(inode, page-aligned offset)` to a frame.
//!
//! The hash function is deliberately cheap: `(inode XOR offset) mod B`.
//! Residency is governed solely by key equality, so a stronger mixer could
//! be swapped in without changing any other invariant.

use super::frame::{Frame, CacheIdentity, NIL};
use alloc::vec;
use alloc::vec::Vec;

pub struct HashIndex {
    buckets: Vec<u32>,
}

#[inline]
fn hash(inode: u64, offset: u64, n_buckets: usize) -> usize {
    ((inode ^ offset) as usize) % n_buckets
}

impl HashIndex {
    pub fn new(n_buckets: usize) -> Self {
        assert!(n_buckets > 0);
        Self {
            buckets: vec![NIL; n_buckets],
        }
    }

    pub fn bucket_of(&self, inode: u64, offset: u64) -> usize {
        hash(inode, offset, self.buckets.len())
    }

    /// Inserts a frame, already stamped with its `identity`, at the head of
    /// its bucket.
    pub fn insert(&mut self, frames: &mut [Frame], id: u32) {
        let identity = frames[id as usize]
            .identity
            .expect("insert requires a stamped cache identity");
        let b = self.bucket_of(identity.inode, identity.offset);
        let old_head = self.buckets[b];
        frames[id as usize].hash_prev = NIL;
        frames[id as usize].hash_next = old_head;
        if old_head != NIL {
            frames[old_head as usize].hash_prev = id;
        }
        self.buckets[b] = id;
    }

    /// Removes a frame from its hash chain and clears its cache identity.
    pub fn remove(&mut self, frames: &mut [Frame], id: u32) {
        let Some(identity) = frames[id as usize].identity else {
            return;
        };
        let b = self.bucket_of(identity.inode, identity.offset);
        let (prev, next) = {
            let f = &frames[id as usize];
            (f.hash_prev, f.hash_next)
        };
        if prev != NIL {
            frames[prev as usize].hash_next = next;
        } else {
            self.buckets[b] = next;
        }
        if next != NIL {
            frames[next as usize].hash_prev = prev;
        }
        frames[id as usize].hash_prev = NIL;
        frames[id as usize].hash_next = NIL;
        frames[id as usize].identity = None;
    }

    /// Walks the bucket for `(inode, offset)`, returning the matching
    /// frame's index by key equality.
    pub fn lookup(&self, frames: &[Frame], inode: u64, offset: u64) -> Option<u32> {
        let b = self.bucket_of(inode, offset);
        let mut cur = self.buckets[b];
        while cur != NIL {
            let f = &frames[cur as usize];
            if f.identity == Some(CacheIdentity { inode, offset }) {
                return Some(cur);
            }
            cur = f.hash_next;
        }
        None
    }

    #[cfg(test)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of hash-resident frames (walks every bucket; used only for
    /// invariant checks in tests, not the hot path).
    #[cfg(test)]
    pub fn count(&self, frames: &[Frame]) -> usize {
        let mut n = 0;
        for &head in &self.buckets {
            let mut cur = head;
            while cur != NIL {
                n += 1;
                cur = frames[cur as usize].hash_next;
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> Vec<Frame> {
        (0..n as u32).map(|id| Frame::usable(id, 0)).collect()
    }

    #[test]
    fn insert_then_lookup_hits() {
        let mut frames = table(4);
        let mut hash = HashIndex::new(8);
        frames[2].identity = Some(CacheIdentity {
            inode: 10,
            offset: 4096,
        });
        hash.insert(&mut frames, 2);
        assert_eq!(hash.lookup(&frames, 10, 4096), Some(2));
        assert_eq!(hash.lookup(&frames, 10, 0), None);
    }

    #[test]
    fn bucket_resident_matches_formula() {
        let mut frames = table(4);
        let hash = HashIndex::new(8);
        frames[0].identity = Some(CacheIdentity {
            inode: 5,
            offset: 4096,
        });
        assert_eq!(hash.bucket_of(5, 4096), (5u64 ^ 4096u64) as usize % 8);
    }

    #[test]
    fn collisions_chain_and_remove_cleanly() {
        let mut frames = table(4);
        let mut hash = HashIndex::new(1); // force every key into bucket 0
        for (i, (inode, off)) in [(1u64, 0u64), (2, 0), (3, 0)].iter().enumerate() {
            frames[i].identity = Some(CacheIdentity {
                inode: *inode,
                offset: *off,
            });
            hash.insert(&mut frames, i as u32);
        }
        assert_eq!(hash.count(&frames), 3);
        hash.remove(&mut frames, 1);
        assert_eq!(hash.count(&frames), 2);
        assert_eq!(hash.lookup(&frames, 2, 0), None);
        assert_eq!(hash.lookup(&frames, 1, 0), Some(0));
        assert_eq!(hash.lookup(&frames, 3, 0), Some(2));
    }
}
