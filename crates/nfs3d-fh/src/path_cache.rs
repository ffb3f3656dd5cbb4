//! `(dev, ino)` to path cache with LRU eviction.
//!
//! Entries are hints, not truth: the filesystem mutates underneath the
//! server, so every hit is re-validated with an `lstat` before it is
//! returned, and entries that no longer hold are cleared on the spot.

use crate::attr::FileStat;
use crate::paths;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Read-only cache counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of slots ever used (high-water mark).
    pub max_slot: usize,
    /// Cached decode attempts.
    pub uses: u64,
    /// Validated cache hits.
    pub hits: u64,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    dev: u32,
    ino: u32,
    path: String,
    /// LRU stamp; 0 marks an empty slot.
    use_stamp: u64,
}

/// Fixed-capacity `(dev, ino)` → rooted-path cache.
pub struct PathCache {
    capacity: usize,
    slots: Vec<Slot>,
    stamp: u64,
    uses: u64,
    hits: u64,
}

impl PathCache {
    pub fn new(capacity: usize) -> Self {
        PathCache {
            capacity,
            slots: Vec::new(),
            stamp: 0,
            uses: 0,
            hits: 0,
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }

    fn find(&self, dev: u32, ino: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.use_stamp != 0 && s.dev == dev && s.ino == ino)
    }

    fn clear(&mut self, idx: usize) {
        self.slots[idx] = Slot::default();
    }

    /// Count one cached decode attempt.
    pub fn note_use(&mut self) {
        self.uses += 1;
    }

    /// Look up a path for `(dev, ino)` and validate it against the live
    /// filesystem. A stale or vanished entry is cleared and reported as a
    /// miss; a hit refreshes the entry's LRU stamp.
    pub fn lookup(&mut self, dev: u32, ino: u32, root: &Path) -> Option<(String, FileStat)> {
        let idx = self.find(dev, ino)?;

        let real = paths::real_path(root, &self.slots[idx].path);
        match FileStat::lstat(&real) {
            Ok(stat) if stat.dev32() == dev && stat.ino32() == ino => {
                self.slots[idx].use_stamp = self.next_stamp();
                self.hits += 1;
                Some((self.slots[idx].path.clone(), stat))
            }
            Ok(_) => {
                // path no longer names this object
                debug!("path_cache: stale entry {} cleared", self.slots[idx].path);
                self.clear(idx);
                None
            }
            Err(_) => {
                debug!("path_cache: vanished entry {} cleared", self.slots[idx].path);
                self.clear(idx);
                None
            }
        }
    }

    /// Insert or refresh the path for `(dev, ino)`.
    ///
    /// An existing entry for the same identity is overwritten in place.
    /// Otherwise the first empty slot is used, and with the cache full the
    /// occupied slot with the smallest LRU stamp is evicted.
    pub fn add(&mut self, dev: u32, ino: u32, path: &str) {
        let idx = match self.find(dev, ino) {
            Some(idx) => idx,
            None => self.free_slot(),
        };

        let stamp = self.next_stamp();
        self.slots[idx] = Slot {
            dev,
            ino,
            path: paths::canonical(path),
            use_stamp: stamp,
        };
    }

    fn free_slot(&mut self) -> usize {
        if self.slots.len() < self.capacity {
            self.slots.push(Slot::default());
            return self.slots.len() - 1;
        }

        if let Some(idx) = self.slots.iter().position(|s| s.use_stamp == 0) {
            return idx;
        }

        // full: evict the least recently used occupied slot
        let idx = self
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.use_stamp)
            .map(|(i, _)| i)
            .unwrap_or(0);
        debug!("path_cache: evicting {}", self.slots[idx].path);
        idx
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            max_slot: self.slots.len(),
            uses: self.uses,
            hits: self.hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_and_find() {
        let mut cache = PathCache::new(4);
        cache.add(1, 10, "a");
        cache.add(1, 20, "a/b");
        assert_eq!(cache.find(1, 10), Some(0));
        assert_eq!(cache.find(1, 20), Some(1));
        assert_eq!(cache.find(1, 30), None);
    }

    #[test]
    fn test_add_same_identity_overwrites_in_place() {
        let mut cache = PathCache::new(4);
        cache.add(1, 10, "a");
        cache.add(1, 10, "b");
        assert_eq!(cache.find(1, 10), Some(0));
        assert_eq!(cache.slots[0].path, "b");
        assert_eq!(cache.stats().max_slot, 1);
    }

    #[test]
    fn test_add_canonicalizes_path() {
        let mut cache = PathCache::new(4);
        cache.add(1, 10, "/a/b/c");
        assert_eq!(cache.slots[0].path, "a/b/c");
        cache.add(1, 20, "/");
        assert_eq!(cache.slots[1].path, "/");
    }

    #[test]
    fn test_full_cache_evicts_smallest_stamp() {
        let mut cache = PathCache::new(4);
        cache.add(1, 10, "a"); // stamp 1
        cache.add(1, 20, "b"); // stamp 2
        cache.add(1, 30, "c"); // stamp 3
        cache.add(1, 40, "d"); // stamp 4
        cache.add(1, 50, "e"); // evicts ino 10

        assert_eq!(cache.find(1, 10), None);
        for ino in [20, 30, 40, 50] {
            assert!(cache.find(1, ino).is_some(), "ino {} missing", ino);
        }
        assert_eq!(cache.stats().max_slot, 4);
    }

    #[test]
    fn test_cleared_slot_reused_before_eviction() {
        let mut cache = PathCache::new(2);
        cache.add(1, 10, "a");
        cache.add(1, 20, "b");
        cache.clear(0);
        cache.add(1, 30, "c");

        // ino 20 survived; the cleared slot was taken instead
        assert!(cache.find(1, 20).is_some());
        assert!(cache.find(1, 30).is_some());
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let mut cache = PathCache::new(4);
        cache.add(1, 10, "a");
        cache.add(1, 20, "b");
        cache.add(1, 10, "a2");
        assert!(cache.slots[0].use_stamp > cache.slots[1].use_stamp);
    }

    #[test]
    fn test_lookup_hit_validates_and_restamps() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), b"x").unwrap();
        let stat = FileStat::lstat(&dir.path().join("f")).unwrap();

        let mut cache = PathCache::new(4);
        cache.add(stat.dev32(), stat.ino32(), "f");
        let before = cache.slots[0].use_stamp;

        let (path, seen) = cache
            .lookup(stat.dev32(), stat.ino32(), dir.path())
            .unwrap();
        assert_eq!(path, "f");
        assert_eq!(seen.ino, stat.ino);
        assert!(cache.slots[0].use_stamp > before);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_lookup_vanished_entry_clears_slot() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), b"x").unwrap();
        let stat = FileStat::lstat(&dir.path().join("f")).unwrap();

        let mut cache = PathCache::new(4);
        cache.add(stat.dev32(), stat.ino32(), "f");
        std::fs::remove_file(dir.path().join("f")).unwrap();

        assert!(cache
            .lookup(stat.dev32(), stat.ino32(), dir.path())
            .is_none());
        assert_eq!(cache.find(stat.dev32(), stat.ino32()), None);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_lookup_mismatched_identity_clears_slot() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f"), b"x").unwrap();
        std::fs::write(dir.path().join("g"), b"y").unwrap();
        let f = FileStat::lstat(&dir.path().join("f")).unwrap();

        // entry claims f's identity lives at g's path
        let mut cache = PathCache::new(4);
        cache.add(f.dev32(), f.ino32(), "g");

        assert!(cache.lookup(f.dev32(), f.ino32(), dir.path()).is_none());
        assert_eq!(cache.find(f.dev32(), f.ino32()), None);
    }

    #[test]
    fn test_lookup_root_entry() {
        let dir = TempDir::new().unwrap();
        let stat = FileStat::lstat(dir.path()).unwrap();

        let mut cache = PathCache::new(4);
        cache.add(stat.dev32(), stat.ino32(), "/");
        let (path, _) = cache
            .lookup(stat.dev32(), stat.ino32(), dir.path())
            .unwrap();
        assert_eq!(path, "/");
    }

    #[test]
    fn test_stats_counters() {
        let mut cache = PathCache::new(4);
        assert_eq!(cache.stats().uses, 0);
        cache.note_use();
        cache.note_use();
        assert_eq!(cache.stats().uses, 2);
        assert_eq!(cache.stats().max_slot, 0);
    }
}
