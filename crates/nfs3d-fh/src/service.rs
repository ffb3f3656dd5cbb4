//! Cache-aware filehandle service.

use crate::attr::{AttrCache, FileStat};
use crate::compose::compose;
use crate::config::FhConfig;
use crate::error::{FhError, Result};
use crate::generation::{default_probe, GenerationProbe};
use crate::handle::{self, FileHandle};
use crate::path_cache::{CacheStats, PathCache};
use crate::paths;
use crate::resolve::resolve;

/// The filehandle core: codec, resolver, path cache and attribute cache
/// behind one façade.
///
/// One value per server, owned by the dispatch loop and handed to PROC
/// handlers by `&mut` reference. The server is single-threaded
/// cooperative, so the exclusive borrow is all the synchronization the
/// caches need.
pub struct FhCore {
    config: FhConfig,
    cache: PathCache,
    attr: AttrCache,
    probe: Box<dyn GenerationProbe>,
}

impl FhCore {
    /// Core with the platform's default generation probe.
    pub fn new(config: FhConfig) -> Self {
        Self::with_probe(config, default_probe())
    }

    /// Core with an explicit generation probe backend.
    pub fn with_probe(config: FhConfig, probe: Box<dyn GenerationProbe>) -> Self {
        let cache = PathCache::new(config.cache_entries);
        FhCore {
            config,
            cache,
            attr: AttrCache::new(),
            probe,
        }
    }

    pub fn config(&self) -> &FhConfig {
        &self.config
    }

    /// The generation probe, for callers that re-check `gen` after decode.
    pub fn probe(&self) -> &dyn GenerationProbe {
        self.probe.as_ref()
    }

    /// Structural validation of wire handle bytes.
    pub fn validate(&self, bytes: &[u8]) -> bool {
        handle::validate(bytes)
    }

    /// Decode wire handle bytes into a rooted path.
    ///
    /// Tries the path cache first; on a miss, falls back to the
    /// filesystem scan and caches the result. On success the attribute
    /// cache holds the stat observed for the returned path.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<String> {
        if !handle::validate(bytes) {
            self.attr.invalidate();
            return Err(FhError::InvalidHandle { len: bytes.len() });
        }
        let fh = FileHandle::from_bytes(bytes)?;

        self.cache.note_use();
        if let Some((path, stat)) = self.cache.lookup(fh.dev, fh.ino, &self.config.root) {
            self.attr.set(stat);
            return Ok(path);
        }

        match resolve(&self.config, &fh) {
            Ok((path, stat)) => {
                self.attr.set(stat);
                self.cache.add(fh.dev, fh.ino, &path);
                Ok(path)
            }
            Err(e) => {
                self.attr.invalidate();
                Err(e)
            }
        }
    }

    /// Encode a rooted path into a handle, caching the path on success.
    /// On success the attribute cache holds the stat observed for `path`.
    pub fn encode(&mut self, path: &str, require_dir: bool) -> Result<FileHandle> {
        match compose(&self.config, self.probe.as_ref(), path, require_dir) {
            Ok((fh, stat)) => {
                self.attr.set(stat);
                self.cache.add(fh.dev, fh.ino, path);
                Ok(fh)
            }
            Err(e) => {
                self.attr.invalidate();
                Err(e)
            }
        }
    }

    /// Derive a child handle from a parent handle and the child's already
    /// known identity. Touches no cache.
    pub fn extend(
        &self,
        parent: &FileHandle,
        dev: u32,
        ino: u32,
        gen: u32,
    ) -> Result<FileHandle> {
        parent.extend(dev, ino, gen, self.config.max_depth)
    }

    /// Derive a child handle by statting `path`, requiring the observed
    /// mode to carry every bit of `mode_mask` (a stat-mode pattern such as
    /// `S_IFDIR`). On success the attribute cache holds the observed stat.
    pub fn extend_with_path(
        &mut self,
        parent: &FileHandle,
        path: &str,
        mode_mask: u32,
    ) -> Result<FileHandle> {
        let real = paths::real_path(&self.config.root, path);
        let stat = match FileStat::lstat(&real) {
            Ok(stat) => stat,
            Err(e) => {
                self.attr.invalidate();
                return Err(FhError::Io(e));
            }
        };

        if stat.mode & mode_mask != mode_mask {
            self.attr.invalidate();
            return Err(FhError::WrongType {
                mode: stat.mode,
                mask: mode_mask,
            });
        }

        let gen = self.probe.generation(&stat, None, &real);
        match parent.extend(stat.dev32(), stat.ino32(), gen, self.config.max_depth) {
            Ok(fh) => {
                self.attr.set(stat);
                Ok(fh)
            }
            Err(e) => {
                self.attr.invalidate();
                Err(e)
            }
        }
    }

    /// Stat observed by the most recent successful core operation, or
    /// `None` after a failure. Peek immediately or not at all.
    pub fn peek_attr(&self) -> Option<FileStat> {
        self.attr.peek()
    }

    /// Read-only cache counters.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
