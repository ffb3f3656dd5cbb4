#![warn(missing_docs)]

//! NFSv3 filehandle core.
//!
//! Translates between rooted paths and the opaque, bounded filehandles an
//! NFSv3 server hands its clients. Handles survive server restarts (the
//! server is stateless) and path mutation (a directory-trail hint lets a
//! filesystem scan relocate the object by `(dev, ino)`); a validated LRU
//! path cache keeps the common decode to a single `lstat`.

/// `FileStat` metadata snapshots and the single-slot attribute cache.
pub mod attr;
/// Path → handle encoding.
pub mod compose;
/// Tunables: export root, cache capacity, depth and path limits.
pub mod config;
/// Error types and NFSv3 status mapping.
pub mod error;
/// Inode generation probes (native stat field, ext ioctl, inode fallback).
pub mod generation;
/// Handle data model, inode hash, wire codec, extension.
pub mod handle;
/// `(dev, ino)` → path cache with LRU eviction and lstat validation.
pub mod path_cache;
mod paths;
/// Handle → path resolution by filesystem scan.
pub mod resolve;
/// The `FhCore` façade tying codec, resolver and caches together.
pub mod service;

pub use attr::{AttrCache, FileStat};
pub use config::FhConfig;
pub use error::{FhError, Result};
pub use generation::{default_probe, GenerationProbe};
pub use handle::{ino_hash, validate, FileHandle, FH_HEADER_LEN, FH_MAX_DEPTH, INVALID_HANDLE};
pub use path_cache::CacheStats;
pub use service::FhCore;
