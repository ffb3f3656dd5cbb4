use crate::handle::FH_MAX_DEPTH;
use std::path::PathBuf;

/// Tunables for the filehandle core.
#[derive(Debug, Clone)]
pub struct FhConfig {
    /// Directory tree the server exports. Paths given to and returned by
    /// the core are rooted here: `/a/b` names `<root>/a/b` on the host.
    pub root: PathBuf,
    /// Path-cache capacity.
    pub cache_entries: usize,
    /// Cap on the handle directory-trail length. Must fit the wire `u8`.
    pub max_depth: usize,
    /// Longest path the resolver will assemble while scanning.
    pub max_path: usize,
}

impl Default for FhConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            cache_entries: 4096,
            max_depth: FH_MAX_DEPTH,
            max_path: 4096,
        }
    }
}

impl FhConfig {
    /// Config with the reference tunables and the given export root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}
