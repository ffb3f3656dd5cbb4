//! Path to filehandle encoding.

use crate::attr::FileStat;
use crate::config::FhConfig;
use crate::error::{FhError, Result};
use crate::generation::GenerationProbe;
use crate::handle::{ino_hash, FileHandle};
use crate::paths;

/// Compose a filehandle for a rooted path.
///
/// The trail records the inode hash of every ancestor directory between
/// the export root (excluded) and the object (excluded), parent last. The
/// export root itself encodes with an empty trail.
///
/// Returns the handle together with the stat observed for the object, so
/// the caller can populate the attribute cache without re-statting.
pub fn compose(
    config: &FhConfig,
    probe: &dyn GenerationProbe,
    path: &str,
    require_dir: bool,
) -> Result<(FileHandle, FileStat)> {
    let real = paths::real_path(&config.root, path);
    let stat = FileStat::lstat(&real)?;

    if require_dir && !stat.is_dir() {
        return Err(FhError::NotDirectory {
            path: paths::canonical(path),
        });
    }

    let gen = probe.generation(&stat, None, &real);

    let comps = paths::components(path);
    if comps.is_empty() {
        return Ok((FileHandle::new(stat.dev32(), stat.ino32(), gen), stat));
    }

    let ancestors = comps.len() - 1;
    if ancestors > config.max_depth {
        return Err(FhError::TooDeep {
            depth: ancestors,
            limit: config.max_depth,
        });
    }

    let mut trail = Vec::with_capacity(ancestors);
    let mut prefix = config.root.clone();
    for comp in &comps[..ancestors] {
        prefix.push(comp);
        let buf = FileStat::lstat(&prefix)?;
        trail.push(ino_hash(buf.ino32()));
    }

    Ok((
        FileHandle::with_trail(stat.dev32(), stat.ino32(), gen, trail),
        stat,
    ))
}
