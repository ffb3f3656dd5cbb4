//! Filehandle to path resolution by filesystem scan.
//!
//! The cold path behind the path cache: walk the export tree from the
//! root, pruning descents with the handle's inode-hash trail, until an
//! entry's `(dev, ino)` matches the handle. Hash collisions cost a wasted
//! descent, never a wrong answer.

use crate::attr::FileStat;
use crate::config::FhConfig;
use crate::error::{FhError, Result};
use crate::handle::{ino_hash, FileHandle};
use std::path::Path;
use tracing::debug;

/// Resolve a handle into a rooted path and the stat observed for it.
///
/// Entries are visited in the order the host yields them; the first
/// `(dev, ino)` match wins. `lstat` only, so a handle naming a symlink
/// resolves to the link itself. The generation field is not consulted;
/// recycling detection is the caller's business.
pub fn resolve(config: &FhConfig, fh: &FileHandle) -> Result<(String, FileStat)> {
    let root_stat = FileStat::lstat(&config.root)?;
    if fh.depth() == 0 && fh.matches(&root_stat) {
        return Ok((String::from("/"), root_stat));
    }

    match scan(config, fh, 0, &config.root, "") {
        Some(found) => {
            debug!("resolve: dev {} ino {} found at {}", fh.dev, fh.ino, found.0);
            Ok(found)
        }
        None => {
            debug!("resolve: dev {} ino {} not found", fh.dev, fh.ino);
            Err(FhError::Unresolved {
                dev: fh.dev,
                ino: fh.ino,
            })
        }
    }
}

/// Recursive directory scan. `pos` indexes the trail; recursion depth is
/// bounded by the trail length, which the wire format caps at 255.
fn scan(
    config: &FhConfig,
    fh: &FileHandle,
    pos: usize,
    lead_real: &Path,
    lead_rel: &str,
) -> Option<(String, FileStat)> {
    // an unreadable directory means "not found here", not a hard error
    let entries = std::fs::read_dir(lead_real).ok()?;

    for entry in entries.flatten() {
        let name_os = entry.file_name();
        let Some(name) = name_os.to_str() else {
            continue;
        };

        let full_real = lead_real.join(name);
        if full_real.as_os_str().len() >= config.max_path {
            continue;
        }

        // lstat errors leave a zero identity, which can still final-match
        // an all-zero handle and hash-match a zero trail byte
        let stat = FileStat::lstat(&full_real).unwrap_or_default();

        if fh.matches(&stat) {
            return Some((join_rel(lead_rel, name), stat));
        }

        // read_dir never yields "." or ".."
        if pos < fh.depth() && ino_hash(stat.ino32()) == fh.trail()[pos] {
            let rel = join_rel(lead_rel, name);
            if let Some(found) = scan(config, fh, pos + 1, &full_real, &rel) {
                return Some(found);
            }
        }
    }

    None
}

fn join_rel(lead: &str, name: &str) -> String {
    if lead.is_empty() {
        String::from(name)
    } else {
        format!("{}/{}", lead, name)
    }
}
