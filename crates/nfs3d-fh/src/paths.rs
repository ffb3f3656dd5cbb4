//! Bookkeeping for export-rooted path strings.
//!
//! The core speaks rooted paths: `/` is the export root and `/a/b` names
//! `<root>/a/b` on the host filesystem. Resolved paths come back without
//! the leading slash (`a/b`), the root itself as `/`.

use std::path::{Path, PathBuf};

/// Host filesystem location of a rooted path.
pub(crate) fn real_path(root: &Path, rooted: &str) -> PathBuf {
    let rel = rooted.trim_start_matches('/');
    if rel.is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// Canonical stored form: no leading slash, `/` for the root itself.
pub(crate) fn canonical(rooted: &str) -> String {
    let rel = rooted.trim_start_matches('/');
    if rel.is_empty() {
        String::from("/")
    } else {
        String::from(rel)
    }
}

/// Path components of a rooted path, root excluded.
pub(crate) fn components(rooted: &str) -> Vec<&str> {
    rooted.split('/').filter(|c| !c.is_empty()).collect()
}
