use serde::Serialize;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Metadata observed for a filesystem object by a single `lstat` call.
///
/// This is the value handed to PROC handlers so they can build a
/// `post_op_attr` reply without issuing a second metadata syscall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStat {
    pub dev: u64,
    pub ino: u64,
    pub mode: u32,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub rdev: u64,
    pub atime_secs: i64,
    pub atime_nsecs: u32,
    pub mtime_secs: i64,
    pub mtime_nsecs: u32,
    pub ctime_secs: i64,
    pub ctime_nsecs: u32,
    /// Native inode generation where the platform stat exposes one, else 0.
    pub gen: u32,
}

impl FileStat {
    /// `lstat` the object at `path`. Symlinks are reported, not followed.
    pub fn lstat(path: &Path) -> io::Result<FileStat> {
        let meta = std::fs::symlink_metadata(path)?;
        Ok(FileStat::from_metadata(&meta))
    }

    fn from_metadata(meta: &std::fs::Metadata) -> FileStat {
        FileStat {
            dev: meta.dev(),
            ino: meta.ino(),
            mode: meta.mode(),
            nlink: meta.nlink(),
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.size(),
            rdev: meta.rdev(),
            atime_secs: meta.atime(),
            atime_nsecs: meta.atime_nsec() as u32,
            mtime_secs: meta.mtime(),
            mtime_nsecs: meta.mtime_nsec() as u32,
            ctime_secs: meta.ctime(),
            ctime_nsecs: meta.ctime_nsec() as u32,
            gen: native_gen(meta),
        }
    }

    /// Device id truncated to the 32 bits carried in a filehandle.
    pub fn dev32(&self) -> u32 {
        self.dev as u32
    }

    /// Inode number truncated to the 32 bits carried in a filehandle.
    pub fn ino32(&self) -> u32 {
        self.ino as u32
    }

    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFDIR as u32
    }

    pub fn is_symlink(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFLNK as u32
    }

    pub fn is_regular(&self) -> bool {
        self.mode & libc::S_IFMT as u32 == libc::S_IFREG as u32
    }
}

#[cfg(target_os = "macos")]
fn native_gen(meta: &std::fs::Metadata) -> u32 {
    use std::os::macos::fs::MetadataExt as _;
    meta.st_gen()
}

#[cfg(not(target_os = "macos"))]
fn native_gen(_meta: &std::fs::Metadata) -> u32 {
    0
}

/// Single-slot memo of the stat observed by the most recent core operation.
///
/// Callers peek at most once, immediately after the call that populated it.
#[derive(Debug, Default)]
pub struct AttrCache {
    slot: Option<FileStat>,
}

impl AttrCache {
    pub fn new() -> Self {
        AttrCache { slot: None }
    }

    pub fn set(&mut self, stat: FileStat) {
        self.slot = Some(stat);
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn peek(&self) -> Option<FileStat> {
        self.slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lstat_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"hello").unwrap();

        let stat = FileStat::lstat(&file).unwrap();
        assert!(stat.is_regular());
        assert!(!stat.is_dir());
        assert_eq!(stat.size, 5);
        assert_ne!(stat.ino, 0);
    }

    #[test]
    fn test_lstat_directory() {
        let dir = TempDir::new().unwrap();
        let stat = FileStat::lstat(dir.path()).unwrap();
        assert!(stat.is_dir());
        assert!(!stat.is_regular());
    }

    #[test]
    fn test_lstat_does_not_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        std::fs::write(&target, b"x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let stat = FileStat::lstat(&link).unwrap();
        assert!(stat.is_symlink());
        assert_ne!(stat.ino, FileStat::lstat(&target).unwrap().ino);
    }

    #[test]
    fn test_lstat_missing_object() {
        let dir = TempDir::new().unwrap();
        let res = FileStat::lstat(&dir.path().join("nope"));
        assert!(res.is_err());
    }

    #[test]
    fn test_attr_cache_set_and_peek() {
        let dir = TempDir::new().unwrap();
        let stat = FileStat::lstat(dir.path()).unwrap();

        let mut cache = AttrCache::new();
        assert!(cache.peek().is_none());

        cache.set(stat);
        assert_eq!(cache.peek(), Some(stat));
        // peek does not consume
        assert_eq!(cache.peek(), Some(stat));
    }

    #[test]
    fn test_attr_cache_invalidate() {
        let dir = TempDir::new().unwrap();
        let stat = FileStat::lstat(dir.path()).unwrap();

        let mut cache = AttrCache::new();
        cache.set(stat);
        cache.invalidate();
        assert!(cache.peek().is_none());
    }
}
