use crate::attr::FileStat;
use std::os::unix::io::RawFd;
use std::path::Path;

/// Source of inode generation numbers.
///
/// A generation counter distinguishes a recycled inode from the original
/// object a handle was minted for. The probe is advisory: it never fails
/// hard, and 0 means "no discriminator available". Backends are selected at
/// startup by [`default_probe`].
pub trait GenerationProbe: Send {
    /// Obtain a generation number for the object described by `stat`.
    ///
    /// `fd` may carry an already-open descriptor to the object so the probe
    /// can skip opening it; `path` locates the object otherwise.
    fn generation(&self, stat: &FileStat, fd: Option<RawFd>, path: &Path) -> u32;
}

/// Backend for platforms whose stat structure carries a generation field.
pub struct NativeStatProbe;

impl GenerationProbe for NativeStatProbe {
    fn generation(&self, stat: &FileStat, _fd: Option<RawFd>, _path: &Path) -> u32 {
        stat.gen
    }
}

/// Linux ext-family backend: `FS_IOC_GETVERSION` on an open descriptor.
///
/// Only regular files and directories are probed; anything else, and any
/// open or ioctl failure, yields 0.
#[cfg(target_os = "linux")]
pub struct ExtVersionProbe;

#[cfg(target_os = "linux")]
impl GenerationProbe for ExtVersionProbe {
    fn generation(&self, stat: &FileStat, fd: Option<RawFd>, path: &Path) -> u32 {
        if !stat.is_regular() && !stat.is_dir() {
            return 0;
        }

        match fd {
            Some(fd) => ioctl_getversion(fd).unwrap_or(0),
            None => match std::fs::File::open(path) {
                Ok(file) => {
                    use std::os::unix::io::AsRawFd;
                    ioctl_getversion(file.as_raw_fd()).unwrap_or(0)
                }
                Err(_) => 0,
            },
        }
    }
}

#[cfg(target_os = "linux")]
fn ioctl_getversion(fd: RawFd) -> Option<u32> {
    let mut version: libc::c_long = 0;
    let res = unsafe { libc::ioctl(fd, libc::FS_IOC_GETVERSION, &mut version) };
    if res == -1 {
        None
    } else {
        Some(version as u32)
    }
}

/// Fallback backend: the inode number stands in for the generation.
///
/// Acceptable because the handle already carries `ino` and the directory
/// trail; the generation is only an extra discriminator.
pub struct InodeProbe;

impl GenerationProbe for InodeProbe {
    fn generation(&self, stat: &FileStat, _fd: Option<RawFd>, _path: &Path) -> u32 {
        stat.ino32()
    }
}

/// Pick the best probe backend for the running platform.
pub fn default_probe() -> Box<dyn GenerationProbe> {
    #[cfg(target_os = "linux")]
    {
        Box::new(ExtVersionProbe)
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(NativeStatProbe)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Box::new(InodeProbe)
    }
}
