use thiserror::Error;

/// NFSv3 status code for a stale filehandle.
pub const NFS3ERR_STALE: u32 = 70;
/// NFSv3 status code for a generic I/O failure.
pub const NFS3ERR_IO: u32 = 5;
/// NFSv3 status code for a missing object.
pub const NFS3ERR_NOENT: u32 = 2;
/// NFSv3 status code for a permission failure.
pub const NFS3ERR_ACCES: u32 = 13;
/// NFSv3 status code for "not a directory".
pub const NFS3ERR_NOTDIR: u32 = 20;
/// NFSv3 status code for an over-long name or path.
pub const NFS3ERR_NAMETOOLONG: u32 = 63;

#[derive(Debug, Error)]
pub enum FhError {
    #[error("Invalid filehandle: {len} bytes on the wire")]
    InvalidHandle { len: usize },

    #[error("No object with dev {dev}, inode {ino} under the export root")]
    Unresolved { dev: u32, ino: u32 },

    #[error("Not a directory: {path}")]
    NotDirectory { path: String },

    #[error("Object mode {mode:#o} does not satisfy required bits {mask:#o}")]
    WrongType { mode: u32, mask: u32 },

    #[error("Path depth {depth} exceeds filehandle limit {limit}")]
    TooDeep { depth: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FhError>;

impl FhError {
    /// Translate into the NFSv3 status the embedding PROC should reply with.
    pub fn to_nfs_status(&self) -> u32 {
        use libc::*;
        match self {
            FhError::InvalidHandle { .. } => NFS3ERR_STALE,
            FhError::Unresolved { .. } => NFS3ERR_STALE,
            FhError::NotDirectory { .. } => NFS3ERR_NOTDIR,
            FhError::WrongType { .. } => NFS3ERR_STALE,
            FhError::TooDeep { .. } => NFS3ERR_NAMETOOLONG,
            FhError::Io(e) => match e.raw_os_error() {
                Some(ENOENT) => NFS3ERR_NOENT,
                Some(EACCES) => NFS3ERR_ACCES,
                Some(ENOTDIR) => NFS3ERR_NOTDIR,
                Some(ENAMETOOLONG) => NFS3ERR_NAMETOOLONG,
                _ => NFS3ERR_IO,
            },
        }
    }
}
