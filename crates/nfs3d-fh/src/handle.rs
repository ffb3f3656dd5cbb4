use crate::attr::FileStat;
use crate::error::{FhError, Result};

/// Bytes of the fixed handle header: dev (4) + ino (4) + gen (4) + len (1).
pub const FH_HEADER_LEN: usize = 13;

/// Default cap on the directory-trail length.
pub const FH_MAX_DEPTH: usize = 64;

/// 8-bit hash of an inode number stored in the directory trail.
///
/// Handles are persistent across restarts, so every reader must agree on
/// this exact function.
pub fn ino_hash(ino: u32) -> u8 {
    ino.wrapping_add(3u32.wrapping_mul(ino >> 8))
        .wrapping_add(5u32.wrapping_mul(ino >> 16)) as u8
}

/// An NFS filehandle: the object's identity plus a directory-trail hint.
///
/// The trail holds one 8-bit inode hash per ancestor directory of the
/// object, root excluded, object excluded, parent last. The resolver uses
/// it to prune its scan; a hash collision costs a wasted descent, never a
/// wrong answer, because the final match is on `(dev, ino)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub dev: u32,
    pub ino: u32,
    pub gen: u32,
    trail: Vec<u8>,
}

/// The canonical invalid handle: all-zero identity, empty trail.
pub const INVALID_HANDLE: FileHandle = FileHandle {
    dev: 0,
    ino: 0,
    gen: 0,
    trail: Vec::new(),
};

impl FileHandle {
    /// Handle with the given identity and an empty trail (a root handle
    /// when the identity is the export root's).
    pub fn new(dev: u32, ino: u32, gen: u32) -> FileHandle {
        FileHandle {
            dev,
            ino,
            gen,
            trail: Vec::new(),
        }
    }

    pub(crate) fn with_trail(dev: u32, ino: u32, gen: u32, trail: Vec<u8>) -> FileHandle {
        FileHandle {
            dev,
            ino,
            gen,
            trail,
        }
    }

    /// A handle is semantically valid iff its device and inode are nonzero.
    pub fn is_valid(&self) -> bool {
        self.dev != 0 && self.ino != 0
    }

    /// The inode-hash trail, parent last.
    pub fn trail(&self) -> &[u8] {
        &self.trail
    }

    /// Number of meaningful trail entries.
    pub fn depth(&self) -> usize {
        self.trail.len()
    }

    /// Exact serialized length of this handle on the wire.
    pub fn wire_len(&self) -> usize {
        FH_HEADER_LEN + self.trail.len()
    }

    /// Whether `stat` describes the object this handle identifies.
    pub fn matches(&self, stat: &FileStat) -> bool {
        self.dev == stat.dev32() && self.ino == stat.ino32()
    }

    /// Serialize to the packed little-endian wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        out.extend_from_slice(&self.dev.to_le_bytes());
        out.extend_from_slice(&self.ino.to_le_bytes());
        out.extend_from_slice(&self.gen.to_le_bytes());
        out.push(self.trail.len() as u8);
        out.extend_from_slice(&self.trail);
        out
    }

    /// Parse a wire handle. Rejects only structural problems; a parsed
    /// handle may still be semantically invalid (zero identity) or fail to
    /// resolve.
    pub fn from_bytes(bytes: &[u8]) -> Result<FileHandle> {
        if !validate(bytes) {
            return Err(FhError::InvalidHandle { len: bytes.len() });
        }
        let dev = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let ino = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let gen = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let trail = bytes[FH_HEADER_LEN..].to_vec();
        Ok(FileHandle {
            dev,
            ino,
            gen,
            trail,
        })
    }

    /// Derive a child handle: the child's identity, with this handle's
    /// object appended to the trail as the new last parent.
    ///
    /// Fails with `TooDeep` when the trail is already at `max_depth`.
    pub fn extend(&self, dev: u32, ino: u32, gen: u32, max_depth: usize) -> Result<FileHandle> {
        if self.trail.len() >= max_depth {
            return Err(FhError::TooDeep {
                depth: self.trail.len() + 1,
                limit: max_depth,
            });
        }
        let mut trail = Vec::with_capacity(self.trail.len() + 1);
        trail.extend_from_slice(&self.trail);
        trail.push(ino_hash(self.ino));
        Ok(FileHandle {
            dev,
            ino,
            gen,
            trail,
        })
    }
}

/// Structural validation of wire handle bytes.
///
/// Accepts iff the buffer is at least a header long and its length equals
/// the declared `13 + len`. Semantic checks belong to the resolver.
pub fn validate(bytes: &[u8]) -> bool {
    if bytes.len() < FH_HEADER_LEN {
        return false;
    }
    bytes.len() == FH_HEADER_LEN + bytes[12] as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ino_hash_small_values() {
        // below 256 the hash is the inode itself
        assert_eq!(ino_hash(10), 10);
        assert_eq!(ino_hash(255), 255);
    }

    #[test]
    fn test_ino_hash_folds_high_bits() {
        // h(n) = (n + 3*(n>>8) + 5*(n>>16)) mod 256
        let n: u32 = 0x0001_0203;
        let expected = ((0x0001_0203u64 + 3 * 0x0102 + 5 * 0x0001) % 256) as u8;
        assert_eq!(ino_hash(n), expected);
    }

    #[test]
    fn test_invalid_handle_is_invalid() {
        assert!(!INVALID_HANDLE.is_valid());
    }

    #[test]
    fn test_validity_requires_both_dev_and_ino() {
        assert!(FileHandle::new(1, 30, 0).is_valid());
        assert!(!FileHandle::new(0, 30, 0).is_valid());
        assert!(!FileHandle::new(1, 0, 0).is_valid());
    }

    #[test]
    fn test_wire_roundtrip() {
        let fh = FileHandle::with_trail(1, 30, 7, vec![ino_hash(10), ino_hash(20)]);
        let bytes = fh.to_bytes();
        assert_eq!(bytes.len(), FH_HEADER_LEN + 2);
        let back = FileHandle::from_bytes(&bytes).unwrap();
        assert_eq!(back, fh);
    }

    #[test]
    fn test_wire_layout_is_little_endian() {
        let fh = FileHandle::new(0x0102_0304, 0x0506_0708, 0x090a_0b0c);
        let bytes = fh.to_bytes();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&bytes[4..8], &[0x08, 0x07, 0x06, 0x05]);
        assert_eq!(&bytes[8..12], &[0x0c, 0x0b, 0x0a, 0x09]);
        assert_eq!(bytes[12], 0);
    }

    #[test]
    fn test_validate_rejects_short_buffers() {
        assert!(!validate(&[]));
        assert!(!validate(&[0u8; 12]));
        assert!(validate(&[0u8; 13]));
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let mut bytes = vec![0u8; 15];
        bytes[12] = 2;
        assert!(validate(&bytes));
        bytes[12] = 3;
        assert!(!validate(&bytes));
        bytes.push(0);
        assert!(validate(&bytes));
    }

    #[test]
    fn test_from_bytes_rejects_truncated() {
        let fh = FileHandle::with_trail(1, 2, 3, vec![4, 5, 6]);
        let mut bytes = fh.to_bytes();
        bytes.pop();
        assert!(matches!(
            FileHandle::from_bytes(&bytes),
            Err(FhError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn test_extend_appends_parent_hash() {
        let parent = FileHandle::with_trail(1, 20, 0, vec![ino_hash(10)]);
        let child = parent.extend(1, 30, 9, FH_MAX_DEPTH).unwrap();

        assert_eq!(child.dev, 1);
        assert_eq!(child.ino, 30);
        assert_eq!(child.gen, 9);
        assert_eq!(child.depth(), 2);
        assert_eq!(child.trail(), &[ino_hash(10), ino_hash(20)]);
    }

    #[test]
    fn test_extend_at_max_depth_fails() {
        let parent = FileHandle::with_trail(1, 20, 0, vec![0u8; 4]);
        let res = parent.extend(1, 30, 0, 4);
        assert!(matches!(res, Err(FhError::TooDeep { depth: 5, limit: 4 })));
    }

    #[test]
    fn test_extend_preserves_parent_trail_prefix() {
        let parent = FileHandle::with_trail(1, 40, 0, vec![1, 2, 3]);
        let child = parent.extend(1, 50, 0, FH_MAX_DEPTH).unwrap();
        assert_eq!(&child.trail()[..3], parent.trail());
    }
}
