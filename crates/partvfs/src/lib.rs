//! Shared types for the partition filesystem: the error taxonomy, entry
//! kinds, listing records, and the operations surface consumed by
//! shell-like collaborators.

use std::fmt;
use std::io;

/// Maximum usable name length; the on-disk field is one byte longer to
/// hold the NUL terminator.
pub const MAX_NAME_LEN: usize = 17;

/// Errors returned by filesystem operations.
#[derive(Debug)]
pub enum FsError {
    /// Path is empty, relative, or names no final component.
    InvalidPath,
    /// A component exceeds the usable name budget.
    NameTooLong,
    /// A path component does not exist.
    NotFound,
    /// A directory was expected.
    NotDir,
    /// A regular file was expected.
    NotFile,
    /// Every slot of the parent directory is occupied.
    DirFull,
    /// No free data cluster remains.
    NoSpace,
    /// The directory still contains entries.
    NotEmpty,
    /// The root directory cannot be removed.
    RootProtected,
    /// The FAT mirror has not been loaded.
    NotLoaded,
    /// A cluster or chain access is outside the partition bounds.
    OutOfRange,
    /// A cluster chain is malformed on a read path.
    Corrupt,
    /// Underlying I/O failure.
    Io(io::Error),
}

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::InvalidPath => write!(f, "invalid path"),
            FsError::NameTooLong => write!(f, "name exceeds {} bytes", MAX_NAME_LEN),
            FsError::NotFound => write!(f, "no such file or directory"),
            FsError::NotDir => write!(f, "not a directory"),
            FsError::NotFile => write!(f, "not a file"),
            FsError::DirFull => write!(f, "directory is full"),
            FsError::NoSpace => write!(f, "no space left on device"),
            FsError::NotEmpty => write!(f, "directory not empty"),
            FsError::RootProtected => write!(f, "root directory cannot be removed"),
            FsError::NotLoaded => write!(f, "file allocation table not loaded"),
            FsError::OutOfRange => write!(f, "cluster access out of range"),
            FsError::Corrupt => write!(f, "corrupt cluster chain"),
            FsError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        FsError::Io(err)
    }
}

/// Kind of a directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One record of a directory listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListEntry {
    /// Entry kind.
    pub kind: EntryKind,
    /// Byte size; directories report 0.
    pub size: u32,
    name: [u8; MAX_NAME_LEN],
    name_len: u8,
}

impl ListEntry {
    /// Build a record; fails when the name exceeds the budget.
    pub fn new(kind: EntryKind, size: u32, name: &[u8]) -> FsResult<Self> {
        if name.len() > MAX_NAME_LEN {
            return Err(FsError::NameTooLong);
        }
        let mut buf = [0u8; MAX_NAME_LEN];
        buf[..name.len()].copy_from_slice(name);
        Ok(Self {
            kind,
            size,
            name: buf,
            name_len: name.len() as u8,
        })
    }

    /// The entry name as a byte slice.
    pub fn name(&self) -> &[u8] {
        &self.name[..self.name_len as usize]
    }
}

/// Filesystem operations exposed to external collaborators.
///
/// Every mutation persists its on-disk changes before returning. All
/// operations except `format` and `load` fail with [`FsError::NotLoaded`]
/// until the FAT mirror has been read from disk.
pub trait FsOps {
    /// Re-initialize the partition. The mirror must be re-loaded afterwards.
    fn format(&mut self) -> FsResult<()>;
    /// Read the FAT region from disk into the in-memory mirror.
    fn load(&mut self) -> FsResult<()>;
    /// List a directory (one record per occupied slot, in slot order) or a
    /// single file.
    fn ls(&mut self, path: &str) -> FsResult<Vec<ListEntry>>;
    /// Create an empty directory.
    fn mkdir(&mut self, path: &str) -> FsResult<()>;
    /// Create an empty regular file.
    fn create(&mut self, path: &str) -> FsResult<()>;
    /// Remove a file or an empty directory.
    fn unlink(&mut self, path: &str) -> FsResult<()>;
    /// Stream a file's content into `sink`; returns the bytes emitted.
    fn read_to(&mut self, path: &str, sink: &mut dyn io::Write) -> FsResult<u32>;
    /// Replace a file's content.
    fn write(&mut self, path: &str, data: &[u8]) -> FsResult<()>;
    /// Extend a file's content in place.
    fn append(&mut self, path: &str, data: &[u8]) -> FsResult<()>;
}
