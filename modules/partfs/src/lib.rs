//! A FAT16-style file system contained in a single 4 MiB backing file.
//!
//! The partition holds a boot block, an eight-cluster FAT, a single root
//! directory cluster, and a data area, all addressed in 1024-byte
//! clusters. [`FatVolume`] binds a cluster device to the in-memory FAT
//! mirror and implements the operations surface defined in `partvfs`.

pub mod alloc;
pub mod block;
pub mod dir;
pub mod fat;
pub mod layout;
pub mod memdisk;
pub mod path;
pub mod volume;

pub use block::{ClusterDevice, FileDisk};
pub use memdisk::MemDisk;
pub use partvfs::{EntryKind, FsError, FsOps, FsResult, ListEntry};
pub use volume::FatVolume;
