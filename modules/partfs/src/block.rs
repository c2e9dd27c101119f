//! Cluster-granular device abstraction and the backing-file implementation.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use partvfs::{FsError, FsResult};

use crate::layout::{CLUSTER_COUNT, CLUSTER_SIZE, PARTITION_SIZE};

/// Abstract cluster device interface.
///
/// All transfers move a full cluster at byte offset `index * CLUSTER_SIZE`.
pub trait ClusterDevice {
    /// Read the cluster at `index` into the provided buffer.
    fn read_cluster(&mut self, index: u16, buf: &mut [u8]) -> FsResult<()>;
    /// Write the cluster at `index` from the provided buffer.
    fn write_cluster(&mut self, index: u16, buf: &[u8]) -> FsResult<()>;
    /// Truncate the backing store and re-extend it, zero-filled, to the
    /// full partition size.
    fn reset(&mut self) -> FsResult<()>;
    /// Flush buffered writes to durable storage.
    fn flush(&mut self) -> FsResult<()>;
}

fn check_access(index: u16, len: usize) -> FsResult<()> {
    if index as usize >= CLUSTER_COUNT || len != CLUSTER_SIZE {
        return Err(FsError::OutOfRange);
    }
    Ok(())
}

/// A partition stored in a regular file.
pub struct FileDisk {
    file: File,
}

impl FileDisk {
    /// Create (or truncate) a partition file sized to the full partition.
    pub fn create<P: AsRef<Path>>(path: P) -> FsResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(PARTITION_SIZE)?;
        Ok(Self { file })
    }

    /// Open an existing partition file read-write.
    pub fn open<P: AsRef<Path>>(path: P) -> FsResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }

    /// Length of the backing file in bytes.
    pub fn len(&self) -> FsResult<u64> {
        Ok(self.file.metadata()?.len())
    }
}

impl ClusterDevice for FileDisk {
    fn read_cluster(&mut self, index: u16, buf: &mut [u8]) -> FsResult<()> {
        check_access(index, buf.len())?;
        self.file
            .seek(SeekFrom::Start(index as u64 * CLUSTER_SIZE as u64))?;
        // read_exact surfaces a short read as UnexpectedEof.
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_cluster(&mut self, index: u16, buf: &[u8]) -> FsResult<()> {
        check_access(index, buf.len())?;
        self.file
            .seek(SeekFrom::Start(index as u64 * CLUSTER_SIZE as u64))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn reset(&mut self) -> FsResult<()> {
        // Shrink to zero first so stale data clusters do not survive a
        // re-format; the extension is zero-filled by the OS.
        self.file.set_len(0)?;
        self.file.set_len(PARTITION_SIZE)?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn flush(&mut self) -> FsResult<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
