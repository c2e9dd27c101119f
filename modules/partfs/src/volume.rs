//! The mounted volume: state machine, format, and the mutation engine.
//!
//! Every mutation writes the affected directory clusters first and then
//! persists the whole FAT mirror, so a successful operation is fully
//! visible on disk when it returns. Parent directories are re-read from
//! disk immediately before modification.

use std::io;

use log::{debug, info};
use partvfs::{EntryKind, FsError, FsOps, FsResult, ListEntry};

use crate::alloc::{find_free_cluster, find_free_dir_entry, free_chain};
use crate::block::ClusterDevice;
use crate::dir::{DirBlock, DirEntry, ATTR_DIR, ATTR_FILE};
use crate::fat::{FatMirror, FAT_EOF};
use crate::layout::{BOOT_CLUSTER, BOOT_FILL, CLUSTER_SIZE, PARTITION_SIZE, ROOT_CLUSTER};
use crate::path::{resolve, split_path};

/// A partition bound to a cluster device.
///
/// The volume is unloaded until [`FsOps::load`] succeeds; `format` returns
/// it to the unloaded state. Every other operation fails with
/// [`FsError::NotLoaded`] while no mirror is held.
pub struct FatVolume<D: ClusterDevice> {
    device: D,
    fat: Option<FatMirror>,
}

impl<D: ClusterDevice> FatVolume<D> {
    pub fn new(device: D) -> Self {
        Self { device, fat: None }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Read a whole file into memory.
    pub fn read(&mut self, path: &str) -> FsResult<Vec<u8>> {
        let mut out = Vec::new();
        self.read_to(path, &mut out)?;
        Ok(out)
    }

    fn require_loaded(&self) -> FsResult<()> {
        if self.fat.is_some() {
            Ok(())
        } else {
            Err(FsError::NotLoaded)
        }
    }

    fn create_entry(&mut self, path: &str, attribute: u8) -> FsResult<()> {
        self.require_loaded()?;
        let (parent_path, name) = split_path(path)?;
        let parent = resolve(&mut self.device, parent_path)?;
        if !parent.found {
            return Err(FsError::NotFound);
        }
        if !parent.entry.is_dir() {
            return Err(FsError::NotDir);
        }
        let (mut block, slot) = find_free_dir_entry(&mut self.device, parent.entry_cluster)?;
        let slot = slot.ok_or(FsError::DirFull)?;
        let fat = self.fat.as_mut().ok_or(FsError::NotLoaded)?;
        let new_cluster = find_free_cluster(fat).ok_or(FsError::NoSpace)?;

        *block.entry_mut(slot) = DirEntry::new(name.as_bytes(), attribute, new_cluster)?;
        fat.set(new_cluster, FAT_EOF);
        if attribute == ATTR_DIR {
            // A new directory starts out with 32 empty slots; a new file's
            // cluster stays untouched because size 0 means nothing is read.
            self.device.write_cluster(new_cluster, &[0u8; CLUSTER_SIZE])?;
        }
        block.write_to(&mut self.device, parent.entry_cluster)?;
        fat.persist(&mut self.device)?;
        self.device.flush()?;
        Ok(())
    }
}

impl<D: ClusterDevice> FsOps for FatVolume<D> {
    fn format(&mut self) -> FsResult<()> {
        info!("formatting partition ({} bytes)", PARTITION_SIZE);
        self.device.reset()?;
        let fat = FatMirror::formatted();
        let mut buf = [BOOT_FILL; CLUSTER_SIZE];
        self.device.write_cluster(BOOT_CLUSTER, &buf)?;
        fat.persist(&mut self.device)?;
        buf.fill(0);
        self.device.write_cluster(ROOT_CLUSTER, &buf)?;
        self.device.flush()?;
        // The data area is already zero from the device reset. The mirror
        // counts as unloaded until the caller invokes load again.
        self.fat = None;
        Ok(())
    }

    fn load(&mut self) -> FsResult<()> {
        let fat = FatMirror::load(&mut self.device)?;
        self.fat = Some(fat);
        info!("FAT mirror loaded");
        Ok(())
    }

    fn ls(&mut self, path: &str) -> FsResult<Vec<ListEntry>> {
        self.require_loaded()?;
        let hit = resolve(&mut self.device, path)?;
        if !hit.found {
            return Err(FsError::NotFound);
        }
        if !hit.entry.is_dir() {
            let entry = ListEntry::new(EntryKind::File, hit.entry.size, hit.entry.name_bytes())?;
            return Ok(vec![entry]);
        }
        let block = DirBlock::read_from(&mut self.device, hit.entry_cluster)?;
        let mut listing = Vec::new();
        for (_, entry) in block.occupied() {
            listing.push(ListEntry::new(entry.kind(), entry.size, entry.name_bytes())?);
        }
        Ok(listing)
    }

    fn mkdir(&mut self, path: &str) -> FsResult<()> {
        self.create_entry(path, ATTR_DIR)?;
        debug!("created directory {}", path);
        Ok(())
    }

    fn create(&mut self, path: &str) -> FsResult<()> {
        self.create_entry(path, ATTR_FILE)?;
        debug!("created file {}", path);
        Ok(())
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        self.require_loaded()?;
        let hit = resolve(&mut self.device, path)?;
        if !hit.found {
            return Err(FsError::NotFound);
        }
        if hit.entry_cluster == ROOT_CLUSTER {
            return Err(FsError::RootProtected);
        }
        if hit.entry.is_dir() {
            let block = DirBlock::read_from(&mut self.device, hit.entry_cluster)?;
            if block.occupied().next().is_some() {
                return Err(FsError::NotEmpty);
            }
        }
        let fat = self.fat.as_mut().ok_or(FsError::NotLoaded)?;
        free_chain(fat, hit.entry.first_cluster);
        let mut parent = DirBlock::read_from(&mut self.device, hit.parent_cluster)?;
        parent.clear_slot(hit.slot);
        parent.write_to(&mut self.device, hit.parent_cluster)?;
        fat.persist(&mut self.device)?;
        self.device.flush()?;
        debug!("removed {}", path);
        Ok(())
    }

    fn read_to(&mut self, path: &str, sink: &mut dyn io::Write) -> FsResult<u32> {
        self.require_loaded()?;
        let hit = resolve(&mut self.device, path)?;
        if !hit.found {
            return Err(FsError::NotFound);
        }
        if hit.entry.is_dir() {
            return Err(FsError::NotFile);
        }
        let fat = self.fat.as_ref().ok_or(FsError::NotLoaded)?;
        let mut remaining = hit.entry.size as usize;
        let mut cluster = hit.entry.first_cluster;
        let mut buf = [0u8; CLUSTER_SIZE];
        let mut emitted = 0u32;
        while remaining > 0 {
            self.device.read_cluster(cluster, &mut buf)?;
            let take = remaining.min(CLUSTER_SIZE);
            sink.write_all(&buf[..take])?;
            emitted += take as u32;
            remaining -= take;
            if remaining == 0 {
                break;
            }
            match fat.next_in_chain(cluster)? {
                Some(next) => cluster = next,
                // chain ended before the size was exhausted
                None => break,
            }
        }
        Ok(emitted)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> FsResult<()> {
        self.require_loaded()?;
        let hit = resolve(&mut self.device, path)?;
        if !hit.found {
            return Err(FsError::NotFound);
        }
        if hit.entry.is_dir() {
            return Err(FsError::NotFile);
        }
        let fat = self.fat.as_mut().ok_or(FsError::NotLoaded)?;
        free_chain(fat, hit.entry.first_cluster);

        let first_cluster = if data.is_empty() {
            // A zero-byte file still owns one end-of-chain cluster.
            let cluster = find_free_cluster(fat).ok_or(FsError::NoSpace)?;
            fat.set(cluster, FAT_EOF);
            cluster
        } else {
            let mut first = 0u16;
            let mut prev = 0u16;
            for chunk in data.chunks(CLUSTER_SIZE) {
                let cluster = match find_free_cluster(fat) {
                    Some(cluster) => cluster,
                    None => {
                        // roll the partial chain back before reporting
                        if first != 0 {
                            free_chain(fat, first);
                        }
                        return Err(FsError::NoSpace);
                    }
                };
                if first == 0 {
                    first = cluster;
                } else {
                    fat.set(prev, cluster);
                }
                fat.set(cluster, FAT_EOF);
                let mut buf = [0u8; CLUSTER_SIZE];
                buf[..chunk.len()].copy_from_slice(chunk);
                self.device.write_cluster(cluster, &buf)?;
                prev = cluster;
            }
            first
        };

        let mut parent = DirBlock::read_from(&mut self.device, hit.parent_cluster)?;
        let entry = parent.entry_mut(hit.slot);
        entry.first_cluster = first_cluster;
        entry.size = data.len() as u32;
        parent.write_to(&mut self.device, hit.parent_cluster)?;
        fat.persist(&mut self.device)?;
        self.device.flush()?;
        debug!("wrote {} bytes to {}", data.len(), path);
        Ok(())
    }

    fn append(&mut self, path: &str, data: &[u8]) -> FsResult<()> {
        self.require_loaded()?;
        let hit = resolve(&mut self.device, path)?;
        if !hit.found {
            return Err(FsError::NotFound);
        }
        if hit.entry.is_dir() {
            return Err(FsError::NotFile);
        }
        if data.is_empty() {
            return Ok(());
        }
        let fat = self.fat.as_mut().ok_or(FsError::NotLoaded)?;
        let old_size = hit.entry.size as usize;

        let mut cluster = hit.entry.first_cluster;
        if old_size > 0 {
            cluster = fat.tail(cluster)?;
        }
        let mut buf = [0u8; CLUSTER_SIZE];
        let mut offset = old_size % CLUSTER_SIZE;
        if offset == 0 && old_size > 0 {
            // The tail is exactly full; writing continues in a fresh cluster.
            let next = find_free_cluster(fat).ok_or(FsError::NoSpace)?;
            fat.set(cluster, next);
            fat.set(next, FAT_EOF);
            cluster = next;
        } else {
            self.device.read_cluster(cluster, &mut buf)?;
        }

        let mut input = data;
        loop {
            let take = input.len().min(CLUSTER_SIZE - offset);
            buf[offset..offset + take].copy_from_slice(&input[..take]);
            self.device.write_cluster(cluster, &buf)?;
            input = &input[take..];
            if input.is_empty() {
                break;
            }
            let next = find_free_cluster(fat).ok_or(FsError::NoSpace)?;
            fat.set(cluster, next);
            fat.set(next, FAT_EOF);
            cluster = next;
            offset = 0;
            buf.fill(0);
        }

        // first_cluster is unchanged: even an empty file owns its head
        // cluster from creation time.
        let mut parent = DirBlock::read_from(&mut self.device, hit.parent_cluster)?;
        parent.entry_mut(hit.slot).size = (old_size + data.len()) as u32;
        parent.write_to(&mut self.device, hit.parent_cluster)?;
        fat.persist(&mut self.device)?;
        self.device.flush()?;
        debug!("appended {} bytes to {}", data.len(), path);
        Ok(())
    }
}
