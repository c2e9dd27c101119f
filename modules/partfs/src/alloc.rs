//! Free-space scans and chain release.

use partvfs::FsResult;

use crate::block::ClusterDevice;
use crate::dir::DirBlock;
use crate::fat::{FatMirror, FAT_FREE, FAT_SENTINEL_MIN};
use crate::layout::{CLUSTER_COUNT, DATA_START_CLUSTER};

/// First free data cluster, scanning upward from the start of the data
/// area. `None` means the partition is full.
pub fn find_free_cluster(fat: &FatMirror) -> Option<u16> {
    (DATA_START_CLUSTER..CLUSTER_COUNT as u16).find(|&cluster| fat.get(cluster) == FAT_FREE)
}

/// Read a directory cluster and locate its first empty slot.
pub fn find_free_dir_entry<D: ClusterDevice>(
    device: &mut D,
    dir_cluster: u16,
) -> FsResult<(DirBlock, Option<usize>)> {
    let block = DirBlock::read_from(device, dir_cluster)?;
    let slot = block.first_free_slot();
    Ok((block, slot))
}

/// Mark every cluster of the chain starting at `head` as free.
///
/// Callers guarantee `head` lies in the data area. The walk stops at the
/// first sentinel, free entry, or out-of-range pointer, so system entries
/// are never touched.
pub fn free_chain(fat: &mut FatMirror, head: u16) {
    let mut current = head;
    for _ in 0..CLUSTER_COUNT {
        if current < DATA_START_CLUSTER || current as usize >= CLUSTER_COUNT {
            return;
        }
        let next = fat.get(current);
        fat.set(current, FAT_FREE);
        if next == FAT_FREE || next >= FAT_SENTINEL_MIN {
            return;
        }
        current = next;
    }
}
