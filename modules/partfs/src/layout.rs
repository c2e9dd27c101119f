//! Fixed partition geometry.
//!
//! The partition is a single 4 MiB file: one boot cluster, eight FAT
//! clusters, one root directory cluster, and 4086 data clusters.

/// Bytes per cluster, the unit of allocation and of device I/O.
pub const CLUSTER_SIZE: usize = 1024;
/// Total clusters in the partition.
pub const CLUSTER_COUNT: usize = 4096;
/// Backing file length in bytes.
pub const PARTITION_SIZE: u64 = (CLUSTER_SIZE * CLUSTER_COUNT) as u64;

/// The boot block, filled with [`BOOT_FILL`] at format time.
pub const BOOT_CLUSTER: u16 = 0;
/// First cluster of the FAT region.
pub const FAT_START_CLUSTER: u16 = 1;
/// Clusters occupied by the FAT region.
pub const FAT_CLUSTER_COUNT: u16 = 8;
/// The single root directory cluster.
pub const ROOT_CLUSTER: u16 = 9;
/// First cluster of the data area.
pub const DATA_START_CLUSTER: u16 = 10;
/// Clusters available for file data and nested directories.
pub const DATA_CLUSTER_COUNT: usize = CLUSTER_COUNT - DATA_START_CLUSTER as usize;

/// Byte written across the boot cluster at format time.
pub const BOOT_FILL: u8 = 0xBB;

/// Default backing file, relative to the working directory.
pub const PARTITION_NAME: &str = "fat.part";
