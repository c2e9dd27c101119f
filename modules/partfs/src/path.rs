//! Absolute path splitting and directory-tree resolution.

use partvfs::{FsError, FsResult, MAX_NAME_LEN};

use crate::block::ClusterDevice;
use crate::dir::{DirBlock, DirEntry, ATTR_DIR, NAME_FIELD_LEN};
use crate::layout::ROOT_CLUSTER;

/// Result of resolving an absolute path.
///
/// On a miss, `found` is false and `parent_cluster` names the directory
/// being scanned when the walk stopped; the remaining entry fields are
/// meaningless. For the root path the result is synthesized and the
/// parent/slot fields are not usable for mutation.
#[derive(Clone, Copy, Debug)]
pub struct Lookup {
    pub found: bool,
    /// Last component searched for, NUL-terminated.
    pub name: [u8; NAME_FIELD_LEN],
    /// Directory cluster holding the final entry.
    pub parent_cluster: u16,
    /// First cluster of the found entry.
    pub entry_cluster: u16,
    /// Slot index of the final entry within its parent (0..31).
    pub slot: usize,
    /// Copy of the found entry.
    pub entry: DirEntry,
}

impl Lookup {
    fn root() -> Self {
        let mut name = [0u8; NAME_FIELD_LEN];
        name[0] = b'/';
        Self {
            found: true,
            name,
            parent_cluster: ROOT_CLUSTER,
            entry_cluster: ROOT_CLUSTER,
            slot: 0,
            entry: DirEntry {
                name,
                attribute: ATTR_DIR,
                first_cluster: ROOT_CLUSTER,
                size: 0,
            },
        }
    }

    fn miss(parent_cluster: u16, component: &[u8]) -> Self {
        let mut name = [0u8; NAME_FIELD_LEN];
        let len = component.len().min(MAX_NAME_LEN);
        name[..len].copy_from_slice(&component[..len]);
        Self {
            found: false,
            name,
            parent_cluster,
            entry_cluster: 0,
            slot: 0,
            entry: DirEntry::empty(),
        }
    }
}

/// Split an absolute path into `(parent_path, final_name)`.
///
/// The root itself is not a valid creation or removal target here.
pub fn split_path(path: &str) -> FsResult<(&str, &str)> {
    if !path.starts_with('/') || path == "/" {
        return Err(FsError::InvalidPath);
    }
    let split = path.rfind('/').unwrap_or(0);
    let (parent, name) = path.split_at(split);
    let name = &name[1..];
    if name.is_empty() {
        return Err(FsError::InvalidPath);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FsError::NameTooLong);
    }
    let parent = if parent.is_empty() { "/" } else { parent };
    Ok((parent, name))
}

/// Walk an absolute path from the root directory cluster.
///
/// Only I/O failures and a non-directory intermediate component are
/// errors; a missing component is reported through `Lookup::found`.
pub fn resolve<D: ClusterDevice>(device: &mut D, path: &str) -> FsResult<Lookup> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
    if components.peek().is_none() {
        return Ok(Lookup::root());
    }

    let mut result = Lookup::root();
    let mut current = ROOT_CLUSTER;
    let mut current_is_dir = true;
    for component in components {
        if !current_is_dir {
            return Err(FsError::NotDir);
        }
        let block = DirBlock::read_from(device, current)?;
        match block.find(component.as_bytes()) {
            Some((slot, entry)) => {
                result.found = true;
                result.name = entry.name;
                result.parent_cluster = current;
                result.entry_cluster = entry.first_cluster;
                result.slot = slot;
                result.entry = *entry;
                current = entry.first_cluster;
                current_is_dir = entry.is_dir();
            }
            None => return Ok(Lookup::miss(current, component.as_bytes())),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::ATTR_FILE;
    use crate::memdisk::MemDisk;

    // Lay out /docs (cluster 10) containing note.txt (cluster 11).
    fn build_tree() -> MemDisk {
        let mut disk = MemDisk::new();
        let mut root = DirBlock::read_from(&mut disk, ROOT_CLUSTER).unwrap();
        *root.entry_mut(0) = DirEntry::new(b"docs", ATTR_DIR, 10).unwrap();
        root.write_to(&mut disk, ROOT_CLUSTER).unwrap();

        let mut docs = DirBlock::read_from(&mut disk, 10).unwrap();
        let mut note = DirEntry::new(b"note.txt", ATTR_FILE, 11).unwrap();
        note.size = 5;
        *docs.entry_mut(2) = note;
        docs.write_to(&mut disk, 10).unwrap();
        disk
    }

    #[test]
    fn split_rejects_bad_input() {
        assert!(matches!(split_path("/"), Err(FsError::InvalidPath)));
        assert!(matches!(split_path("docs"), Err(FsError::InvalidPath)));
        assert!(matches!(split_path("/docs/"), Err(FsError::InvalidPath)));
        assert!(matches!(
            split_path("/aaaaaaaaaaaaaaaaaa"),
            Err(FsError::NameTooLong)
        ));
    }

    #[test]
    fn split_separates_parent_and_name() {
        assert_eq!(split_path("/docs").unwrap(), ("/", "docs"));
        assert_eq!(split_path("/docs/note.txt").unwrap(), ("/docs", "note.txt"));
        assert_eq!(split_path("/a/b/c").unwrap(), ("/a/b", "c"));
    }

    #[test]
    fn resolves_root() {
        let mut disk = MemDisk::new();
        let hit = resolve(&mut disk, "/").unwrap();
        assert!(hit.found);
        assert!(hit.entry.is_dir());
        assert_eq!(hit.entry_cluster, ROOT_CLUSTER);
        assert_eq!(hit.entry.name_bytes(), b"/");

        // Empty components collapse to the root as well.
        let hit = resolve(&mut disk, "//").unwrap();
        assert!(hit.found);
        assert_eq!(hit.entry_cluster, ROOT_CLUSTER);
    }

    #[test]
    fn resolves_nested_entry() {
        let mut disk = build_tree();
        let hit = resolve(&mut disk, "/docs/note.txt").unwrap();
        assert!(hit.found);
        assert_eq!(hit.parent_cluster, 10);
        assert_eq!(hit.slot, 2);
        assert_eq!(hit.entry_cluster, 11);
        assert_eq!(hit.entry.size, 5);
        assert!(!hit.entry.is_dir());
    }

    #[test]
    fn reports_miss_with_last_parent() {
        let mut disk = build_tree();
        let hit = resolve(&mut disk, "/docs/absent").unwrap();
        assert!(!hit.found);
        assert_eq!(hit.parent_cluster, 10);
        assert_eq!(&hit.name[..6], b"absent");

        let hit = resolve(&mut disk, "/nope/deeper").unwrap();
        assert!(!hit.found);
        assert_eq!(hit.parent_cluster, ROOT_CLUSTER);
    }

    #[test]
    fn descending_into_a_file_is_not_a_directory() {
        let mut disk = build_tree();
        assert!(matches!(
            resolve(&mut disk, "/docs/note.txt/x"),
            Err(FsError::NotDir)
        ));
    }

    #[test]
    fn rejects_relative_paths() {
        let mut disk = MemDisk::new();
        assert!(matches!(resolve(&mut disk, "docs"), Err(FsError::InvalidPath)));
        assert!(matches!(resolve(&mut disk, ""), Err(FsError::InvalidPath)));
    }
}
