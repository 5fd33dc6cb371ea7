//! The mount table: root path → mounted backend instance (§4.3).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{VfsError, VfsResult};
use crate::filesystem::Filesystem;
use crate::flags::MountFlags;
use crate::fstype::FsType;
use crate::path::{self, best_mount_match};

/// One mounted backend instance, keyed in the table by its root path.
///
/// The backend itself is guarded by its own mutex (locked *after* the
/// table-level lock and *before* any [`crate::disk::Disk`] mutex the
/// backend in turn locks — §9 lock ordering).
pub struct MountPoint {
    pub root: String,
    /// Name of the disk this mount's backend was created against (§3's Data
    /// Model), e.g. `"ram0"` for a mount of partition `"ram0p0"`, or the
    /// whole-disk name for a [`crate::vfs::VirtualFs::mount_raw_disk`] mount.
    pub disk_name: String,
    pub fs_type: FsType,
    pub flags: Mutex<MountFlags>,
    pub fs: Mutex<Box<dyn Filesystem>>,
}

impl MountPoint {
    pub fn new(root: impl Into<String>, disk_name: impl Into<String>, fs_type: FsType, flags: MountFlags, fs: Box<dyn Filesystem>) -> Self {
        MountPoint {
            root: root.into(),
            disk_name: disk_name.into(),
            fs_type,
            flags: Mutex::new(flags),
            fs: Mutex::new(fs),
        }
    }
}

#[derive(Default)]
pub struct MountTable {
    mounts: HashMap<String, Arc<MountPoint>>,
}

impl MountTable {
    pub fn new() -> Self {
        MountTable::default()
    }

    /// Registers `mount_point` under its own root. Fails unconditionally with
    /// [`VfsError::AlreadyExists`] if that root is already occupied — §4.3
    /// step 6 draws no remount exception here (bit 5 of [`MountFlags`] is
    /// reserved API surface, not consulted by the mount table).
    pub fn mount(&mut self, mount_point: MountPoint) -> VfsResult<()> {
        let root = path::normalize(&mount_point.root).to_string_lossy().into_owned();
        if self.mounts.contains_key(&root) {
            return Err(VfsError::AlreadyExists);
        }
        self.mounts.insert(root, Arc::new(mount_point));
        Ok(())
    }

    pub fn unmount(&mut self, root: &str) -> VfsResult<Arc<MountPoint>> {
        let root = path::normalize(root).to_string_lossy().into_owned();
        self.mounts.remove(&root).ok_or(VfsError::NotFound)
    }

    pub fn unmount_all(&mut self) -> Vec<Arc<MountPoint>> {
        self.mounts.drain().map(|(_, mp)| mp).collect()
    }

    pub fn is_mounted(&self, root: &str) -> bool {
        let root = path::normalize(root).to_string_lossy().into_owned();
        self.mounts.contains_key(&root)
    }

    pub fn get(&self, root: &str) -> Option<Arc<MountPoint>> {
        let root = path::normalize(root).to_string_lossy().into_owned();
        self.mounts.get(&root).cloned()
    }

    pub fn roots(&self) -> Vec<String> {
        self.mounts.keys().cloned().collect()
    }

    /// Resolves `abspath` to its mount point and the path remainder the
    /// backend should see, using longest-segment-prefix matching (§10).
    /// Fails with [`VfsError::NotFound`] if no mount claims the path.
    pub fn resolve(&self, abspath: &str) -> VfsResult<(Arc<MountPoint>, String)> {
        let normalized = path::normalize(abspath).to_string_lossy().into_owned();
        let roots: Vec<&str> = self.mounts.keys().map(|s| s.as_str()).collect();
        let best = best_mount_match(roots, &normalized).ok_or(VfsError::NotFound)?;
        let relative = path::strip_root(best, &normalized).to_string();
        let mount_point = self.mounts.get(best).cloned().expect("matched root must exist");
        Ok((mount_point, relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RamFilesystem;

    fn mp(root: &str, flags: MountFlags) -> MountPoint {
        MountPoint::new(root, "ram0", FsType::ext_family(), flags, Box::new(RamFilesystem::new()))
    }

    #[test]
    fn duplicate_mount_without_remount_flag_fails() {
        let mut table = MountTable::new();
        table.mount(mp("/volume", MountFlags::empty())).unwrap();
        let err = table.mount(mp("/volume", MountFlags::empty())).unwrap_err();
        assert_eq!(err, VfsError::AlreadyExists);
    }

    #[test]
    fn duplicate_mount_with_remount_flag_still_fails() {
        let mut table = MountTable::new();
        table.mount(mp("/volume", MountFlags::empty())).unwrap();
        let err = table.mount(mp("/volume", MountFlags::REMOUNT)).unwrap_err();
        assert_eq!(err, VfsError::AlreadyExists);
    }

    #[test]
    fn resolve_picks_longest_matching_root() {
        let mut table = MountTable::new();
        table.mount(mp("/", MountFlags::empty())).unwrap();
        table.mount(mp("/volume", MountFlags::empty())).unwrap();
        let (mount_point, rel) = table.resolve("/volume/file.txt").unwrap();
        assert_eq!(mount_point.root, "/volume");
        assert_eq!(rel, "file.txt");
    }

    #[test]
    fn resolve_fails_with_no_mounts() {
        let table = MountTable::new();
        assert_eq!(table.resolve("/anything").unwrap_err(), VfsError::NotFound);
    }

    #[test]
    fn unmount_returns_removed_mount_point() {
        let mut table = MountTable::new();
        table.mount(mp("/volume", MountFlags::empty())).unwrap();
        let removed = table.unmount("/volume").unwrap();
        assert_eq!(removed.root, "/volume");
        assert!(!table.is_mounted("/volume"));
    }
}
