//! [`VirtualFs`]: the dispatch engine tying the disk manager, mount table
//! and descriptor table together into the public API (§4.5, grounded on
//! `lib/common/vfs.cpp`).

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::config::{MountAllErrorPolicy, VfsConfig};
use crate::disk::Disk;
use crate::disk_manager::DiskManager;
use crate::block_device::BlockDevice;
use crate::descriptor::{DescriptorTable, HandleKind};
use crate::error::{VfsError, VfsResult};
use crate::filesystem::{DirectoryHandle, FileHandle, FilesystemFactory};
use crate::flags::{self, MountFlags};
use crate::fstype::FsType;
use crate::mount::{MountPoint, MountTable};
use crate::partition;
use crate::path;
use crate::stat::{DirEntry, FileStat, PartitionStats, VfsStat};

/// The dispatch engine. One instance per process; every public method is
/// `&self` so it can be shared behind an `Arc` across threads.
///
/// Lock ordering, least to most specific, must never be reversed: `mounts`
/// (the VFS-level lock) before a [`MountPoint`]'s own backend lock, before
/// any [`Disk`] lock a backend in turn takes. `mounts` is a
/// [`ReentrantMutex`] because [`VirtualFs::close`] can re-enter it through
/// [`VirtualFs::unlink`] on the same thread when a deferred unlink fires.
pub struct VirtualFs {
    config: VfsConfig,
    disk_manager: DiskManager,
    fstypes: Mutex<Vec<(FsType, Arc<dyn FilesystemFactory>)>>,
    mounts: ReentrantMutex<RefCell<MountTable>>,
    descriptors: Mutex<DescriptorTable>,
    /// Auto-mount name sequence (§4.3): increments per auto-named mount,
    /// resets only on [`VirtualFs::unmount_all`].
    auto_name_seq: Mutex<u64>,
}

impl VirtualFs {
    pub fn new(config: VfsConfig) -> Self {
        VirtualFs {
            config,
            disk_manager: DiskManager::new(),
            fstypes: Mutex::new(Vec::new()),
            mounts: ReentrantMutex::new(RefCell::new(MountTable::new())),
            descriptors: Mutex::new(DescriptorTable::new()),
            auto_name_seq: Mutex::new(0),
        }
    }

    pub fn config(&self) -> &VfsConfig {
        &self.config
    }

    // ---- device registry -------------------------------------------------

    pub fn register_device(&self, device: Box<dyn BlockDevice>) -> VfsResult<()> {
        self.disk_manager.register_device(device)?;
        Ok(())
    }

    pub fn unregister_device(&self, name: &str) -> VfsResult<()> {
        self.disk_manager.unregister_device(name)
    }

    // ---- filesystem-type registry -----------------------------------------

    /// Registers a backend factory under `fs_type`. Fails with
    /// [`VfsError::AlreadyExists`] if that type name is already registered.
    pub fn register_fstype(&self, fs_type: FsType, factory: Arc<dyn FilesystemFactory>) -> VfsResult<()> {
        let mut fstypes = self.fstypes.lock();
        if fstypes.iter().any(|(t, _)| t.name == fs_type.name) {
            return Err(VfsError::AlreadyExists);
        }
        fstypes.push((fs_type, factory));
        Ok(())
    }

    /// Removes a previously registered type by name. `VfsError::NotFound` if
    /// no such type was registered (§4.5's filesystem-type registry).
    pub fn unregister_fstype(&self, name: &str) -> VfsResult<()> {
        let mut fstypes = self.fstypes.lock();
        let before = fstypes.len();
        fstypes.retain(|(t, _)| t.name != name);
        if fstypes.len() == before {
            return Err(VfsError::NotFound);
        }
        Ok(())
    }

    fn lookup_factory_by_name(&self, name: &str) -> VfsResult<(FsType, Arc<dyn FilesystemFactory>)> {
        self.fstypes
            .lock()
            .iter()
            .find(|(t, _)| t.name == name)
            .map(|(t, f)| (t.clone(), Arc::clone(f)))
            .ok_or(VfsError::Invalid)
    }

    fn infer_fstype_by_code(&self, code: u8) -> Option<(FsType, Arc<dyn FilesystemFactory>)> {
        self.fstypes
            .lock()
            .iter()
            .find(|(t, _)| t.matches_code(code))
            .map(|(t, f)| (t.clone(), Arc::clone(f)))
    }

    // ---- mount table -------------------------------------------------------

    fn mount_point_for_root(&self, root: &str) -> VfsResult<Arc<MountPoint>> {
        let guard = self.mounts.lock();
        let table = guard.borrow();
        table.get(root).ok_or(VfsError::NotFound)
    }

    /// Mounts one partition of a registered device, following §4.3's
    /// algorithm exactly:
    ///
    /// 1. `name` is split on its last `'p'` into `(disk, partition_index)`.
    ///    A name with no `'p'` names a raw, unpartitioned disk, which this
    ///    core does not support mounting directly: `VfsError::Invalid`.
    /// 2. The partition is looked up; a miss is `VfsError::Invalid`.
    /// 3. An empty `fstype` is inferred from the partition's MBR type code.
    /// 4. The resolved factory creates a backend bound to the partition.
    /// 5. An empty `root` is either the backend's reported label (prefixed
    ///    with `/`) or an auto-generated `root_base` + sequence number.
    /// 6. A `root` already in the table is `VfsError::AlreadyExists` and the
    ///    freshly created backend is dropped without being mounted.
    /// 7. The backend's own `mount` is invoked; its failure is forwarded.
    /// 8. The mount point is inserted.
    ///
    /// Returns the resolved root on success (the original surface reports
    /// only an error code; resolved root is echoed back here since callers
    /// with an empty `root` argument have no other way to learn it).
    pub fn mount(&self, name: &str, root: &str, fstype: &str, flags: MountFlags) -> VfsResult<String> {
        let (disk_name, partition_index) = partition::split_partition_name(name).ok_or(VfsError::Invalid)?;
        let disk = self.disk_manager.get(disk_name).ok_or(VfsError::NotFound)?;
        let partition = Disk::borrow_partition(&disk, partition_index).ok_or(VfsError::Invalid)?;
        let type_code = partition.info().type_code;

        let (fs_type, factory) = if fstype.is_empty() {
            self.infer_fstype_by_code(type_code).ok_or(VfsError::Invalid)?
        } else {
            self.lookup_factory_by_name(fstype)?
        };

        let mut backend = factory.create_filesystem(Box::new(partition), flags);

        let resolved_root = if root.is_empty() {
            match backend.get_label() {
                Ok(label) => format!("/{label}"),
                Err(_) => self.next_auto_root(),
            }
        } else {
            root.to_string()
        };

        let guard = self.mounts.lock();
        if guard.borrow().is_mounted(&resolved_root) {
            return Err(VfsError::AlreadyExists);
        }

        backend.mount(&resolved_root, flags)?;
        let mount_point = MountPoint::new(resolved_root.clone(), disk_name, fs_type, flags, backend);
        match guard.borrow_mut().mount(mount_point) {
            Ok(()) => Ok(resolved_root),
            Err(e) => {
                log::warn!("mount of '{resolved_root}' rejected: lost a race with a concurrent mount");
                Err(e)
            }
        }
    }

    /// Mounts a whole raw (unpartitioned) disk directly. Not part of the
    /// original `mount(name, root, fstype, flags)` surface — provided
    /// because the core otherwise has no way to mount a disk that carries
    /// no MBR, which `Disk::create` explicitly tolerates (§4.2).
    pub fn mount_raw_disk(&self, device_name: &str, fstype: &str, root: &str, flags: MountFlags) -> VfsResult<()> {
        if root.is_empty() || fstype.is_empty() {
            return Err(VfsError::Invalid);
        }
        let disk = self.disk_manager.get(device_name).ok_or(VfsError::NotFound)?;
        let (fs_type, factory) = self.lookup_factory_by_name(fstype)?;
        let mut backend = factory.create_filesystem(Box::new(Arc::clone(&disk)), flags);

        let guard = self.mounts.lock();
        if guard.borrow().is_mounted(root) {
            return Err(VfsError::AlreadyExists);
        }
        backend.mount(root, flags)?;
        let mount_point = MountPoint::new(root, device_name, fs_type, flags, backend);
        guard.borrow_mut().mount(mount_point)?;
        Ok(())
    }

    /// `root_base` plus a sequence number that increments on every
    /// auto-generated name and resets only on [`VirtualFs::unmount_all`]
    /// (§4.3) — not on removing any single mount.
    fn next_auto_root(&self) -> String {
        let mut seq = self.auto_name_seq.lock();
        let root = format!("{}{}", self.config.root_base, *seq);
        *seq += 1;
        root
    }

    /// Unmounts `root` per §4.3: the backend's own `unmount()` runs first;
    /// the table entry is erased only once that succeeds, so a failing
    /// backend unmount leaves the mount in place rather than discarding it.
    pub fn unmount(&self, root: &str) -> VfsResult<()> {
        let mount_point = {
            let guard = self.mounts.lock();
            guard.borrow().get(root).ok_or(VfsError::NotFound)?
        };
        mount_point.fs.lock().unmount()?;
        let guard = self.mounts.lock();
        guard.borrow_mut().unmount(root)?;
        Ok(())
    }

    /// Unmounts every mount point and resets the auto-name sequence (§4.3) —
    /// a single [`VirtualFs::unmount`] never resets it.
    pub fn unmount_all(&self) -> VfsResult<()> {
        let removed = {
            let guard = self.mounts.lock();
            guard.borrow_mut().unmount_all()
        };
        let mut first_err = None;
        for mount_point in removed {
            if let Err(e) = mount_point.fs.lock().unmount() {
                log::error!("unmount of '{}' failed: {e}", mount_point.root);
                first_err.get_or_insert(e);
            }
        }
        *self.auto_name_seq.lock() = 0;
        first_err.map_or(Ok(()), Err)
    }

    /// For every partition of every registered disk, attempts
    /// `mount(part_name, "", "", default_flags)` — empty root and fstype
    /// trigger label/auto-naming and MBR-code inference respectively (§4.3).
    /// Errors are collected but don't stop the walk; the first error seen is
    /// returned once it completes, unless [`MountAllErrorPolicy::AllOrNothing`]
    /// is configured, in which case the first failure unwinds every mount
    /// `mount_all` itself performed this call.
    pub fn mount_all(&self) -> VfsResult<()> {
        let names = self.disk_manager.disk_names();
        if names.is_empty() {
            return Err(VfsError::NoDevices);
        }

        let mut mounted_roots = Vec::new();
        let mut first_err = None;
        for name in names {
            let Some(disk) = self.disk_manager.get(&name) else {
                continue;
            };
            for idx in 0..disk.partition_count() as u8 {
                let Some(info) = disk.mbr_partition(idx).copied() else {
                    continue;
                };
                let part_name = partition::partition_name(&name, info.physical_number);

                match self.mount(&part_name, "", "", self.config.default_flags()) {
                    Ok(resolved_root) => mounted_roots.push(resolved_root),
                    Err(e) => {
                        log::error!("mount_all: partition '{part_name}' failed: {e}");
                        first_err.get_or_insert(e);
                        if self.config.mount_all_error_policy == MountAllErrorPolicy::AllOrNothing {
                            for root in mounted_roots {
                                let _ = self.unmount(&root);
                            }
                            return Err(first_err.unwrap());
                        }
                    }
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn mounted_roots(&self) -> Vec<String> {
        let guard = self.mounts.lock();
        guard.borrow().roots()
    }

    pub fn partition_stats(&self, root: &str) -> VfsResult<PartitionStats> {
        let mount_point = self.mount_point_for_root(root)?;
        let vfs_stat: VfsStat = mount_point.fs.lock().stat_vfs(Path::new(root))?;
        let flags = *mount_point.flags.lock();
        Ok(crate::stat::partition_stats_from_vfs_stat(
            mount_point.disk_name.clone(),
            root.to_string(),
            mount_point.fs_type.name.clone(),
            flags,
            &vfs_stat,
        ))
    }

    // ---- path resolution ----------------------------------------------------

    /// Requires `path` to already be absolute (§4.3 step 2): the core keeps
    /// no current working directory, so a relative path is always
    /// [`VfsError::Invalid`] rather than being joined against one.
    fn to_absolute(&self, path: &str) -> VfsResult<String> {
        if path.starts_with('/') {
            Ok(path::normalize(path).to_string_lossy().into_owned())
        } else {
            Err(VfsError::Invalid)
        }
    }

    fn resolve(&self, path: &str) -> VfsResult<(Arc<MountPoint>, PathBuf)> {
        let abspath = self.to_absolute(path)?;
        let guard = self.mounts.lock();
        let table = guard.borrow();
        let (mount_point, relative) = table.resolve(&abspath)?;
        let full = path::join_abs(&mount_point.root, &relative);
        Ok((mount_point, full))
    }

    // ---- file operations ----------------------------------------------------

    pub fn open(&self, path: &str, open_flags: i32, mode: u32) -> VfsResult<i32> {
        let (mount_point, abspath) = self.resolve(path)?;
        if mount_point.flags.lock().is_read_only() && flags::requests_write(open_flags) {
            return Err(VfsError::ReadOnly);
        }
        let handle = mount_point.fs.lock().open(&abspath, open_flags, mode)?;
        let mut descriptors = self.descriptors.lock();
        Ok(descriptors.insert(mount_point.root.clone(), abspath, HandleKind::File(handle)))
    }

    /// Closes `fd` per §4.5: the backend's own `close`/`dirclose` runs first,
    /// while the descriptor is still indexed, so a failing backend close
    /// leaves the descriptor in place rather than silently discarding it.
    /// Only once that succeeds is the descriptor removed from the table; its
    /// removal signals whether a deferred [`VirtualFs::unlink`] must now fire.
    pub fn close(&self, fd: i32) -> VfsResult<()> {
        let guard = self.mounts.lock();

        let mount_root = self.descriptors.lock().get(fd)?.mount_root.clone();
        let mount_point = {
            let table = guard.borrow();
            table.get(&mount_root).ok_or(VfsError::NotFound)?
        };

        {
            let mut descriptors = self.descriptors.lock();
            let descriptor = descriptors.get_mut(fd)?;
            let mut backend = mount_point.fs.lock();
            match &mut descriptor.handle {
                HandleKind::File(h) => backend.close(h)?,
                HandleKind::Directory(h) => backend.dirclose(h)?,
            }
        }

        let (abspath, should_unlink) = {
            let mut descriptors = self.descriptors.lock();
            let should_unlink = descriptors.close_triggers_unlink(fd);
            let descriptor = descriptors.remove(fd)?;
            (descriptor.abspath, should_unlink)
        };

        if should_unlink {
            // Re-enters `self.mounts` while `guard` is still held above;
            // sound only because the lock is reentrant.
            self.unlink(&abspath.to_string_lossy())?;
        }
        Ok(())
    }

    fn with_file_handle<R>(&self, fd: i32, f: impl FnOnce(&Arc<MountPoint>, &mut FileHandle) -> VfsResult<R>) -> VfsResult<R> {
        let mount_root = self.descriptors.lock().get(fd)?.mount_root.clone();
        let mount_point = self.mount_point_for_root(&mount_root)?;
        let mut descriptors = self.descriptors.lock();
        let descriptor = descriptors.get_mut(fd)?;
        let handle = descriptor.handle.as_file_mut()?;
        f(&mount_point, handle)
    }

    pub fn read(&self, fd: i32, buf: &mut [u8]) -> VfsResult<usize> {
        self.with_file_handle(fd, |mp, handle| mp.fs.lock().read(handle, buf))
    }

    pub fn write(&self, fd: i32, buf: &[u8]) -> VfsResult<usize> {
        self.with_file_handle(fd, |mp, handle| {
            if mp.flags.lock().is_read_only() {
                return Err(VfsError::ReadOnly);
            }
            mp.fs.lock().write(handle, buf)
        })
    }

    pub fn lseek(&self, fd: i32, offset: i64, whence: crate::filesystem::Whence) -> VfsResult<u64> {
        self.with_file_handle(fd, |mp, handle| mp.fs.lock().lseek(handle, offset, whence))
    }

    pub fn fstat(&self, fd: i32) -> VfsResult<FileStat> {
        self.with_file_handle(fd, |mp, handle| mp.fs.lock().fstat(handle))
    }

    pub fn ftruncate(&self, fd: i32, len: u64) -> VfsResult<()> {
        self.with_file_handle(fd, |mp, handle| {
            if mp.flags.lock().is_read_only() {
                return Err(VfsError::ReadOnly);
            }
            mp.fs.lock().ftruncate(handle, len)
        })
    }

    pub fn fsync(&self, fd: i32) -> VfsResult<()> {
        self.with_file_handle(fd, |mp, handle| mp.fs.lock().fsync(handle))
    }

    pub fn fchmod(&self, fd: i32, mode: u32) -> VfsResult<()> {
        self.with_file_handle(fd, |mp, handle| {
            if mp.flags.lock().is_read_only() {
                return Err(VfsError::ReadOnly);
            }
            mp.fs.lock().fchmod(handle, mode)
        })
    }

    pub fn flock(&self, fd: i32, cmd: i32) -> VfsResult<()> {
        self.with_file_handle(fd, |mp, handle| mp.fs.lock().flock(handle, cmd))
    }

    pub fn isatty(&self, fd: i32) -> VfsResult<bool> {
        self.with_file_handle(fd, |mp, handle| mp.fs.lock().isatty(handle))
    }

    // ---- path-based metadata & mutation ---------------------------------------

    pub fn stat(&self, path: &str) -> VfsResult<FileStat> {
        let (mount_point, abspath) = self.resolve(path)?;
        mount_point.fs.lock().stat(&abspath)
    }

    pub fn mkdir(&self, path: &str, mode: u32) -> VfsResult<()> {
        let (mount_point, abspath) = self.resolve(path)?;
        if mount_point.flags.lock().is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        mount_point.fs.lock().mkdir(&abspath, mode)
    }

    pub fn rmdir(&self, path: &str) -> VfsResult<()> {
        let (mount_point, abspath) = self.resolve(path)?;
        if mount_point.flags.lock().is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        mount_point.fs.lock().rmdir(&abspath)
    }

    /// Unlinks `path`. If descriptors are still open against it, the unlink
    /// is deferred until the last one closes (§4.4).
    pub fn unlink(&self, path: &str) -> VfsResult<()> {
        let (mount_point, abspath) = self.resolve(path)?;
        if mount_point.flags.lock().is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        let unlink_now = self.descriptors.lock().mark_unlink(&abspath);
        if unlink_now {
            mount_point.fs.lock().unlink(&abspath)
        } else {
            Ok(())
        }
    }

    /// Renames within one mount. Fails with [`VfsError::CrossDevice`] if
    /// `oldname` and `newname` resolve to different mount points (§4.5).
    pub fn rename(&self, oldname: &str, newname: &str) -> VfsResult<()> {
        let (old_mount, old_abspath) = self.resolve(oldname)?;
        let (new_mount, new_abspath) = self.resolve(newname)?;
        if !Arc::ptr_eq(&old_mount, &new_mount) {
            return Err(VfsError::CrossDevice);
        }
        if old_mount.flags.lock().is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        old_mount.fs.lock().rename(&old_abspath, &new_abspath)
    }

    pub fn link(&self, existing: &str, newlink: &str) -> VfsResult<()> {
        let (old_mount, old_abspath) = self.resolve(existing)?;
        let (new_mount, new_abspath) = self.resolve(newlink)?;
        if !Arc::ptr_eq(&old_mount, &new_mount) {
            return Err(VfsError::CrossDevice);
        }
        old_mount.fs.lock().link(&old_abspath, &new_abspath)
    }

    /// Symlinks within one mount. Same cross-mount and read-only rules as
    /// [`VirtualFs::rename`]/[`VirtualFs::link`] (§4.5).
    pub fn symlink(&self, existing: &str, newlink: &str) -> VfsResult<()> {
        let (old_mount, old_abspath) = self.resolve(existing)?;
        let (new_mount, new_abspath) = self.resolve(newlink)?;
        if !Arc::ptr_eq(&old_mount, &new_mount) {
            return Err(VfsError::CrossDevice);
        }
        if old_mount.flags.lock().is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        old_mount.fs.lock().symlink(&old_abspath, &new_abspath)
    }

    pub fn chmod(&self, path: &str, mode: u32) -> VfsResult<()> {
        let (mount_point, abspath) = self.resolve(path)?;
        if mount_point.flags.lock().is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        mount_point.fs.lock().chmod(&abspath, mode)
    }

    pub fn ioctl(&self, path: &str, cmd: i32, arg: usize) -> VfsResult<()> {
        let (mount_point, abspath) = self.resolve(path)?;
        mount_point.fs.lock().ioctl(&abspath, cmd, arg)
    }

    pub fn utimens(&self, path: &str, times: [chrono::DateTime<chrono::Utc>; 2]) -> VfsResult<()> {
        let (mount_point, abspath) = self.resolve(path)?;
        if mount_point.flags.lock().is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        mount_point.fs.lock().utimens(&abspath, times)
    }

    /// Statfs-style metadata for the mount point that owns `path`, resolved
    /// like any other by-single-path operation (§4.5) — unlike
    /// [`VirtualFs::partition_stats`], `path` need not itself be a mount root.
    pub fn stat_vfs(&self, path: &str) -> VfsResult<VfsStat> {
        let (mount_point, abspath) = self.resolve(path)?;
        mount_point.fs.lock().stat_vfs(&abspath)
    }

    // ---- directory operations ----------------------------------------------

    pub fn diropen(&self, path: &str) -> VfsResult<i32> {
        let (mount_point, abspath) = self.resolve(path)?;
        let handle = mount_point.fs.lock().diropen(&abspath)?;
        let mut descriptors = self.descriptors.lock();
        Ok(descriptors.insert(mount_point.root.clone(), abspath, HandleKind::Directory(handle)))
    }

    fn with_dir_handle<R>(&self, fd: i32, f: impl FnOnce(&Arc<MountPoint>, &mut DirectoryHandle) -> VfsResult<R>) -> VfsResult<R> {
        let mount_root = self.descriptors.lock().get(fd)?.mount_root.clone();
        let mount_point = self.mount_point_for_root(&mount_root)?;
        let mut descriptors = self.descriptors.lock();
        let descriptor = descriptors.get_mut(fd)?;
        let handle = descriptor.handle.as_directory_mut()?;
        f(&mount_point, handle)
    }

    pub fn dirnext(&self, fd: i32) -> VfsResult<DirEntry> {
        self.with_dir_handle(fd, |mp, handle| mp.fs.lock().dirnext(handle))
    }

    pub fn dirreset(&self, fd: i32) -> VfsResult<()> {
        self.with_dir_handle(fd, |mp, handle| mp.fs.lock().dirreset(handle))
    }

    // ---- working directory --------------------------------------------------

    /// Explicitly unsupported in the core (§4.5): it keeps no current
    /// working directory, so every relative-path caller gets `ENOTSUP`
    /// rather than a cwd that would silently make relative paths resolve.
    pub fn chdir(&self, _path: &str) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }

    /// Always empty: see [`VirtualFs::chdir`].
    pub fn getcwd(&self) -> String {
        String::new()
    }

    /// Orderly process-wide shutdown (§4.5): every live descriptor is closed
    /// first — forwarding backend `close` and any deferred `unlink` it
    /// triggers — then every mount is unmounted. A failure at any step is
    /// logged but does not stop the rest of the teardown.
    pub fn shutdown(&self) -> VfsResult<()> {
        let ids = self.descriptors.lock().ids();
        for fd in ids {
            if let Err(e) = self.close(fd) {
                log::error!("shutdown: closing descriptor {fd} failed: {e}");
            }
        }
        let result = self.unmount_all();
        *self.descriptors.lock() = DescriptorTable::new();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RamBlockDevice, RamFilesystemFactory};

    fn new_vfs() -> VirtualFs {
        let vfs = VirtualFs::new(VfsConfig::default());
        vfs.register_fstype(FsType::ext_family(), Arc::new(RamFilesystemFactory)).unwrap();
        vfs
    }

    fn mount_ram_whole_disk(vfs: &VirtualFs, name: &str, root: &str) {
        vfs.register_device(Box::new(RamBlockDevice::new(name, 1024 * 1024))).unwrap();
        vfs.mount_raw_disk(name, "ext", root, MountFlags::empty()).unwrap();
    }

    #[test]
    fn open_write_close_read_round_trip() {
        let vfs = new_vfs();
        mount_ram_whole_disk(&vfs, "ram0", "/volume");

        let fd = vfs.open("/volume/hello.txt", libc::O_CREAT | libc::O_RDWR, 0o644).unwrap();
        assert_eq!(vfs.write(fd, b"hi").unwrap(), 2);
        vfs.close(fd).unwrap();

        let fd2 = vfs.open("/volume/hello.txt", libc::O_RDONLY, 0).unwrap();
        let mut buf = [0u8; 8];
        let n = vfs.read(fd2, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hi");
        vfs.close(fd2).unwrap();
    }

    #[test]
    fn unlink_is_deferred_until_last_close() {
        let vfs = new_vfs();
        mount_ram_whole_disk(&vfs, "ram0", "/volume");

        let fd = vfs.open("/volume/a.txt", libc::O_CREAT | libc::O_RDWR, 0o644).unwrap();
        vfs.unlink("/volume/a.txt").unwrap();

        // Still open: stat through the live descriptor still behaves.
        assert!(vfs.write(fd, b"x").is_ok());
        vfs.close(fd).unwrap();

        let err = vfs.stat("/volume/a.txt").unwrap_err();
        assert_eq!(err, VfsError::NotFound);
    }

    #[test]
    fn write_on_readonly_mount_is_rejected() {
        let vfs = new_vfs();
        vfs.register_device(Box::new(RamBlockDevice::new("ram0", 1024 * 1024))).unwrap();
        vfs.mount_raw_disk("ram0", "ext", "/volume", MountFlags::READ_ONLY).unwrap();

        let err = vfs.open("/volume/a.txt", libc::O_CREAT | libc::O_RDWR, 0o644).unwrap_err();
        assert_eq!(err, VfsError::ReadOnly);
    }

    #[test]
    fn rename_across_mounts_is_cross_device() {
        let vfs = new_vfs();
        mount_ram_whole_disk(&vfs, "ram0", "/a");
        mount_ram_whole_disk(&vfs, "ram1", "/b");

        let fd = vfs.open("/a/file.txt", libc::O_CREAT | libc::O_RDWR, 0o644).unwrap();
        vfs.close(fd).unwrap();

        let err = vfs.rename("/a/file.txt", "/b/file.txt").unwrap_err();
        assert_eq!(err, VfsError::CrossDevice);
    }

    #[test]
    fn mount_all_with_no_devices_fails() {
        let vfs = new_vfs();
        assert_eq!(vfs.mount_all().unwrap_err(), VfsError::NoDevices);
    }

    #[test]
    fn chdir_and_getcwd_are_unsupported() {
        let vfs = new_vfs();
        assert_eq!(vfs.chdir("/volume").unwrap_err(), VfsError::NotSupported);
        assert_eq!(vfs.getcwd(), "");
    }

    #[test]
    fn relative_path_is_rejected_without_a_cwd() {
        let vfs = new_vfs();
        mount_ram_whole_disk(&vfs, "ram0", "/volume");

        let err = vfs.open("rel.txt", libc::O_CREAT | libc::O_RDWR, 0o644).unwrap_err();
        assert_eq!(err, VfsError::Invalid);
    }
}
