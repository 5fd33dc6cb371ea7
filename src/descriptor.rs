//! The descriptor table: every open file/directory handle, indexed both by
//! its numeric descriptor and by the path it was opened under, so `unlink`
//! on a still-open path can be deferred instead of destroying data backends
//! still depend on (§4.4, grounded on the original
//! `file_descriptor_container.hpp`/`file_descriptor.hpp`).

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{VfsError, VfsResult};
use crate::filesystem::{DirectoryHandle, FileHandle};

/// Descriptor numbers below this are reserved for stdin/stdout/stderr by
/// convention, matching the original table's starting point.
pub const FIRST_DESCRIPTOR: i32 = 3;

pub enum HandleKind {
    File(FileHandle),
    Directory(DirectoryHandle),
}

impl HandleKind {
    pub fn as_file(&self) -> VfsResult<&FileHandle> {
        match self {
            HandleKind::File(h) => Ok(h),
            HandleKind::Directory(_) => Err(VfsError::BadDescriptor),
        }
    }

    pub fn as_file_mut(&mut self) -> VfsResult<&mut FileHandle> {
        match self {
            HandleKind::File(h) => Ok(h),
            HandleKind::Directory(_) => Err(VfsError::BadDescriptor),
        }
    }

    pub fn as_directory_mut(&mut self) -> VfsResult<&mut DirectoryHandle> {
        match self {
            HandleKind::Directory(h) => Ok(h),
            HandleKind::File(_) => Err(VfsError::BadDescriptor),
        }
    }
}

/// A single open descriptor: its handle plus the mount root and absolute
/// path it was opened against, so dispatch can find the right
/// [`crate::mount::MountPoint`] again on every subsequent call.
pub struct Descriptor {
    pub id: i32,
    pub mount_root: String,
    pub abspath: PathBuf,
    pub handle: HandleKind,
}

/// Per-path bookkeeping: how many live descriptors reference this path, and
/// whether an `unlink` against it has been deferred until the last one
/// closes.
#[derive(Default)]
struct PathRecord {
    open_ids: Vec<i32>,
    marked_for_unlink: bool,
}

#[derive(Default)]
pub struct DescriptorTable {
    next_id: i32,
    by_id: HashMap<i32, Descriptor>,
    by_path: HashMap<PathBuf, PathRecord>,
}

impl DescriptorTable {
    pub fn new() -> Self {
        DescriptorTable {
            next_id: FIRST_DESCRIPTOR,
            by_id: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    /// Allocates a new descriptor id, registers the open against `abspath`,
    /// and stores `handle`. Ids are never reused within the table's lifetime.
    pub fn insert(&mut self, mount_root: String, abspath: PathBuf, handle: HandleKind) -> i32 {
        let id = self.next_id;
        self.next_id += 1;

        self.by_path.entry(abspath.clone()).or_default().open_ids.push(id);
        self.by_id.insert(
            id,
            Descriptor {
                id,
                mount_root,
                abspath,
                handle,
            },
        );
        id
    }

    pub fn get(&self, id: i32) -> VfsResult<&Descriptor> {
        self.by_id.get(&id).ok_or(VfsError::BadDescriptor)
    }

    pub fn get_mut(&mut self, id: i32) -> VfsResult<&mut Descriptor> {
        self.by_id.get_mut(&id).ok_or(VfsError::BadDescriptor)
    }

    /// Removes `id` from the table. Returns the path's unlink state if this
    /// was the last open descriptor against that path: `Some(true)` means
    /// the caller must now perform the deferred backend `unlink`.
    pub fn remove(&mut self, id: i32) -> VfsResult<Descriptor> {
        let descriptor = self.by_id.remove(&id).ok_or(VfsError::BadDescriptor)?;

        if let Some(record) = self.by_path.get_mut(&descriptor.abspath) {
            record.open_ids.retain(|&open_id| open_id != id);
            if record.open_ids.is_empty() {
                self.by_path.remove(&descriptor.abspath);
            }
        }
        Ok(descriptor)
    }

    /// Whether `id`'s close should trigger a deferred unlink: true exactly
    /// when removing it would leave zero remaining opens on a path marked
    /// for unlink.
    pub fn close_triggers_unlink(&self, id: i32) -> bool {
        let Some(descriptor) = self.by_id.get(&id) else {
            return false;
        };
        match self.by_path.get(&descriptor.abspath) {
            Some(record) => record.marked_for_unlink && record.open_ids.len() <= 1,
            None => false,
        }
    }

    /// Returns whether `abspath` currently has any open descriptors.
    pub fn is_open(&self, abspath: &std::path::Path) -> bool {
        self.by_path
            .get(abspath)
            .map(|r| !r.open_ids.is_empty())
            .unwrap_or(false)
    }

    /// Marks `abspath` for deferred unlink. Returns `true` if there are no
    /// open descriptors against it right now, meaning the caller should
    /// unlink immediately instead of deferring.
    pub fn mark_unlink(&mut self, abspath: &std::path::Path) -> bool {
        match self.by_path.get_mut(abspath) {
            Some(record) => {
                record.marked_for_unlink = true;
                record.open_ids.is_empty()
            }
            None => true,
        }
    }

    /// Snapshot of every currently-open descriptor id, for shutdown to drain.
    pub fn ids(&self) -> Vec<i32> {
        self.by_id.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RamFilesystem;
    use std::path::PathBuf;

    fn file_handle() -> HandleKind {
        HandleKind::File(FileHandle::new("/volume", PathBuf::from("/volume/a"), Box::new(())))
    }

    #[test]
    fn ids_start_at_first_descriptor_and_increase() {
        let mut table = DescriptorTable::new();
        let a = table.insert("/volume".into(), PathBuf::from("/volume/a"), file_handle());
        let b = table.insert("/volume".into(), PathBuf::from("/volume/b"), file_handle());
        assert_eq!(a, FIRST_DESCRIPTOR);
        assert_eq!(b, FIRST_DESCRIPTOR + 1);
    }

    #[test]
    fn unlink_is_deferred_while_open() {
        let mut table = DescriptorTable::new();
        let path = PathBuf::from("/volume/a");
        let id = table.insert("/volume".into(), path.clone(), file_handle());

        let immediate = table.mark_unlink(&path);
        assert!(!immediate, "path is still open, unlink must be deferred");
        assert!(table.close_triggers_unlink(id));

        table.remove(id).unwrap();
        assert!(!table.is_open(&path));
    }

    #[test]
    fn unlink_is_immediate_when_path_not_open() {
        let mut table = DescriptorTable::new();
        let immediate = table.mark_unlink(&PathBuf::from("/volume/never-opened"));
        assert!(immediate);
    }

    #[test]
    fn remove_unknown_descriptor_is_bad_descriptor() {
        let mut table = DescriptorTable::new();
        assert_eq!(table.remove(999).unwrap_err(), VfsError::BadDescriptor);
    }

    #[test]
    fn second_opener_keeps_path_open_after_first_closes() {
        let mut table = DescriptorTable::new();
        let path = PathBuf::from("/volume/a");
        let first = table.insert("/volume".into(), path.clone(), file_handle());
        let _second = table.insert("/volume".into(), path.clone(), file_handle());
        table.mark_unlink(&path);
        assert!(!table.close_triggers_unlink(first) || table.is_open(&path));
        table.remove(first).unwrap();
        assert!(table.is_open(&path));
    }

    #[allow(dead_code)]
    fn unused_import_guard(_: RamFilesystem) {}
}
