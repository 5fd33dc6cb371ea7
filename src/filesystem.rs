//! The [`Filesystem`] capability the core consumes from backend drivers
//! (§4.5), plus the opaque file/directory handle tokens the core stores and
//! forwards without ever inspecting their backend-specific contents (§9,
//! "polymorphic backends").

use std::any::Any;
use std::path::{Path, PathBuf};

use crate::block_device::BlockDevice;
use crate::error::{VfsError, VfsResult};
use crate::flags::MountFlags;
use crate::stat::{DirEntry, FileStat, VfsStat};

/// An open file, opaque to the core beyond the root/path it was opened
/// under. The backend-specific token lives behind `inner` and is recovered
/// with [`FileHandle::downcast_ref`]/[`FileHandle::downcast_mut`].
pub struct FileHandle {
    root: String,
    path: PathBuf,
    inner: Box<dyn Any + Send>,
}

impl FileHandle {
    pub fn new(root: impl Into<String>, path: PathBuf, inner: Box<dyn Any + Send>) -> Self {
        FileHandle {
            root: root.into(),
            path,
            inner,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut()
    }
}

/// An open directory iterator, opaque the same way [`FileHandle`] is.
pub struct DirectoryHandle {
    root: String,
    inner: Box<dyn Any + Send>,
}

impl DirectoryHandle {
    pub fn new(root: impl Into<String>, inner: Box<dyn Any + Send>) -> Self {
        DirectoryHandle {
            root: root.into(),
            inner,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut()
    }
}

/// `lseek` whence values, mirrored from libc so backends don't need to
/// depend on it themselves for this one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// A mounted backend instance. Every method beyond the six required ones
/// (`mount`, `unmount`, `open`, `close`, `read`, `write`) defaults to
/// [`VfsError::NotSupported`]; a backend overrides only what it implements,
/// exactly as the original C++ `Filesystem` base class does.
pub trait Filesystem: Send {
    fn mount(&mut self, root: &str, flags: MountFlags) -> VfsResult<()>;
    fn unmount(&mut self) -> VfsResult<()>;

    fn open(&mut self, abspath: &Path, flags: i32, mode: u32) -> VfsResult<FileHandle>;
    fn close(&mut self, handle: &mut FileHandle) -> VfsResult<()>;
    fn read(&mut self, handle: &mut FileHandle, buf: &mut [u8]) -> VfsResult<usize>;
    fn write(&mut self, handle: &mut FileHandle, buf: &[u8]) -> VfsResult<usize>;

    fn lseek(&mut self, _handle: &mut FileHandle, _offset: i64, _whence: Whence) -> VfsResult<u64> {
        Err(VfsError::NotSupported)
    }
    fn fstat(&mut self, _handle: &FileHandle) -> VfsResult<FileStat> {
        Err(VfsError::NotSupported)
    }
    fn stat(&mut self, _path: &Path) -> VfsResult<FileStat> {
        Err(VfsError::NotSupported)
    }
    fn stat_vfs(&mut self, _path: &Path) -> VfsResult<VfsStat> {
        Err(VfsError::NotSupported)
    }

    fn link(&mut self, _existing: &Path, _newlink: &Path) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn symlink(&mut self, _existing: &Path, _newlink: &Path) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn unlink(&mut self, _path: &Path) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn rmdir(&mut self, _path: &Path) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn rename(&mut self, _oldname: &Path, _newname: &Path) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn mkdir(&mut self, _path: &Path, _mode: u32) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }

    fn diropen(&mut self, _path: &Path) -> VfsResult<DirectoryHandle> {
        Err(VfsError::NotSupported)
    }
    fn dirreset(&mut self, _handle: &mut DirectoryHandle) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    /// Returns the next entry, or [`VfsError::NotFound`] to signal
    /// end-of-iteration (§7).
    fn dirnext(&mut self, _handle: &mut DirectoryHandle) -> VfsResult<DirEntry> {
        Err(VfsError::NotSupported)
    }
    fn dirclose(&mut self, _handle: &mut DirectoryHandle) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }

    fn ftruncate(&mut self, _handle: &mut FileHandle, _len: u64) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn fsync(&mut self, _handle: &mut FileHandle) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn ioctl(&mut self, _path: &Path, _cmd: i32, _arg: usize) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn utimens(&mut self, _path: &Path, _times: [chrono::DateTime<chrono::Utc>; 2]) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn flock(&mut self, _handle: &mut FileHandle, _cmd: i32) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn isatty(&mut self, _handle: &mut FileHandle) -> VfsResult<bool> {
        Err(VfsError::NotSupported)
    }

    fn chmod(&mut self, _path: &Path, _mode: u32) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }
    fn fchmod(&mut self, _handle: &mut FileHandle, _mode: u32) -> VfsResult<()> {
        Err(VfsError::NotSupported)
    }

    /// Partition label, used by auto-mount to name the root when the caller
    /// did not specify one (§4.3 step 5).
    fn get_label(&mut self) -> VfsResult<String> {
        Err(VfsError::NotSupported)
    }
}

/// Creates a [`Filesystem`] instance bound to a partition-like block device,
/// one per registered [`crate::fstype::FsType`].
pub trait FilesystemFactory: Send + Sync {
    fn create_filesystem(&self, device: Box<dyn BlockDevice>, flags: MountFlags) -> Box<dyn Filesystem>;
}
