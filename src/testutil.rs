//! In-memory test doubles, grounded on the original `test/common/ram_blkdev`
//! and `FilesystemUnderTest` harnesses. Compiled only under `#[cfg(test)]`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::block_device::{BlockDevice, SectorT};
use crate::error::{VfsError, VfsResult};
use crate::filesystem::{DirectoryHandle, FileHandle, Filesystem, FilesystemFactory};
use crate::flags::MountFlags;
use crate::stat::{FileStat, FileType};

/// A fixed-size [`BlockDevice`] backed entirely by heap memory.
pub struct RamBlockDevice {
    name: String,
    sector_size: usize,
    sectors: Mutex<Vec<u8>>,
}

impl RamBlockDevice {
    pub const SECTOR_SIZE: usize = 512;

    pub fn new(name: impl Into<String>, byte_size: usize) -> Self {
        RamBlockDevice {
            name: name.into(),
            sector_size: Self::SECTOR_SIZE,
            sectors: Mutex::new(vec![0u8; byte_size]),
        }
    }
}

impl BlockDevice for RamBlockDevice {
    fn probe(&self) -> VfsResult<()> {
        Ok(())
    }

    fn flush(&self) -> VfsResult<()> {
        Ok(())
    }

    fn read(&self, dst: &mut [u8], lba: SectorT, count: usize) -> VfsResult<()> {
        let start = lba as usize * self.sector_size;
        let len = count * self.sector_size;
        let sectors = self.sectors.lock().unwrap();
        let end = start.checked_add(len).ok_or(VfsError::Overflow)?;
        if end > sectors.len() || dst.len() < len {
            return Err(VfsError::Invalid);
        }
        dst[..len].copy_from_slice(&sectors[start..end]);
        Ok(())
    }

    fn write(&self, src: &[u8], lba: SectorT, count: usize) -> VfsResult<()> {
        let start = lba as usize * self.sector_size;
        let len = count * self.sector_size;
        let mut sectors = self.sectors.lock().unwrap();
        let end = start.checked_add(len).ok_or(VfsError::Overflow)?;
        if end > sectors.len() || src.len() < len {
            return Err(VfsError::Invalid);
        }
        sectors[start..end].copy_from_slice(&src[..len]);
        Ok(())
    }

    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn sector_count(&self) -> SectorT {
        (self.sectors.lock().unwrap().len() / self.sector_size) as SectorT
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// One in-memory "file": a name and a byte buffer. The fake filesystem below
/// stores these in a flat `Vec` and ignores directory hierarchy beyond exact
/// path matches, which is sufficient for exercising the dispatch engine.
struct RamFile {
    path: PathBuf,
    data: Vec<u8>,
}

struct RamFileToken {
    index: usize,
    cursor: usize,
}

/// A minimal [`Filesystem`] double that supports exactly the six required
/// operations plus `unlink`/`stat`, enough to drive descriptor-table and
/// dispatch-engine tests without pulling in a real backend crate.
pub struct RamFilesystem {
    root: String,
    flags: MountFlags,
    files: Vec<RamFile>,
}

impl RamFilesystem {
    pub fn new() -> Self {
        RamFilesystem {
            root: String::new(),
            flags: MountFlags::empty(),
            files: Vec::new(),
        }
    }

    fn find(&self, path: &Path) -> Option<usize> {
        self.files.iter().position(|f| f.path == path)
    }
}

impl Default for RamFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for RamFilesystem {
    fn mount(&mut self, root: &str, flags: MountFlags) -> VfsResult<()> {
        self.root = root.to_string();
        self.flags = flags;
        Ok(())
    }

    fn unmount(&mut self) -> VfsResult<()> {
        Ok(())
    }

    fn open(&mut self, abspath: &Path, flags: i32, _mode: u32) -> VfsResult<FileHandle> {
        if self.flags.is_read_only() && crate::flags::requests_write(flags) {
            return Err(VfsError::ReadOnly);
        }
        let index = match self.find(abspath) {
            Some(i) => i,
            None => {
                if flags & libc::O_CREAT == 0 {
                    return Err(VfsError::NotFound);
                }
                self.files.push(RamFile {
                    path: abspath.to_path_buf(),
                    data: Vec::new(),
                });
                self.files.len() - 1
            }
        };
        let token = RamFileToken { index, cursor: 0 };
        Ok(FileHandle::new(self.root.clone(), abspath.to_path_buf(), Box::new(token)))
    }

    fn close(&mut self, _handle: &mut FileHandle) -> VfsResult<()> {
        Ok(())
    }

    fn read(&mut self, handle: &mut FileHandle, buf: &mut [u8]) -> VfsResult<usize> {
        let token: &mut RamFileToken = handle.downcast_mut().ok_or(VfsError::BadDescriptor)?;
        let file = self.files.get(token.index).ok_or(VfsError::BadDescriptor)?;
        let remaining = &file.data[token.cursor.min(file.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        token.cursor += n;
        Ok(n)
    }

    fn write(&mut self, handle: &mut FileHandle, buf: &[u8]) -> VfsResult<usize> {
        if self.flags.is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        let token: &mut RamFileToken = handle.downcast_mut().ok_or(VfsError::BadDescriptor)?;
        let file = self.files.get_mut(token.index).ok_or(VfsError::BadDescriptor)?;
        let end = token.cursor + buf.len();
        if file.data.len() < end {
            file.data.resize(end, 0);
        }
        file.data[token.cursor..end].copy_from_slice(buf);
        token.cursor = end;
        Ok(buf.len())
    }

    fn stat(&mut self, path: &Path) -> VfsResult<FileStat> {
        let index = self.find(path).ok_or(VfsError::NotFound)?;
        Ok(FileStat {
            file_type: FileType::Regular,
            size: self.files[index].data.len() as u64,
            ..FileStat::default()
        })
    }

    fn unlink(&mut self, path: &Path) -> VfsResult<()> {
        if self.flags.is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        let index = self.find(path).ok_or(VfsError::NotFound)?;
        self.files.remove(index);
        Ok(())
    }

    fn rename(&mut self, oldname: &Path, newname: &Path) -> VfsResult<()> {
        if self.flags.is_read_only() {
            return Err(VfsError::ReadOnly);
        }
        let index = self.find(oldname).ok_or(VfsError::NotFound)?;
        self.files[index].path = newname.to_path_buf();
        Ok(())
    }
}

/// Hands out fresh [`RamFilesystem`]s, ignoring the device (the fake keeps
/// no on-disk state of its own).
pub struct RamFilesystemFactory;

impl FilesystemFactory for RamFilesystemFactory {
    fn create_filesystem(&self, _device: Box<dyn BlockDevice>, _flags: MountFlags) -> Box<dyn Filesystem> {
        Box::new(RamFilesystem::new())
    }
}

#[allow(dead_code)]
fn assert_directory_handle_send(_h: &DirectoryHandle) {}
