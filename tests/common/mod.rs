//! Shared RAM-backed test doubles for the integration suite, grounded on
//! the original `test/common/ram_blkdev` and `FilesystemUnderTest` harnesses.
//! This crate's own `#[cfg(test)]`-only `testutil` module isn't visible from
//! `tests/`, so the doubles are duplicated here at the same fidelity.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use corevfs::{BlockDevice, DirectoryHandle, FileHandle, FileStat, FileType, Filesystem, FilesystemFactory, MountFlags, SectorT, VfsError, VfsResult};

pub struct RamBlockDevice {
    name: String,
    sectors: Mutex<Vec<u8>>,
}

impl RamBlockDevice {
    const SECTOR_SIZE: usize = 512;

    pub fn new(name: impl Into<String>, byte_size: usize) -> Self {
        RamBlockDevice {
            name: name.into(),
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
        let start = lba as usize * Self::SECTOR_SIZE;
        let len = count * Self::SECTOR_SIZE;
        let sectors = self.sectors.lock().unwrap();
        if start + len > sectors.len() {
            return Err(VfsError::Invalid);
        }
        dst[..len].copy_from_slice(&sectors[start..start + len]);
        Ok(())
    }
    fn write(&self, src: &[u8], lba: SectorT, count: usize) -> VfsResult<()> {
        let start = lba as usize * Self::SECTOR_SIZE;
        let len = count * Self::SECTOR_SIZE;
        let mut sectors = self.sectors.lock().unwrap();
        if start + len > sectors.len() {
            return Err(VfsError::Invalid);
        }
        sectors[start..start + len].copy_from_slice(&src[..len]);
        Ok(())
    }
    fn sector_size(&self) -> usize {
        Self::SECTOR_SIZE
    }
    fn sector_count(&self) -> SectorT {
        (self.sectors.lock().unwrap().len() / Self::SECTOR_SIZE) as SectorT
    }
    fn name(&self) -> String {
        self.name.clone()
    }
}

struct RamFile {
    path: PathBuf,
    data: Vec<u8>,
}

struct Token {
    index: usize,
    cursor: usize,
}

/// Shared call log for [`TrackingRamFsFactory`], letting a test observe
/// which backend operations actually fired (e.g. during shutdown teardown).
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub struct RamFs {
    root: String,
    flags: MountFlags,
    files: Vec<RamFile>,
    log: Option<EventLog>,
}

impl RamFs {
    pub fn new() -> Self {
        RamFs {
            root: String::new(),
            flags: MountFlags::empty(),
            files: Vec::new(),
            log: None,
        }
    }

    pub fn with_log(log: EventLog) -> Self {
        RamFs {
            root: String::new(),
            flags: MountFlags::empty(),
            files: Vec::new(),
            log: Some(log),
        }
    }

    fn record(&self, event: impl Into<String>) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(event.into());
        }
    }

    fn find(&self, path: &Path) -> Option<usize> {
        self.files.iter().position(|f| f.path == path)
    }
}

impl Filesystem for RamFs {
    fn mount(&mut self, root: &str, flags: MountFlags) -> VfsResult<()> {
        self.root = root.to_string();
        self.flags = flags;
        Ok(())
    }

    fn unmount(&mut self) -> VfsResult<()> {
        Ok(())
    }

    fn open(&mut self, abspath: &Path, flags: i32, _mode: u32) -> VfsResult<FileHandle> {
        let index = match self.find(abspath) {
            Some(i) => i,
            None if flags & libc::O_CREAT != 0 => {
                self.files.push(RamFile {
                    path: abspath.to_path_buf(),
                    data: Vec::new(),
                });
                self.files.len() - 1
            }
            None => return Err(VfsError::NotFound),
        };
        Ok(FileHandle::new(self.root.clone(), abspath.to_path_buf(), Box::new(Token { index, cursor: 0 })))
    }

    fn close(&mut self, handle: &mut FileHandle) -> VfsResult<()> {
        self.record(format!("close:{}", handle.path().display()));
        Ok(())
    }

    fn read(&mut self, handle: &mut FileHandle, buf: &mut [u8]) -> VfsResult<usize> {
        let token: &mut Token = handle.downcast_mut().ok_or(VfsError::BadDescriptor)?;
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
        let token: &mut Token = handle.downcast_mut().ok_or(VfsError::BadDescriptor)?;
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
        self.record(format!("unlink:{}", path.display()));
        Ok(())
    }

    fn rename(&mut self, oldname: &Path, newname: &Path) -> VfsResult<()> {
        let index = self.find(oldname).ok_or(VfsError::NotFound)?;
        self.files[index].path = newname.to_path_buf();
        Ok(())
    }
}

pub struct RamFsFactory;

impl FilesystemFactory for RamFsFactory {
    fn create_filesystem(&self, _device: Box<dyn BlockDevice>, _flags: MountFlags) -> Box<dyn Filesystem> {
        Box::new(RamFs::new())
    }
}

/// Like [`RamFsFactory`], but every backend it creates shares one
/// [`EventLog`] so a test can observe which operations a live backend
/// actually received (e.g. across a [`corevfs::VirtualFs::shutdown`]).
pub struct TrackingRamFsFactory {
    pub log: EventLog,
}

impl FilesystemFactory for TrackingRamFsFactory {
    fn create_filesystem(&self, _device: Box<dyn BlockDevice>, _flags: MountFlags) -> Box<dyn Filesystem> {
        Box::new(RamFs::with_log(self.log.clone()))
    }
}

#[allow(dead_code)]
fn assert_dir_handle_type(_h: &DirectoryHandle) {}
