//! Admin/demo CLI for `corevfs`: attach a RAM-backed device, mount it, and
//! exercise the dispatch engine from the command line. Mirrors the
//! `extract` tool's clap/anyhow shape, repurposed for VFS exploration.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use corevfs::{FsType, MountFlags, VfsConfig, VirtualFs};

#[derive(Parser)]
#[command(name = "vfsctl")]
#[command(about = "Inspect and exercise a corevfs instance backed by RAM disks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a RAM-backed device, mount it read-write, write one file, read it back.
    Smoke {
        /// Device name to register.
        #[arg(long, default_value = "ram0")]
        device: String,
        /// Device size in bytes.
        #[arg(long, default_value_t = 4 * 1024 * 1024)]
        size: usize,
        /// Mount point under the configured root base.
        #[arg(long, default_value = "/volume/ram0p0")]
        root: String,
    },
}

fn main() -> Result<()> {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .context("failed to initialize terminal logger")?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Smoke { device, size, root } => run_smoke(&device, size, &root),
    }
}

fn run_smoke(device_name: &str, size: usize, root: &str) -> Result<()> {
    let vfs = VirtualFs::new(VfsConfig::default());
    vfs.register_fstype(FsType::ext_family(), Arc::new(demo_backend::RamFsFactory))
        .context("registering demo fstype")?;

    vfs.register_device(Box::new(demo_backend::RamBlockDevice::new(device_name, size)))
        .context("registering device")?;
    vfs.mount_raw_disk(device_name, "ext", root, MountFlags::empty())
        .context("mounting device")?;

    let path = format!("{root}/hello.txt");
    let fd = vfs
        .open(&path, libc::O_CREAT | libc::O_RDWR, 0o644)
        .context("open")?;
    vfs.write(fd, b"hello from vfsctl\n").context("write")?;
    vfs.close(fd).context("close")?;

    let fd = vfs.open(&path, libc::O_RDONLY, 0).context("reopen")?;
    let mut buf = [0u8; 128];
    let n = vfs.read(fd, &mut buf).context("read")?;
    vfs.close(fd).context("close")?;

    log::info!("read back {n} bytes from {path}: {:?}", String::from_utf8_lossy(&buf[..n]));
    vfs.unmount(root).context("unmount")?;
    Ok(())
}

/// A self-contained RAM backend so this binary has no other crate
/// dependency beyond `corevfs` itself; a real deployment registers its own
/// [`corevfs::FilesystemFactory`] instead.
mod demo_backend {
    use std::path::Path;
    use std::sync::Mutex;

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
        path: std::path::PathBuf,
        data: Vec<u8>,
    }

    struct Token {
        index: usize,
        cursor: usize,
    }

    pub struct RamFs {
        root: String,
        flags: MountFlags,
        files: Vec<RamFile>,
    }

    impl RamFs {
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
        fn close(&mut self, _handle: &mut FileHandle) -> VfsResult<()> {
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
    }

    pub struct RamFsFactory;

    impl FilesystemFactory for RamFsFactory {
        fn create_filesystem(&self, _device: Box<dyn BlockDevice>, _flags: MountFlags) -> Box<dyn Filesystem> {
            Box::new(RamFs {
                root: String::new(),
                flags: MountFlags::empty(),
                files: Vec::new(),
            })
        }
    }

    #[allow(dead_code)]
    fn assert_dir_handle_type(_h: &DirectoryHandle) {}
}
