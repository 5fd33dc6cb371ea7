//! Stat-family value types returned by the public surface: per-file
//! metadata, directory entries and per-mount usage statistics (§4.5, §6,
//! grounded on the original adapters' `sys/dirent.h` and `sys/statvfs.h`).

use chrono::{DateTime, Utc};

use crate::flags::MountFlags;

/// File-type tag mirroring POSIX `dirent.d_type` / `stat.st_mode`'s type bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Unknown,
    Regular,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
}

/// Per-file metadata returned by `stat`/`fstat`.
#[derive(Debug, Clone)]
pub struct FileStat {
    pub file_type: FileType,
    pub size: u64,
    pub mode: u32,
    pub accessed_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for FileStat {
    fn default() -> Self {
        FileStat {
            file_type: FileType::Unknown,
            size: 0,
            mode: 0,
            accessed_at: None,
            modified_at: None,
            created_at: None,
        }
    }
}

/// One entry produced by `dirnext`.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub file_type: FileType,
    pub stat: FileStat,
}

/// Filesystem-usage summary, the POSIX `statvfs` equivalent.
#[derive(Debug, Clone, Default)]
pub struct VfsStat {
    pub block_size: u64,
    pub fragment_size: u64,
    pub blocks_total: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
    pub files_total: u64,
    pub files_free: u64,
}

/// Per-mount statistics surface (§4.7), composed from a backend's
/// `stat_vfs` result the way the original `get_mount_point_stats` helper
/// does.
#[derive(Debug, Clone)]
pub struct PartitionStats {
    pub disk_name: String,
    pub mount_point: String,
    pub type_name: String,
    pub flags: MountFlags,
    pub used_space: u64,
    pub free_space: u64,
}

pub fn partition_stats_from_vfs_stat(
    disk_name: String,
    mount_point: String,
    type_name: String,
    flags: MountFlags,
    vfs_stat: &VfsStat,
) -> PartitionStats {
    let free_space = vfs_stat.blocks_free * vfs_stat.block_size.max(1);
    let used_space = (vfs_stat.blocks_total * vfs_stat.fragment_size.max(1)).saturating_sub(free_space);
    PartitionStats {
        disk_name,
        mount_point,
        type_name,
        flags,
        used_space,
        free_space,
    }
}
