//! The [`BlockDevice`] capability the core consumes from hardware drivers
//! (§4.1). Concrete drivers live outside this crate; `corevfs` only ever
//! borrows one through this trait.

use crate::error::VfsResult;

/// Zero-based sector address, local to the device's own LBA 0.
pub type SectorT = u64;

/// A random-access, sector-addressed storage device.
///
/// All transfers are whole-sector; partial-sector reads/writes are not part
/// of this contract. Implementors guarantee `lba` is interpreted relative to
/// the device's own sector 0 — any partitioning is handled above this trait
/// by [`crate::partition::Partition`].
pub trait BlockDevice: Send + Sync {
    /// One-shot initialization. Implementations may treat repeated calls as
    /// a no-op; failure semantics beyond that are left to the backend.
    fn probe(&self) -> VfsResult<()>;

    /// Commit any pending writes.
    fn flush(&self) -> VfsResult<()>;

    /// Read `count` whole sectors starting at `lba` into `dst`.
    ///
    /// `dst` must be at least `count * sector_size()` bytes.
    fn read(&self, dst: &mut [u8], lba: SectorT, count: usize) -> VfsResult<()>;

    /// Write `count` whole sectors starting at `lba` from `src`.
    ///
    /// `src` must be at least `count * sector_size()` bytes.
    fn write(&self, src: &[u8], lba: SectorT, count: usize) -> VfsResult<()>;

    /// Size of one sector, in bytes.
    fn sector_size(&self) -> usize;

    /// Total number of sectors addressable on this device.
    fn sector_count(&self) -> SectorT;

    /// Stable device name used to build partition names and mount-all scans.
    fn name(&self) -> String;
}
