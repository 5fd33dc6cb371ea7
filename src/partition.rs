//! [`Partition`]: a sector-translated [`BlockDevice`] view over a slice of a
//! [`Disk`] (§4.2, §6).

use std::sync::Arc;

use crate::block_device::{BlockDevice, SectorT};
use crate::disk::Disk;
use crate::error::VfsResult;
use crate::mbr::MbrPartition;

/// Builds the persistent partition identifier `"<disk_name>p<physical_index>"`.
pub fn partition_name(disk_name: &str, physical_index: u8) -> String {
    format!("{disk_name}p{physical_index}")
}

/// Splits a partition name on its last `'p'` into `(disk_name, physical_index)`.
/// Returns `None` if there is no `'p'` or the suffix is not a valid index.
pub fn split_partition_name(name: &str) -> Option<(&str, u8)> {
    let p = name.rfind('p')?;
    let (disk, idx) = (&name[..p], &name[p + 1..]);
    idx.parse().ok().map(|idx| (disk, idx))
}

#[derive(Clone)]
pub struct Partition {
    disk: Arc<Disk>,
    info: MbrPartition,
}

impl Partition {
    pub(crate) fn new(disk: Arc<Disk>, info: MbrPartition) -> Self {
        Partition { disk, info }
    }

    pub fn info(&self) -> MbrPartition {
        self.info
    }

    fn translate(&self, lba: SectorT) -> SectorT {
        lba + self.info.start_lba
    }
}

impl BlockDevice for Partition {
    fn probe(&self) -> VfsResult<()> {
        self.disk.probe()
    }

    fn flush(&self) -> VfsResult<()> {
        self.disk.flush()
    }

    fn read(&self, dst: &mut [u8], lba: SectorT, count: usize) -> VfsResult<()> {
        self.disk.read(dst, self.translate(lba), count)
    }

    fn write(&self, src: &[u8], lba: SectorT, count: usize) -> VfsResult<()> {
        self.disk.write(src, self.translate(lba), count)
    }

    fn sector_size(&self) -> usize {
        self.disk.sector_size()
    }

    fn sector_count(&self) -> SectorT {
        self.info.sector_count
    }

    fn name(&self) -> String {
        partition_name(&self.disk.name(), self.info.physical_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trips_through_split() {
        let name = partition_name("ram0", 2);
        assert_eq!(name, "ram0p2");
        assert_eq!(split_partition_name(&name), Some(("ram0", 2)));
    }

    #[test]
    fn raw_disk_name_has_no_partition_suffix() {
        assert_eq!(split_partition_name("ram0"), None);
    }
}
