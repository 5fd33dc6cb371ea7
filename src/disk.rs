//! A [`Disk`] wraps one [`BlockDevice`] and the partitions parsed out of its
//! MBR (§4.2). All access to the underlying device is serialized through one
//! mutex so sibling [`crate::partition::Partition`] views never race.

use parking_lot::Mutex;

use crate::block_device::{BlockDevice, SectorT};
use crate::error::{VfsError, VfsResult};
use crate::mbr::{self, MbrPartition};
use crate::partition::Partition;

pub struct Disk {
    device: Box<dyn BlockDevice>,
    mutex: Mutex<()>,
    partitions: Vec<MbrPartition>,
}

impl Disk {
    /// Probes `device`, reads its MBR (if any) and builds the partition
    /// list. A missing `55 AA` signature is not an error: the disk is kept
    /// with zero partitions, since a raw filesystem may live at sector 0.
    pub fn create(device: Box<dyn BlockDevice>) -> VfsResult<Self> {
        let sector_size = device.sector_size();
        let sector_count = device.sector_count();

        let mut sector = vec![0u8; sector_size.max(mbr::MBR_SECTOR_SIZE)];
        device.read(&mut sector, 0, 1)?;

        let partitions = match mbr::parse(&sector, sector_count) {
            Ok(parts) => parts,
            Err(VfsError::NoPartitionTable) => {
                log::info!("disk '{}' has no MBR signature; treating as raw", device.name());
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Disk {
            device,
            mutex: Mutex::new(()),
            partitions,
        })
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn mbr_partition(&self, index: u8) -> Option<&MbrPartition> {
        self.partitions.get(index as usize)
    }

    /// Builds the owned [`Partition`] view for `index` of `disk`, or `None`
    /// if out of range. `disk` is shared (not borrowed) because the
    /// resulting `Partition` outlives any single lookup and must keep
    /// forwarding reads/writes back into the same disk instance.
    pub fn borrow_partition(disk: &std::sync::Arc<Disk>, index: u8) -> Option<Partition> {
        let info = *disk.partitions.get(index as usize)?;
        Some(Partition::new(std::sync::Arc::clone(disk), info))
    }

    pub fn probe(&self) -> VfsResult<()> {
        let _guard = self.mutex.lock();
        self.device.probe()
    }

    pub fn flush(&self) -> VfsResult<()> {
        let _guard = self.mutex.lock();
        self.device.flush()
    }

    pub fn read(&self, dst: &mut [u8], lba: SectorT, count: usize) -> VfsResult<()> {
        let _guard = self.mutex.lock();
        self.device.read(dst, lba, count)
    }

    pub fn write(&self, src: &[u8], lba: SectorT, count: usize) -> VfsResult<()> {
        let _guard = self.mutex.lock();
        self.device.write(src, lba, count)
    }

    pub fn sector_size(&self) -> usize {
        self.device.sector_size()
    }

    pub fn sector_count(&self) -> SectorT {
        self.device.sector_count()
    }

    pub fn name(&self) -> String {
        self.device.name()
    }
}

/// Lets a whole, unpartitioned disk be mounted directly as a block device
/// (§4.3 "raw device" mount), the same way a [`Partition`] wraps one slice
/// of it.
impl BlockDevice for std::sync::Arc<Disk> {
    fn probe(&self) -> VfsResult<()> {
        Disk::probe(self)
    }

    fn flush(&self) -> VfsResult<()> {
        Disk::flush(self)
    }

    fn read(&self, dst: &mut [u8], lba: SectorT, count: usize) -> VfsResult<()> {
        Disk::read(self, dst, lba, count)
    }

    fn write(&self, src: &[u8], lba: SectorT, count: usize) -> VfsResult<()> {
        Disk::write(self, src, lba, count)
    }

    fn sector_size(&self) -> usize {
        Disk::sector_size(self)
    }

    fn sector_count(&self) -> SectorT {
        Disk::sector_count(self)
    }

    fn name(&self) -> String {
        Disk::name(self)
    }
}
