//! Registry of live [`Disk`]s, keyed by device name (§2, §4.2).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::block_device::BlockDevice;
use crate::disk::Disk;
use crate::error::{VfsError, VfsResult};

#[derive(Default)]
pub struct DiskManager {
    disks: Mutex<HashMap<String, Arc<Disk>>>,
}

impl DiskManager {
    pub fn new() -> Self {
        DiskManager::default()
    }

    /// Probes `device`, parses its MBR and registers it under its own
    /// reported name. Fails with [`VfsError::AlreadyExists`] if that name is
    /// already registered.
    pub fn register_device(&self, device: Box<dyn BlockDevice>) -> VfsResult<Arc<Disk>> {
        let name = device.name();
        let mut disks = self.disks.lock();
        if disks.contains_key(&name) {
            return Err(VfsError::AlreadyExists);
        }

        device.probe()?;
        let disk = Arc::new(Disk::create(device)?);
        disks.insert(name, Arc::clone(&disk));
        Ok(disk)
    }

    pub fn unregister_device(&self, name: &str) -> VfsResult<()> {
        let mut disks = self.disks.lock();
        if disks.remove(name).is_none() {
            return Err(VfsError::NotFound);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Disk>> {
        self.disks.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.disks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every registered disk name, for `mount_all`'s scan.
    pub fn disk_names(&self) -> Vec<String> {
        self.disks.lock().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RamBlockDevice;

    #[test]
    fn duplicate_registration_is_rejected() {
        let mgr = DiskManager::new();
        mgr.register_device(Box::new(RamBlockDevice::new("ram0", 4096))).unwrap();
        let err = mgr
            .register_device(Box::new(RamBlockDevice::new("ram0", 4096)))
            .unwrap_err();
        assert_eq!(err, VfsError::AlreadyExists);
    }

    #[test]
    fn unregister_unknown_device_fails() {
        let mgr = DiskManager::new();
        assert_eq!(mgr.unregister_device("missing").unwrap_err(), VfsError::NotFound);
    }
}
