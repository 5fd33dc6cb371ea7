//! Filesystem-type identity: a name plus the set of MBR codes it claims
//! (§4.6, grounded on the original `vfs::fstype::Type`).

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::mbr::partition_code;

/// A named filesystem category plus the MBR partition-type codes that imply
/// it. Equality and hashing are by `name` only, matching
/// `std::hash<vfs::fstype::Type>` in the originating design: two `FsType`s
/// with the same name but different code sets are considered the same type.
#[derive(Debug, Clone)]
pub struct FsType {
    pub name: String,
    pub codes: Vec<u8>,
}

impl FsType {
    pub fn new(name: impl Into<String>, codes: Vec<u8>) -> Self {
        FsType {
            name: name.into(),
            codes,
        }
    }

    pub fn matches_code(&self, code: u8) -> bool {
        self.codes.contains(&code)
    }
}

impl PartialEq for FsType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for FsType {}

impl Hash for FsType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FsType {
    /// `ext`-family (Linux) filesystems, MBR type `0x83`.
    pub fn ext_family() -> FsType {
        FsType::new("ext", vec![partition_code::LINUX])
    }

    /// FAT-family filesystems across all three MBR codes §6 recognizes.
    pub fn fat_family() -> FsType {
        FsType::new(
            "vfat",
            vec![
                partition_code::FAT12,
                partition_code::FAT16B,
                partition_code::FAT32_CHS,
                partition_code::FAT32_LBA,
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_code_set() {
        let a = FsType::new("ext", vec![0x83]);
        let b = FsType::new("ext", vec![0x82]);
        assert_eq!(a, b);
    }

    #[test]
    fn fat_family_matches_all_fat_codes() {
        let fat = FsType::fat_family();
        assert!(fat.matches_code(partition_code::FAT12));
        assert!(fat.matches_code(partition_code::FAT16B));
        assert!(fat.matches_code(partition_code::FAT32_LBA));
        assert!(!fat.matches_code(partition_code::LINUX));
    }
}
