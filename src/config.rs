//! Static configuration loaded once at startup (§1.1, `vfs.toml`).

use serde::{Deserialize, Serialize};

use crate::error::{VfsError, VfsResult};
use crate::flags::MountFlags;

/// What `mount_all` should do when one disk in the scan fails to mount
/// while others succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountAllErrorPolicy {
    /// Keep whatever mounted successfully, log and skip the rest (default).
    BestEffort,
    /// Unmount everything `mount_all` managed to mount so far and fail.
    AllOrNothing,
}

impl Default for MountAllErrorPolicy {
    fn default() -> Self {
        MountAllErrorPolicy::BestEffort
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Root every auto-named mount is nested under, e.g. `/volume`.
    pub root_base: String,
    pub mount_all_error_policy: MountAllErrorPolicy,
    /// Flags applied to a mount when the caller doesn't specify any.
    pub default_mount_flags: u32,
}

impl Default for VfsConfig {
    fn default() -> Self {
        VfsConfig {
            root_base: "/volume".to_string(),
            mount_all_error_policy: MountAllErrorPolicy::default(),
            default_mount_flags: 0,
        }
    }
}

impl VfsConfig {
    pub fn default_flags(&self) -> MountFlags {
        MountFlags::from_bits_truncate(self.default_mount_flags)
    }

    pub fn from_toml_str(text: &str) -> VfsResult<Self> {
        toml::from_str(text).map_err(|e| {
            log::error!("failed to parse vfs config: {e}");
            VfsError::Invalid
        })
    }

    pub fn to_toml_string(&self) -> VfsResult<String> {
        toml::to_string_pretty(self).map_err(|_| VfsError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_base_matches_original_convention() {
        assert_eq!(VfsConfig::default().root_base, "/volume");
    }

    #[test]
    fn round_trips_through_toml() {
        let config = VfsConfig {
            root_base: "/mnt".to_string(),
            mount_all_error_policy: MountAllErrorPolicy::AllOrNothing,
            default_mount_flags: MountFlags::READ_ONLY.bits(),
        };
        let text = config.to_toml_string().unwrap();
        let parsed = VfsConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.root_base, "/mnt");
        assert_eq!(parsed.mount_all_error_policy, MountAllErrorPolicy::AllOrNothing);
        assert!(parsed.default_flags().is_read_only());
    }

    #[test]
    fn malformed_toml_is_invalid() {
        assert_eq!(VfsConfig::from_toml_str("not valid [[[ toml").unwrap_err(), VfsError::Invalid);
    }
}
