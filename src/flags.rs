//! Mount-flags bitset (§6 of the specification).
//!
//! Bit positions are part of the external API and must not be renumbered.

use bitflags::bitflags;

bitflags! {
    /// Flags attached to a [`crate::mount::MountPoint`] at mount time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MountFlags: u32 {
        /// Reject any mutating operation against this mount.
        const READ_ONLY = 1 << 0;
        /// Re-mount an already-mounted root with new flags.
        const REMOUNT = 1 << 5;
    }
}

impl MountFlags {
    pub fn is_read_only(self) -> bool {
        self.contains(MountFlags::READ_ONLY)
    }
}

/// Returns whether `open` access-mode bits (`O_ACCMODE`) request anything
/// other than read-only access.
pub fn requests_write(open_flags: i32) -> bool {
    (open_flags & libc::O_ACCMODE) != libc::O_RDONLY
}
