//! POSIX-flavored error taxonomy shared by every layer of the VFS core.

/// The error type every fallible core operation returns.
///
/// Mirrors the `std::error_code`/`result<T>` split of the originating C++
/// design with a single Rust enum: payload-bearing operations use
/// `VfsResult<T>`, payload-less ones use `VfsResult<()>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VfsError {
    /// Malformed input: null/relative path, unknown disk or partition name,
    /// unsupported fstype inference, unknown unmount root, negative seek.
    #[error("invalid argument")]
    Invalid,
    /// Unknown mount point for a path, or end-of-directory sentinel.
    #[error("no such file or directory")]
    NotFound,
    /// Descriptor not present in the descriptor table.
    #[error("bad file descriptor")]
    BadDescriptor,
    /// Registering an already-registered filesystem type, or mounting an
    /// already-occupied root.
    #[error("file exists")]
    AlreadyExists,
    /// Write/modify attempt on a read-only mount.
    #[error("permission denied")]
    ReadOnly,
    /// Two-path operation whose paths resolve to different mount points.
    #[error("cross-device link")]
    CrossDevice,
    /// `mount_all` invoked with zero registered block devices.
    #[error("no such device")]
    NoDevices,
    /// Operation unsupported at this layer, or by the backend.
    #[error("operation not supported")]
    NotSupported,
    /// Directory entry name exceeds the adapter-surface buffer.
    #[error("value too large")]
    Overflow,
    /// Absent MBR signature; benign, surfaces as "no partitions".
    #[error("no such device or address")]
    NoPartitionTable,
    /// Allocation failure while opening a directory.
    #[error("out of memory")]
    OutOfMemory,
    /// A raw POSIX errno forwarded verbatim from a backend, for codes the
    /// core itself has no named variant for.
    #[error("errno {0}")]
    Errno(i32),
}

impl VfsError {
    /// The POSIX `errno` value this variant corresponds to, for adapters
    /// that need to set the process-global `errno`.
    pub fn raw_os_error(self) -> i32 {
        match self {
            VfsError::Invalid => libc::EINVAL,
            VfsError::NotFound => libc::ENOENT,
            VfsError::BadDescriptor => libc::EBADF,
            VfsError::AlreadyExists => libc::EEXIST,
            VfsError::ReadOnly => libc::EACCES,
            VfsError::CrossDevice => libc::EXDEV,
            VfsError::NoDevices => libc::ENOTBLK,
            VfsError::NotSupported => libc::ENOTSUP,
            VfsError::Overflow => libc::EOVERFLOW,
            VfsError::NoPartitionTable => libc::ENXIO,
            VfsError::OutOfMemory => libc::ENOMEM,
            VfsError::Errno(e) => e,
        }
    }

    /// Wrap a raw POSIX errno, mapping it to a named variant when one
    /// matches and falling back to [`VfsError::Errno`] otherwise.
    pub fn from_errno(errno: i32) -> Self {
        match errno {
            libc::EINVAL => VfsError::Invalid,
            libc::ENOENT => VfsError::NotFound,
            libc::EBADF => VfsError::BadDescriptor,
            libc::EEXIST => VfsError::AlreadyExists,
            libc::EACCES => VfsError::ReadOnly,
            libc::EXDEV => VfsError::CrossDevice,
            libc::ENOTBLK => VfsError::NoDevices,
            libc::ENOTSUP => VfsError::NotSupported,
            libc::EOVERFLOW => VfsError::Overflow,
            libc::ENXIO => VfsError::NoPartitionTable,
            libc::ENOMEM => VfsError::OutOfMemory,
            other => VfsError::Errno(other),
        }
    }
}

/// Result alias used throughout the crate in place of a bare `Result<T, VfsError>`.
pub type VfsResult<T> = Result<T, VfsError>;

/// A marker so `VfsError` can still be formatted through `{}` when wrapped
/// in `Box<dyn std::error::Error>` at an application boundary (e.g. the
/// `vfsctl` demo binary, via `anyhow`).
impl From<VfsError> for std::io::Error {
    fn from(e: VfsError) -> Self {
        std::io::Error::from_raw_os_error(e.raw_os_error())
    }
}

/// Helper for call sites that want to log-and-convert in one step.
pub(crate) fn log_and_return<T>(context: &str, err: VfsError) -> VfsResult<T> {
    log::error!("{context}: {err}");
    Err(err)
}
