//! Read operations for virtual filesystems.

use std::path::Path;

use crate::FsError;

/// Read file contents.
///
/// Both methods resolve `path` fully, so a symlink to a file reads the file.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Backends should use interior
/// mutability (`Mutex`) for thread-safe state management.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Read entire file contents as bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::WrongType`] if the path resolves to anything but a file
    /// - [`FsError::CircularChain`] if resolution loops
    fn contents_of_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Size of a file in bytes.
    ///
    /// # Errors
    ///
    /// Same as [`contents_of_file`](Self::contents_of_file).
    fn size_of_file(&self, path: &Path) -> Result<u64, FsError>;
}
