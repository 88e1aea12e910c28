//! Directory operations for virtual filesystems.

use std::path::Path;

use crate::{DirEntry, FsError};

/// Directory operations for a virtual filesystem.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDir`.
pub trait FsDir: Send + Sync {
    /// List the immediate children of a directory.
    ///
    /// A symlink at `path` is followed. Entry paths are expressed under
    /// `path` as given, not under the resolved location. Order is
    /// unspecified.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::WrongType`] if the path is not a directory
    fn contents_of_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;

    /// Create a directory and all missing parent directories.
    ///
    /// Idempotent: an existing directory anywhere along the path, including
    /// the final component, is not an error. Symlinks to directories along
    /// the path are followed.
    ///
    /// # Errors
    ///
    /// - [`FsError::WrongType`] if a component exists but is not a directory
    /// - [`FsError::AlreadyExists`] if `path` is the root
    fn create_dir(&self, path: &Path) -> Result<(), FsError>;
}
