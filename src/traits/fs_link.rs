//! Symlink creation and resolution.

use std::path::{Path, PathBuf};

use crate::FsError;

/// Symbolic link operations.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsLink`.
pub trait FsLink: Send + Sync {
    /// Create a symlink at `link` pointing to `destination`.
    ///
    /// The destination is stored verbatim, absolute or relative, and is not
    /// resolved or checked.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent of `link` does not exist
    /// - [`FsError::AlreadyExists`] if `link` is occupied
    /// - [`FsError::NotSupported`] if the backend has no symlinks
    fn create_symlink(&self, link: &Path, destination: &Path) -> Result<(), FsError>;

    /// The destination stored in a symlink or alias.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing exists at `path`
    /// - [`FsError::WrongType`] if the node is not resolvable
    fn destination_of(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Canonical absolute path of an existing node, all links resolved.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the resolved node does not exist
    /// - [`FsError::CircularChain`] if resolution loops
    fn realpath_of(&self, path: &Path) -> Result<PathBuf, FsError>;
}
