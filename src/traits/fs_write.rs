//! Write operations for virtual filesystems.

use std::path::{Path, PathBuf};

use crate::FsError;

/// Write operations for a virtual filesystem.
///
/// # Copy and Move
///
/// [`copy_node`](FsWrite::copy_node) and [`move_node`](FsWrite::move_node)
/// resolve the ancestors of both paths, then decide where the node lands:
///
/// | destination | outcome |
/// |---|---|
/// | missing | placed at `destination` |
/// | directory | rehomed to `destination/<source name>` |
/// | file, special, alias | replaced in place |
/// | symlink to a directory | rehomed into the link's target |
/// | symlink to anything else | the link itself is replaced |
///
/// Both return the path the node ended up at. Extended attributes travel
/// with the node.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWrite`.
pub trait FsWrite: Send + Sync {
    /// Create an empty file. The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent does not exist
    /// - [`FsError::WrongType`] if the parent is not a directory
    /// - [`FsError::AlreadyExists`] if any node occupies `path`
    fn create_file(&self, path: &Path) -> Result<(), FsError>;

    /// Replace the contents of a file, following symlinks.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::WrongType`] if the path resolves to anything but a file
    fn replace_contents_of_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    /// Append to a file, following symlinks.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::WrongType`] if the path resolves to anything but a file
    fn append_contents_of_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    /// Delete a node and, for a directory, everything below it.
    ///
    /// A symlink at `path` is deleted itself, never its target.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing exists at `path`
    /// - [`FsError::InvalidCall`] if `path` is the root
    fn delete_node(&self, path: &Path) -> Result<(), FsError>;

    /// Copy a node (recursively for directories). Returns the final path.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source, or the destination's parent, is missing
    /// - [`FsError::InvalidCall`] if a directory would be copied into itself
    fn copy_node(&self, source: &Path, destination: &Path) -> Result<PathBuf, FsError>;

    /// Move a node. Returns the final path.
    ///
    /// Either the whole move happens or nothing does.
    ///
    /// # Errors
    ///
    /// Same as [`copy_node`](Self::copy_node).
    fn move_node(&self, source: &Path, destination: &Path) -> Result<PathBuf, FsError>;

    /// Rename a node within its directory. Returns the new path.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidCall`] if `new_name` contains a path separator
    /// - [`FsError::AlreadyExists`] if the sibling path is occupied
    /// - [`FsError::NotFound`] if the source does not exist
    fn rename_node(&self, source: &Path, new_name: &str) -> Result<PathBuf, FsError>;
}
