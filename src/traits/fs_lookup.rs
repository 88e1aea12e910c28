//! Node classification for virtual filesystems.

use std::path::Path;

use crate::{Capabilities, FsError, NodeType};

/// Classify the node at a path.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsLookup`.
pub trait FsLookup: Send + Sync {
    /// Kind of the node at `path`, without following a final symlink.
    ///
    /// Symlinks in ancestor components are followed. Returns `Ok(None)` if
    /// nothing exists there.
    ///
    /// # Errors
    ///
    /// - [`FsError::CircularChain`] if an ancestor link loops
    /// - [`FsError::InvalidCall`] if the path is relative
    fn node_type(&self, path: &Path) -> Result<Option<NodeType>, FsError>;

    /// Kind of the node `path` ultimately resolves to.
    ///
    /// Returns `Ok(None)` if nothing exists there, including a dangling link.
    ///
    /// # Errors
    ///
    /// - [`FsError::CircularChain`] if resolution loops
    /// - [`FsError::InvalidCall`] if the path is relative
    fn node_type_following_symlinks(&self, path: &Path) -> Result<Option<NodeType>, FsError>;

    /// Optional parts of the contract this backend provides.
    fn capabilities(&self) -> Capabilities;
}
