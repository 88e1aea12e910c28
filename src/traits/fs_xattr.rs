//! Extended attribute operations.
//!
//! This module provides the [`FsXattr`] trait which enables extended
//! attribute (xattr) operations. Extended attributes are name-value pairs
//! associated with any node, including symlinks, which are addressed
//! without being followed.
//!
//! # Example
//!
//! ```rust
//! use nodefs::{FsXattr, FsError};
//! use std::path::Path;
//!
//! // Generic function that works with any FsXattr implementation
//! fn tag_node<B: FsXattr>(backend: &B, path: &Path, tag: &str) -> Result<(), FsError> {
//!     backend.set_xattr(path, "user.tag", tag.as_bytes())?;
//!
//!     let names = backend.xattr_names(path)?;
//!     println!("node has {} extended attributes", names.len());
//!     Ok(())
//! }
//! ```

use std::path::Path;

use crate::FsError;

/// Extended attribute operations.
///
/// Every method resolves the ancestors of `path` but never a final symlink.
pub trait FsXattr: Send + Sync {
    /// Names of all attributes set on the node.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the node doesn't exist
    /// - [`FsError::NotSupported`] if the backend has no extended attributes
    fn xattr_names(&self, path: &Path) -> Result<Vec<String>, FsError>;

    /// Value of an attribute, or `None` if it is not set.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the node doesn't exist
    /// - [`FsError::AttributeNotSupported`] if the name is not allowed on the node
    fn get_xattr(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>, FsError>;

    /// Create or overwrite an attribute.
    ///
    /// Nothing is written when the name is rejected.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the node doesn't exist
    /// - [`FsError::AttributeNameTooLong`] if the name exceeds the configured limit
    /// - [`FsError::AttributeNotSupported`] if the name is not allowed on the node
    fn set_xattr(&self, path: &Path, name: &str, value: &[u8]) -> Result<(), FsError>;

    /// Remove an attribute. Removing an absent attribute succeeds.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the node doesn't exist
    /// - [`FsError::AttributeNotSupported`] if the name is not allowed on the node
    fn remove_xattr(&self, path: &Path, name: &str) -> Result<(), FsError>;
}
