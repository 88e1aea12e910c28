//! Error types for the nodefs filesystem abstraction.

use std::path::PathBuf;

use crate::NodeType;

/// Filesystem error type with contextual variants.
///
/// Every variant carries the path, node kind, or attribute name that caused the
/// failure. Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use nodefs::{FsError, NodeType};
/// use std::path::PathBuf;
///
/// let err = FsError::WrongType { path: PathBuf::from("/etc"), actual: NodeType::Dir };
/// assert_eq!(err.to_string(), "wrong node type at /etc: found dir");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Node Errors
    /// No node exists at the path.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// A node exists but is not the kind the operation requires.
    #[error("wrong node type at {path}: found {actual}")]
    WrongType {
        /// The path of the offending node.
        path: PathBuf,
        /// The kind that was actually found.
        actual: NodeType,
    },

    /// Creation or rename targets a path that is already occupied.
    #[error("already exists: {path} ({existing})")]
    AlreadyExists {
        /// The occupied path.
        path: PathBuf,
        /// The kind of the node occupying the path.
        existing: NodeType,
    },

    /// Symlink or alias resolution looped back on itself.
    #[error("circular resolution chain starting at {path}")]
    CircularChain {
        /// The first link entered on the way into the loop.
        path: PathBuf,
    },

    /// A structural precondition of the call was violated.
    #[error("invalid call for {path}: {reason}")]
    InvalidCall {
        /// The path the call was made with.
        path: PathBuf,
        /// Why the call is invalid.
        reason: &'static str,
    },

    /// One node is not nested under the other.
    #[error("{path} is not a descendant of {ancestor}")]
    NotADescendant {
        /// The would-be descendant.
        path: PathBuf,
        /// The would-be ancestor.
        ancestor: PathBuf,
    },

    /// File contents could not be interpreted as requested (e.g. not UTF-8).
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The file whose contents were rejected.
        path: PathBuf,
        /// What was wrong with them.
        details: String,
    },

    // Extended Attribute Errors
    /// Attribute name exceeds the configured maximum length.
    #[error("attribute name too long: {name} (max {max} bytes)")]
    AttributeNameTooLong {
        /// The rejected attribute name.
        name: String,
        /// The configured maximum length.
        max: usize,
    },

    /// Attribute name is not allowed on this node.
    #[error("attribute not supported: {name} on {path}")]
    AttributeNotSupported {
        /// The node the attribute was addressed to.
        path: PathBuf,
        /// The rejected attribute name.
        name: String,
    },

    // Backend/Operation Errors
    /// Operation is disabled by the backend's capabilities.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an OS error, mapping the common kinds onto specific variants.
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound { path },
            _ if is_loop(&error) => FsError::CircularChain { path },
            _ => FsError::Io {
                operation,
                path,
                source: error,
            },
        }
    }
}

#[cfg(unix)]
fn is_loop(error: &std::io::Error) -> bool {
    error.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_loop(_error: &std::io::Error) -> bool {
    false
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        FsError::io("io", PathBuf::new(), error)
    }
}
