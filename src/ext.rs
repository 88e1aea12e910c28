//! # Extension Traits
//!
//! Convenience methods for any [`Fs`] backend.
//!
//! [`FsExt`] answers common yes/no questions without making callers match on
//! `Option<NodeType>`. Every method is a default method with a blanket
//! implementation, so both backends (and `&dyn Fs`) get them for free.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`exists`](FsExt::exists) | Anything at the path (final link not followed) |
//! | [`is_dir`](FsExt::is_dir) | Directory, following symlinks |
//! | [`is_file`](FsExt::is_file) | Regular file, following symlinks |
//! | [`is_resolvable`](FsExt::is_resolvable) | Symlink or alias at the path itself |
//! | [`contents_string_of_file`](FsExt::contents_string_of_file) | UTF-8 file contents |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature, `FsExtJson` adds `read_json` and `write_json`.
//!
//! ```toml
//! [dependencies]
//! nodefs = { version = "0.1", features = ["serde"] }
//! ```

use std::path::Path;

use crate::{Fs, FsError, NodeType};

/// Extension methods for any filesystem backend.
///
/// # Example
///
/// ```rust
/// use nodefs::{FsDir, FsExt, MockFs};
/// use std::path::Path;
///
/// let fs = MockFs::new();
/// fs.create_dir(Path::new("/data")).unwrap();
///
/// assert!(fs.is_dir(Path::new("/data")).unwrap());
/// assert!(!fs.is_file(Path::new("/data")).unwrap());
/// assert!(!fs.exists(Path::new("/config.json")).unwrap());
/// ```
pub trait FsExt: Fs {
    /// Returns `true` if any node exists at the path.
    ///
    /// A dangling symlink exists. Only resolution failures such as
    /// [`FsError::CircularChain`] in an ancestor are errors.
    fn exists(&self, path: &Path) -> Result<bool, FsError> {
        Ok(self.node_type(path)?.is_some())
    }

    /// Returns `true` if the path resolves to a directory.
    ///
    /// Returns `Ok(false)` for missing paths and dangling links.
    fn is_dir(&self, path: &Path) -> Result<bool, FsError> {
        Ok(self.node_type_following_symlinks(path)? == Some(NodeType::Dir))
    }

    /// Returns `true` if the path resolves to a regular file.
    ///
    /// Returns `Ok(false)` for missing paths and dangling links.
    fn is_file(&self, path: &Path) -> Result<bool, FsError> {
        Ok(self.node_type_following_symlinks(path)? == Some(NodeType::File))
    }

    /// Returns `true` if the path itself is a symlink or alias.
    fn is_resolvable(&self, path: &Path) -> Result<bool, FsError> {
        Ok(self.node_type(path)?.is_some_and(NodeType::is_resolvable))
    }

    /// Read a file as UTF-8.
    ///
    /// # Errors
    ///
    /// - anything [`contents_of_file`](crate::FsRead::contents_of_file) returns
    /// - [`FsError::InvalidData`] if the contents are not UTF-8
    fn contents_string_of_file(&self, path: &Path) -> Result<String, FsError> {
        String::from_utf8(self.contents_of_file(path)?).map_err(|err| FsError::InvalidData {
            path: path.to_path_buf(),
            details: err.to_string(),
        })
    }
}

impl<B: Fs + ?Sized> FsExt for B {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    /// JSON helpers. Available with the `serde` feature.
    pub trait FsExtJson: Fs {
        /// Read a file and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - [`FsError::NotFound`] if the file does not exist
        /// - [`FsError::Deserialization`] if the JSON does not parse
        ///
        /// ```rust
        /// use nodefs::{FsExtJson, MockFs};
        /// use std::path::Path;
        ///
        /// let fs = MockFs::new();
        /// fs.write_json(Path::new("/config.json"), &vec![1, 2, 3]).unwrap();
        /// let back: Vec<u32> = fs.read_json(Path::new("/config.json")).unwrap();
        /// assert_eq!(back, [1, 2, 3]);
        /// ```
        fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, FsError> {
            let data = self.contents_of_file(path)?;
            serde_json::from_slice(&data).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize a value as pretty-printed JSON, creating the file if
        /// needed and replacing its contents.
        ///
        /// # Errors
        ///
        /// - [`FsError::Serialization`] if serialization fails
        /// - whatever `create_file` or `replace_contents_of_file` returns
        fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_vec_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            if self.node_type_following_symlinks(path)?.is_none() {
                self.create_file(path)?;
            }
            self.replace_contents_of_file(path, &json)
        }
    }

    impl<B: Fs + ?Sized> FsExtJson for B {}
}

#[cfg(feature = "serde")]
pub use json::FsExtJson;
