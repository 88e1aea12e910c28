//! # Path Model
//!
//! Lexical path manipulation shared by every backend.
//!
//! Paths are plain [`std::path::Path`] values. [`PathExt`] adds the
//! component-wise operations the engine needs (root checks, last component,
//! ancestor stripping, prefix rewriting) and [`normalize`] removes `.` and `..`
//! without touching any filesystem.
//!
//! ```rust
//! use nodefs::PathExt;
//! use std::path::{Path, PathBuf};
//!
//! let path = Path::new("/a/./b/../c");
//! assert_eq!(path.normalized(), PathBuf::from("/a/c"));
//! assert_eq!(Path::new("/a/c/d").strip_ancestor(Path::new("/a")).unwrap(), PathBuf::from("c/d"));
//! ```

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::FsError;

/// Component-wise helpers for [`Path`].
pub trait PathExt {
    /// Returns `true` if the path is exactly the root directory.
    fn is_root(&self) -> bool;

    /// The final normal component, if any.
    fn last_component(&self) -> Option<&OsStr>;

    /// The path with its final component removed. The root stays the root.
    fn removing_last_component(&self) -> PathBuf;

    /// Lexically normalized copy. See [`normalize`].
    fn normalized(&self) -> PathBuf;

    /// Returns `true` if `self` lies strictly below `ancestor`.
    fn is_descendant_of(&self, ancestor: &Path) -> bool;

    /// The relative path leading from `ancestor` down to `self`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADescendant`] if `self` is not strictly below `ancestor`
    fn strip_ancestor(&self, ancestor: &Path) -> Result<PathBuf, FsError>;

    /// Replace the `from` prefix with `to`. `None` if `from` is not a prefix.
    fn rebase(&self, from: &Path, to: &Path) -> Option<PathBuf>;
}

impl PathExt for Path {
    fn is_root(&self) -> bool {
        let mut components = self.components();
        matches!(components.next(), Some(Component::RootDir)) && components.next().is_none()
    }

    fn last_component(&self) -> Option<&OsStr> {
        match self.components().next_back()? {
            Component::Normal(name) => Some(name),
            _ => None,
        }
    }

    fn removing_last_component(&self) -> PathBuf {
        match self.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::new(),
            None => self.to_path_buf(),
        }
    }

    fn normalized(&self) -> PathBuf {
        normalize(self)
    }

    fn is_descendant_of(&self, ancestor: &Path) -> bool {
        self != ancestor && self.starts_with(ancestor)
    }

    fn strip_ancestor(&self, ancestor: &Path) -> Result<PathBuf, FsError> {
        if !self.is_descendant_of(ancestor) {
            return Err(FsError::NotADescendant {
                path: self.to_path_buf(),
                ancestor: ancestor.to_path_buf(),
            });
        }
        Ok(self
            .strip_prefix(ancestor)
            .map(Path::to_path_buf)
            .unwrap_or_default())
    }

    fn rebase(&self, from: &Path, to: &Path) -> Option<PathBuf> {
        let rest = self.strip_prefix(from).ok()?;
        if rest.as_os_str().is_empty() {
            Some(to.to_path_buf())
        } else {
            Some(to.join(rest))
        }
    }
}

/// Lexical path normalization without filesystem access.
///
/// Handles `.`, `..`, and repeated separators but does NOT follow symlinks.
/// `..` at the root stays at the root; leading `..` in a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => {
                normalized.push(Component::RootDir.as_os_str());
                depth = 0;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    normalized.pop();
                    depth -= 1;
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            Component::Normal(name) => {
                normalized.push(name);
                depth += 1;
            }
        }
    }

    normalized
}

/// Normalize a path the engine is about to key on, rejecting relative paths.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf, FsError> {
    if !path.has_root() {
        return Err(FsError::InvalidCall {
            path: path.to_path_buf(),
            reason: "path must be absolute",
        });
    }
    Ok(normalize(path))
}

/// Check a single-component node name used by rename and child creation.
pub(crate) fn validate_name(path: &Path, name: &str) -> Result<(), FsError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
        "name contains a path separator"
    } else if name == "." || name == ".." {
        "name is a relative component"
    } else {
        return Ok(());
    };
    Err(FsError::InvalidCall {
        path: path.to_path_buf(),
        reason,
    })
}
