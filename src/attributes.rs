//! # Extended Attribute Subsystem
//!
//! Per-node name→bytes side tables and the naming rules applied to them.
//!
//! ## Namespaces
//!
//! Under [`NamespacePolicy::Linux`] attribute names follow the Linux kernel's
//! namespace convention:
//! - `user.*` - User-defined attributes (not allowed on symlinks)
//! - `system.*` - System-defined attributes
//! - `security.*` - Security-related attributes
//! - `trusted.*` - Trusted attributes
//!
//! Unprefixed names are rejected with
//! [`FsError::AttributeNotSupported`]. [`NamespacePolicy::Unrestricted`]
//! accepts any name.

use std::collections::BTreeMap;
use std::path::Path;

use crate::{FsError, NodeType};

/// Prefixes the Linux kernel recognises.
const LINUX_NAMESPACES: [&str; 4] = ["user.", "trusted.", "security.", "system."];

/// Which attribute names a backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NamespacePolicy {
    /// Any name is accepted.
    #[default]
    Unrestricted,
    /// Only recognised Linux prefixes, and no `user.` names on symlinks.
    Linux,
}

/// Validation rules for extended attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XattrPolicy {
    /// Longest accepted name, in bytes.
    pub max_name_len: usize,
    /// Namespace rules.
    pub namespaces: NamespacePolicy,
}

impl XattrPolicy {
    /// 255-byte names, any namespace.
    pub const PERMISSIVE: Self = Self {
        max_name_len: 255,
        namespaces: NamespacePolicy::Unrestricted,
    };

    /// What the Linux kernel enforces.
    pub const LINUX: Self = Self {
        max_name_len: 255,
        namespaces: NamespacePolicy::Linux,
    };

    /// Policy with a different name length limit.
    pub const fn with_max_name_len(self, max_name_len: usize) -> Self {
        Self {
            max_name_len,
            ..self
        }
    }

    /// Check a name before it is written.
    ///
    /// # Errors
    ///
    /// - [`FsError::AttributeNameTooLong`] if the name exceeds `max_name_len`
    /// - [`FsError::AttributeNotSupported`] if the namespace rules reject it
    pub fn check_set(&self, path: &Path, name: &str, on: NodeType) -> Result<(), FsError> {
        if name.len() > self.max_name_len {
            return Err(FsError::AttributeNameTooLong {
                name: name.to_string(),
                max: self.max_name_len,
            });
        }
        self.check_access(path, name, on)
    }

    /// Check a name before it is read or removed.
    ///
    /// # Errors
    ///
    /// - [`FsError::AttributeNotSupported`] if the namespace rules reject it
    pub fn check_access(&self, path: &Path, name: &str, on: NodeType) -> Result<(), FsError> {
        let allowed = match self.namespaces {
            NamespacePolicy::Unrestricted => true,
            NamespacePolicy::Linux => {
                LINUX_NAMESPACES.iter().any(|prefix| name.starts_with(prefix))
                    && !(on == NodeType::Symlink && name.starts_with("user."))
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(FsError::AttributeNotSupported {
                path: path.to_path_buf(),
                name: name.to_string(),
            })
        }
    }
}

impl Default for XattrPolicy {
    fn default() -> Self {
        Self::PERMISSIVE
    }
}

/// Attribute table owned by one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XattrTable(BTreeMap<String, Vec<u8>>);

impl XattrTable {
    pub(crate) fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.0.get(name).cloned()
    }

    pub(crate) fn set(&mut self, name: &str, value: &[u8]) {
        self.0.insert(name.to_string(), value.to_vec());
    }

    /// Removing an absent name is a no-op.
    pub(crate) fn remove(&mut self, name: &str) {
        self.0.remove(name);
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_at_limit_is_accepted() {
        let policy = XattrPolicy::PERMISSIVE.with_max_name_len(8);
        assert!(policy.check_set(Path::new("/f"), "user.abc", NodeType::File).is_ok());
    }

    #[test]
    fn name_over_limit_is_rejected() {
        let policy = XattrPolicy::PERMISSIVE.with_max_name_len(8);
        let err = policy
            .check_set(Path::new("/f"), "user.abcd", NodeType::File)
            .unwrap_err();
        assert!(matches!(err, FsError::AttributeNameTooLong { max: 8, .. }));
    }

    #[test]
    fn linux_rejects_unprefixed_names() {
        let err = XattrPolicy::LINUX
            .check_set(Path::new("/f"), "plain", NodeType::File)
            .unwrap_err();
        assert!(matches!(err, FsError::AttributeNotSupported { .. }));
    }

    #[test]
    fn linux_rejects_user_names_on_symlinks() {
        let policy = XattrPolicy::LINUX;
        assert!(policy.check_set(Path::new("/l"), "user.tag", NodeType::File).is_ok());
        assert!(policy.check_set(Path::new("/l"), "user.tag", NodeType::Symlink).is_err());
        assert!(policy.check_set(Path::new("/l"), "trusted.tag", NodeType::Symlink).is_ok());
    }

    #[test]
    fn too_long_wins_over_namespace() {
        let policy = XattrPolicy::LINUX.with_max_name_len(3);
        let err = policy
            .check_set(Path::new("/f"), "plain", NodeType::File)
            .unwrap_err();
        assert!(matches!(err, FsError::AttributeNameTooLong { .. }));
    }

    #[test]
    fn table_remove_absent_is_noop() {
        let mut table = XattrTable::default();
        table.set("a", b"1");
        table.remove("missing");
        assert_eq!(table.names(), vec!["a".to_string()]);
        assert_eq!(table.get("a"), Some(b"1".to_vec()));
        assert_eq!(table.get("b"), None);
    }
}
