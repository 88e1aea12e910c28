//! Core types for the nodefs filesystem abstraction.

use std::fmt;
use std::path::PathBuf;

/// Kind of a filesystem node.
///
/// The set is closed. [`Symlink`](NodeType::Symlink) and
/// [`Alias`](NodeType::Alias) are *resolvable*: they can be dereferenced to
/// another node. [`Special`](NodeType::Special) covers FIFOs, sockets and
/// devices, which only support identity operations (move, rename, delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeType {
    /// Directory.
    Dir,
    /// Regular file.
    File,
    /// Symbolic link.
    Symlink,
    /// FIFO, socket, device or other opaque node.
    Special,
    /// Platform alias node. Resolvable like a symlink.
    Alias,
}

impl NodeType {
    /// Every kind, in declaration order.
    pub const ALL: [NodeType; 5] = [
        NodeType::Dir,
        NodeType::File,
        NodeType::Symlink,
        NodeType::Special,
        NodeType::Alias,
    ];

    /// Returns `true` for kinds that can be dereferenced to another node.
    #[inline]
    pub const fn is_resolvable(self) -> bool {
        matches!(self, NodeType::Symlink | NodeType::Alias)
    }

    /// Returns `true` for kinds a caller can create directly.
    ///
    /// Special nodes can only be injected by a test harness.
    #[inline]
    pub const fn is_creatable(self) -> bool {
        !matches!(self, NodeType::Special)
    }

    /// Lowercase name used in messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeType::Dir => "dir",
            NodeType::File => "file",
            NodeType::Symlink => "symlink",
            NodeType::Special => "special",
            NodeType::Alias => "alias",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory entry returned from `contents_of_directory`.
///
/// The path is expressed under the directory path the caller asked for, even
/// when that path went through a symlink.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Full path to the entry.
    pub path: PathBuf,
    /// Kind of the entry, not following a final symlink.
    pub node_type: NodeType,
}

/// Well-known system locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WellKnownDir {
    /// The user's home directory.
    Home,
    /// The user's downloads directory.
    Downloads,
    /// The user's documents directory.
    Documents,
    /// The user's cache directory.
    Cache,
    /// The shared temporary directory.
    Temporary,
    /// A fresh directory inside [`Temporary`](WellKnownDir::Temporary),
    /// distinct on every lookup.
    UniqueTemporary,
}

/// Optional parts of the contract a backend provides.
///
/// Calls that need a disabled capability fail with
/// [`FsError::NotSupported`](crate::FsError::NotSupported).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capabilities {
    /// Symbolic links can be created and read.
    pub symlinks: bool,
    /// Extended attributes can be read and written.
    pub xattrs: bool,
    /// Alias nodes exist.
    pub aliases: bool,
}

impl Capabilities {
    /// Everything enabled.
    pub const ALL: Self = Self {
        symlinks: true,
        xattrs: true,
        aliases: true,
    };

    /// What the host OS backend provides.
    pub const NATIVE: Self = Self {
        symlinks: cfg!(unix),
        xattrs: cfg!(unix),
        aliases: false,
    };

    /// Symlinks only.
    pub const MINIMAL: Self = Self {
        symlinks: true,
        xattrs: false,
        aliases: false,
    };
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolvable_kinds() {
        let resolvable: Vec<_> = NodeType::ALL
            .into_iter()
            .filter(|kind| kind.is_resolvable())
            .collect();
        assert_eq!(resolvable, vec![NodeType::Symlink, NodeType::Alias]);
    }

    #[test]
    fn special_is_not_creatable() {
        assert!(!NodeType::Special.is_creatable());
        assert!(NodeType::Dir.is_creatable());
        assert!(NodeType::Alias.is_creatable());
    }

    #[test]
    fn node_type_display() {
        assert_eq!(NodeType::Dir.to_string(), "dir");
        assert_eq!(NodeType::Special.to_string(), "special");
    }

    #[test]
    fn native_capabilities_never_have_aliases() {
        assert!(!Capabilities::NATIVE.aliases);
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NodeType>();
        assert_send_sync::<DirEntry>();
        assert_send_sync::<WellKnownDir>();
        assert_send_sync::<Capabilities>();
    }
}
