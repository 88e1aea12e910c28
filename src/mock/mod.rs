//! # In-Memory Engine
//!
//! [`MockFs`] keeps every node in a path-to-node map behind one
//! [`parking_lot::Mutex`]. Each contract call takes the lock once, so
//! multi-step operations such as move (copy, then delete, then roll back on
//! failure) are atomic with respect to other callers.
//!
//! Clones share the same store:
//!
//! ```rust
//! use nodefs::{FsRead, FsWrite, MockFs};
//! use std::path::Path;
//!
//! let fs = MockFs::new();
//! let shared = fs.clone();
//! fs.create_file(Path::new("/note")).unwrap();
//! shared.replace_contents_of_file(Path::new("/note"), b"hi").unwrap();
//! assert_eq!(fs.contents_of_file(Path::new("/note")).unwrap(), b"hi");
//! ```

mod ptn;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::path::PathExt;
use crate::{
    Capabilities, DirEntry, FsDir, FsError, FsKnownDirs, FsLink, FsLookup, FsRead, FsWrite,
    FsXattr, MockConfig, NodeType, WellKnownDir,
};

pub use ptn::Fault;
use ptn::{MockNode, Ptn, Transfer};

struct Inner {
    ptn: Mutex<Ptn>,
    config: MockConfig,
}

/// In-memory filesystem engine.
///
/// Cloning is cheap and yields a handle onto the same store. Two values
/// compare equal when they share a store.
#[derive(Clone)]
pub struct MockFs {
    inner: Arc<Inner>,
}

impl MockFs {
    /// Empty engine holding only `/`, with [`MockConfig::default`].
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Empty engine with custom settings.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                ptn: Mutex::new(Ptn::new()),
                config,
            }),
        }
    }

    /// The settings this engine was built with.
    pub fn config(&self) -> &MockConfig {
        &self.inner.config
    }

    /// Every path in the store, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().paths()
    }

    /// Place a special node (FIFO, socket, device stand-in) at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`FsWrite::create_file`].
    pub fn inject_special(&self, path: &Path) -> Result<(), FsError> {
        self.lock().create_leaf(path, MockNode::special())
    }

    /// Place an alias node pointing at `destination`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotSupported`] if aliases are disabled
    /// - otherwise the same as [`FsWrite::create_file`]
    pub fn create_alias(&self, path: &Path, destination: &Path) -> Result<(), FsError> {
        if !self.inner.config.capabilities.aliases {
            return Err(FsError::NotSupported {
                operation: "create_alias",
            });
        }
        self.lock().create_leaf(path, MockNode::alias(destination))
    }

    /// Arm a one-shot failure on the next operation that reaches it.
    pub fn inject_fault(&self, fault: Fault) {
        debug!(?fault, "armed fault");
        self.lock().arm(fault);
    }

    /// Returns `true` if both values share one store.
    pub fn same_store(&self, other: &MockFs) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, Ptn> {
        self.inner.ptn.lock()
    }

    fn require_xattrs(&self) -> Result<(), FsError> {
        if self.inner.config.capabilities.xattrs {
            Ok(())
        } else {
            Err(FsError::NotSupported {
                operation: "extended attributes",
            })
        }
    }
}

impl Default for MockFs {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for MockFs {
    fn eq(&self, other: &Self) -> bool {
        self.same_store(other)
    }
}

impl Eq for MockFs {}

impl fmt::Debug for MockFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFs")
            .field("store", &Arc::as_ptr(&self.inner))
            .field("config", &self.inner.config)
            .finish()
    }
}

// ============================================================================
// Contract
// ============================================================================

impl FsLookup for MockFs {
    fn node_type(&self, path: &Path) -> Result<Option<NodeType>, FsError> {
        let ptn = self.lock();
        match ptn.resolve_ancestors(path) {
            Ok(resolved) => Ok(ptn.kind_at(&resolved)),
            Err(FsError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn node_type_following_symlinks(&self, path: &Path) -> Result<Option<NodeType>, FsError> {
        let ptn = self.lock();
        match ptn.realpath(path) {
            Ok(resolved) => Ok(ptn.kind_at(&resolved)),
            Err(FsError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.config.capabilities
    }
}

impl FsRead for MockFs {
    fn contents_of_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.lock().file(path).cloned()
    }

    fn size_of_file(&self, path: &Path) -> Result<u64, FsError> {
        self.lock().file(path).map(|contents| contents.len() as u64)
    }
}

impl FsDir for MockFs {
    fn contents_of_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        self.lock().children(path)
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        self.lock().create_dir(path)
    }
}

impl FsWrite for MockFs {
    fn create_file(&self, path: &Path) -> Result<(), FsError> {
        self.lock().create_leaf(path, MockNode::file())
    }

    fn replace_contents_of_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let mut ptn = self.lock();
        let contents = ptn.file_mut(path)?;
        contents.clear();
        contents.extend_from_slice(data);
        Ok(())
    }

    fn append_contents_of_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        self.lock().file_mut(path)?.extend_from_slice(data);
        Ok(())
    }

    fn delete_node(&self, path: &Path) -> Result<(), FsError> {
        self.lock().delete(path)
    }

    fn copy_node(&self, source: &Path, destination: &Path) -> Result<PathBuf, FsError> {
        self.lock().transfer(source, destination, Transfer::Copy)
    }

    fn move_node(&self, source: &Path, destination: &Path) -> Result<PathBuf, FsError> {
        self.lock().transfer(source, destination, Transfer::Move)
    }

    fn rename_node(&self, source: &Path, new_name: &str) -> Result<PathBuf, FsError> {
        self.lock().rename(source, new_name)
    }
}

impl FsLink for MockFs {
    fn create_symlink(&self, link: &Path, destination: &Path) -> Result<(), FsError> {
        if !self.inner.config.capabilities.symlinks {
            return Err(FsError::NotSupported {
                operation: "create_symlink",
            });
        }
        self.lock().create_leaf(link, MockNode::symlink(destination))
    }

    fn destination_of(&self, path: &Path) -> Result<PathBuf, FsError> {
        let ptn = self.lock();
        let (resolved, _) = ptn.existing(path)?;
        match ptn.get(&resolved) {
            Some(MockNode::Symlink { destination, .. } | MockNode::Alias { destination, .. }) => {
                Ok(destination.clone())
            }
            Some(node) => Err(FsError::WrongType {
                path: path.to_path_buf(),
                actual: node.kind(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    fn realpath_of(&self, path: &Path) -> Result<PathBuf, FsError> {
        let ptn = self.lock();
        let real = ptn.realpath(path)?;
        if ptn.kind_at(&real).is_none() {
            return Err(ptn.not_found(path, real));
        }
        Ok(real)
    }
}

impl FsXattr for MockFs {
    fn xattr_names(&self, path: &Path) -> Result<Vec<String>, FsError> {
        self.require_xattrs()?;
        let ptn = self.lock();
        let (resolved, _) = ptn.existing(path)?;
        Ok(ptn
            .get(&resolved)
            .map(|node| node.xattrs().names())
            .unwrap_or_default())
    }

    fn get_xattr(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>, FsError> {
        self.require_xattrs()?;
        let ptn = self.lock();
        let (resolved, kind) = ptn.existing(path)?;
        self.inner.config.xattr_policy.check_access(path, name, kind)?;
        Ok(ptn.get(&resolved).and_then(|node| node.xattrs().get(name)))
    }

    fn set_xattr(&self, path: &Path, name: &str, value: &[u8]) -> Result<(), FsError> {
        self.require_xattrs()?;
        let mut ptn = self.lock();
        let (resolved, kind) = ptn.existing(path)?;
        self.inner.config.xattr_policy.check_set(path, name, kind)?;
        if let Some(node) = ptn.get_mut(&resolved) {
            node.xattrs_mut().set(name, value);
        }
        Ok(())
    }

    fn remove_xattr(&self, path: &Path, name: &str) -> Result<(), FsError> {
        self.require_xattrs()?;
        let mut ptn = self.lock();
        let (resolved, kind) = ptn.existing(path)?;
        self.inner.config.xattr_policy.check_access(path, name, kind)?;
        if let Some(node) = ptn.get_mut(&resolved) {
            node.xattrs_mut().remove(name);
        }
        Ok(())
    }
}

impl FsKnownDirs for MockFs {
    fn well_known_dir(&self, which: WellKnownDir) -> Result<PathBuf, FsError> {
        let config = &self.inner.config;
        let path = match which {
            WellKnownDir::Home => config.home.clone(),
            WellKnownDir::Downloads => config.home.join("Downloads"),
            WellKnownDir::Documents => config.home.join("Documents"),
            WellKnownDir::Cache => config.home.join(".cache"),
            WellKnownDir::Temporary => config.temporary.clone(),
            WellKnownDir::UniqueTemporary => config
                .temporary
                .join(uuid::Uuid::new_v4().hyphenated().to_string()),
        };

        if !path.is_root() {
            self.lock().create_dir(&path)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fs, XattrPolicy};

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    fn fs_with_tree() -> MockFs {
        let fs = MockFs::new();
        fs.create_dir(&p("/docs/old")).unwrap();
        fs.create_file(&p("/docs/a.txt")).unwrap();
        fs.replace_contents_of_file(&p("/docs/a.txt"), b"alpha").unwrap();
        fs.create_symlink(&p("/link"), &p("/docs")).unwrap();
        fs
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[test]
    fn root_is_a_directory() {
        let fs = MockFs::new();
        assert_eq!(fs.node_type(&p("/")).unwrap(), Some(NodeType::Dir));
    }

    #[test]
    fn node_type_does_not_follow_final_symlink() {
        let fs = fs_with_tree();
        assert_eq!(fs.node_type(&p("/link")).unwrap(), Some(NodeType::Symlink));
        assert_eq!(
            fs.node_type_following_symlinks(&p("/link")).unwrap(),
            Some(NodeType::Dir)
        );
    }

    #[test]
    fn node_type_through_symlinked_parent() {
        let fs = fs_with_tree();
        assert_eq!(fs.node_type(&p("/link/a.txt")).unwrap(), Some(NodeType::File));
    }

    #[test]
    fn missing_paths_have_no_type() {
        let fs = fs_with_tree();
        assert_eq!(fs.node_type(&p("/nope")).unwrap(), None);
        assert_eq!(fs.node_type(&p("/nope/deeper")).unwrap(), None);
    }

    #[test]
    fn looping_links_surface_as_errors() {
        let fs = MockFs::new();
        fs.create_symlink(&p("/a"), &p("/b")).unwrap();
        fs.create_symlink(&p("/b"), &p("/a")).unwrap();

        assert_eq!(fs.node_type(&p("/a")).unwrap(), Some(NodeType::Symlink));
        let err = fs.node_type_following_symlinks(&p("/a")).unwrap_err();
        assert!(matches!(err, FsError::CircularChain { path } if path == p("/a")));
    }

    #[test]
    fn relative_paths_are_rejected() {
        let fs = MockFs::new();
        let err = fs.create_file(&p("relative")).unwrap_err();
        assert!(matches!(err, FsError::InvalidCall { .. }));
    }

    // ========================================================================
    // Creation
    // ========================================================================

    #[test]
    fn create_dir_builds_missing_parents_and_is_idempotent() {
        let fs = MockFs::new();
        fs.create_dir(&p("/a/b/c")).unwrap();
        fs.create_dir(&p("/a/b/c")).unwrap();
        assert_eq!(fs.node_type(&p("/a/b")).unwrap(), Some(NodeType::Dir));
    }

    #[test]
    fn create_dir_on_root_reports_existing_dir() {
        let fs = MockFs::new();
        let err = fs.create_dir(&p("/")).unwrap_err();
        assert!(matches!(
            err,
            FsError::AlreadyExists {
                existing: NodeType::Dir,
                ..
            }
        ));
    }

    #[test]
    fn create_dir_through_file_is_wrong_type() {
        let fs = fs_with_tree();
        let err = fs.create_dir(&p("/docs/a.txt/sub")).unwrap_err();
        assert!(matches!(
            err,
            FsError::WrongType {
                actual: NodeType::File,
                ..
            }
        ));
    }

    #[test]
    fn create_dir_through_symlink_lands_in_target() {
        let fs = fs_with_tree();
        fs.create_dir(&p("/link/new")).unwrap();
        assert_eq!(fs.node_type(&p("/docs/new")).unwrap(), Some(NodeType::Dir));
    }

    #[test]
    fn create_file_requires_existing_parent() {
        let fs = MockFs::new();
        let err = fs.create_file(&p("/missing/f")).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn create_file_on_occupied_path_reports_occupant() {
        let fs = fs_with_tree();
        let err = fs.create_file(&p("/docs/old")).unwrap_err();
        assert!(matches!(
            err,
            FsError::AlreadyExists {
                existing: NodeType::Dir,
                ..
            }
        ));
    }

    #[test]
    fn create_symlink_needs_capability() {
        let fs = MockFs::with_config(MockConfig::default().with_capabilities(Capabilities {
            symlinks: false,
            ..Capabilities::ALL
        }));
        let err = fs.create_symlink(&p("/s"), &p("/")).unwrap_err();
        assert!(matches!(err, FsError::NotSupported { .. }));
    }

    // ========================================================================
    // Contents
    // ========================================================================

    #[test]
    fn replace_and_append_contents() {
        let fs = fs_with_tree();
        fs.append_contents_of_file(&p("/docs/a.txt"), b"-beta").unwrap();
        assert_eq!(fs.contents_of_file(&p("/docs/a.txt")).unwrap(), b"alpha-beta");
        assert_eq!(fs.size_of_file(&p("/docs/a.txt")).unwrap(), 10);

        fs.replace_contents_of_file(&p("/docs/a.txt"), b"").unwrap();
        assert_eq!(fs.size_of_file(&p("/docs/a.txt")).unwrap(), 0);
    }

    #[test]
    fn reading_a_directory_is_wrong_type() {
        let fs = fs_with_tree();
        let err = fs.contents_of_file(&p("/docs")).unwrap_err();
        assert!(matches!(
            err,
            FsError::WrongType {
                actual: NodeType::Dir,
                ..
            }
        ));
    }

    #[test]
    fn dangling_symlink_reports_its_destination() {
        let fs = MockFs::new();
        fs.create_symlink(&p("/dangling"), &p("/gone")).unwrap();
        let err = fs.contents_of_file(&p("/dangling")).unwrap_err();
        assert!(matches!(err, FsError::NotFound { path } if path == p("/gone")));
    }

    #[test]
    fn plain_missing_file_reports_requested_path() {
        let fs = MockFs::new();
        let err = fs.contents_of_file(&p("/gone")).unwrap_err();
        assert!(matches!(err, FsError::NotFound { path } if path == p("/gone")));
    }

    #[test]
    fn listing_through_symlink_keeps_requested_prefix() {
        let fs = fs_with_tree();
        let mut entries = fs.contents_of_directory(&p("/link")).unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            entries,
            vec![
                DirEntry {
                    path: p("/link/a.txt"),
                    node_type: NodeType::File
                },
                DirEntry {
                    path: p("/link/old"),
                    node_type: NodeType::Dir
                },
            ]
        );
    }

    // ========================================================================
    // Delete
    // ========================================================================

    #[test]
    fn delete_removes_whole_subtree() {
        let fs = fs_with_tree();
        fs.delete_node(&p("/docs")).unwrap();
        assert_eq!(fs.paths(), vec![p("/"), p("/link")]);
    }

    #[test]
    fn delete_symlink_keeps_target() {
        let fs = fs_with_tree();
        fs.delete_node(&p("/link")).unwrap();
        assert_eq!(fs.node_type(&p("/docs")).unwrap(), Some(NodeType::Dir));
    }

    #[test]
    fn delete_root_is_invalid() {
        let fs = MockFs::new();
        assert!(matches!(
            fs.delete_node(&p("/")).unwrap_err(),
            FsError::InvalidCall { .. }
        ));
    }

    // ========================================================================
    // Rename
    // ========================================================================

    #[test]
    fn rename_stays_in_parent() {
        let fs = fs_with_tree();
        let renamed = fs.rename_node(&p("/docs/a.txt"), "b.txt").unwrap();
        assert_eq!(renamed, p("/docs/b.txt"));
        assert_eq!(fs.contents_of_file(&renamed).unwrap(), b"alpha");
    }

    #[test]
    fn rename_onto_sibling_fails() {
        let fs = fs_with_tree();
        let err = fs.rename_node(&p("/docs/a.txt"), "old").unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists { .. }));
    }

    #[test]
    fn rename_rejects_path_like_names() {
        let fs = fs_with_tree();
        for name in ["", "a/b", "..", "."] {
            let err = fs.rename_node(&p("/docs/a.txt"), name).unwrap_err();
            assert!(matches!(err, FsError::InvalidCall { .. }), "{name:?}");
        }
    }

    // ========================================================================
    // Links
    // ========================================================================

    #[test]
    fn destination_of_non_link_is_wrong_type() {
        let fs = fs_with_tree();
        assert_eq!(fs.destination_of(&p("/link")).unwrap(), p("/docs"));
        assert!(matches!(
            fs.destination_of(&p("/docs")).unwrap_err(),
            FsError::WrongType { .. }
        ));
    }

    #[test]
    fn aliases_resolve_like_symlinks() {
        let fs = fs_with_tree();
        fs.create_alias(&p("/alias"), &p("/docs/a.txt")).unwrap();
        assert_eq!(fs.node_type(&p("/alias")).unwrap(), Some(NodeType::Alias));
        assert_eq!(fs.contents_of_file(&p("/alias")).unwrap(), b"alpha");
        assert_eq!(fs.realpath_of(&p("/alias")).unwrap(), p("/docs/a.txt"));
    }

    #[test]
    fn aliases_need_capability() {
        let fs = MockFs::with_config(MockConfig::emulating_host());
        let err = fs.create_alias(&p("/alias"), &p("/")).unwrap_err();
        assert!(matches!(err, FsError::NotSupported { .. }));
    }

    // ========================================================================
    // Extended attributes
    // ========================================================================

    #[test]
    fn xattrs_round_trip_and_remove_is_idempotent() {
        let fs = fs_with_tree();
        let file = p("/docs/a.txt");
        fs.set_xattr(&file, "user.tag", b"blue").unwrap();
        assert_eq!(fs.get_xattr(&file, "user.tag").unwrap(), Some(b"blue".to_vec()));
        assert_eq!(fs.xattr_names(&file).unwrap(), vec!["user.tag".to_string()]);

        fs.remove_xattr(&file, "user.tag").unwrap();
        fs.remove_xattr(&file, "user.tag").unwrap();
        assert_eq!(fs.get_xattr(&file, "user.tag").unwrap(), None);
    }

    #[test]
    fn xattrs_on_symlink_belong_to_the_link() {
        let fs = fs_with_tree();
        fs.set_xattr(&p("/link"), "k", b"v").unwrap();
        assert!(fs.xattr_names(&p("/docs")).unwrap().is_empty());
    }

    #[test]
    fn linux_policy_rejects_user_names_on_symlinks() {
        let fs = MockFs::with_config(MockConfig::default().with_xattr_policy(XattrPolicy::LINUX));
        fs.create_symlink(&p("/s"), &p("/")).unwrap();
        let err = fs.set_xattr(&p("/s"), "user.x", b"").unwrap_err();
        assert!(matches!(err, FsError::AttributeNotSupported { .. }));
        fs.set_xattr(&p("/s"), "trusted.x", b"").unwrap();
    }

    #[test]
    fn overlong_names_are_rejected() {
        let fs = MockFs::with_config(
            MockConfig::default().with_xattr_policy(XattrPolicy::PERMISSIVE.with_max_name_len(4)),
        );
        let err = fs.set_xattr(&p("/"), "toolong", b"").unwrap_err();
        assert!(matches!(err, FsError::AttributeNameTooLong { max: 4, .. }));
    }

    #[test]
    fn xattrs_need_capability() {
        let fs = MockFs::with_config(MockConfig::default().with_capabilities(Capabilities::MINIMAL));
        assert!(matches!(
            fs.xattr_names(&p("/")).unwrap_err(),
            FsError::NotSupported { .. }
        ));
    }

    // ========================================================================
    // Well-known directories
    // ========================================================================

    #[test]
    fn well_known_dirs_exist_after_lookup() {
        let fs = MockFs::new();
        let downloads = fs.well_known_dir(WellKnownDir::Downloads).unwrap();
        assert_eq!(downloads, p("/home/mock/Downloads"));
        assert_eq!(fs.node_type(&downloads).unwrap(), Some(NodeType::Dir));
    }

    #[test]
    fn unique_temporary_dirs_are_distinct() {
        let fs = MockFs::new();
        let first = fs.well_known_dir(WellKnownDir::UniqueTemporary).unwrap();
        let second = fs.well_known_dir(WellKnownDir::UniqueTemporary).unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("/tmp"));
        assert_eq!(fs.node_type(&second).unwrap(), Some(NodeType::Dir));
    }

    // ========================================================================
    // Identity
    // ========================================================================

    #[test]
    fn clones_share_a_store() {
        let fs = MockFs::new();
        let clone = fs.clone();
        assert_eq!(fs, clone);
        assert_ne!(fs, MockFs::new());
    }

    #[test]
    fn usable_as_trait_object_across_threads() {
        let fs: Arc<dyn Fs> = Arc::new(MockFs::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let fs = Arc::clone(&fs);
                std::thread::spawn(move || fs.create_dir(&PathBuf::from(format!("/t{i}/x"))))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(fs.contents_of_directory(&p("/")).unwrap().len(), 4);
    }
}
