//! # Node Handles
//!
//! Typed values pairing a [`Backend`] with a path. A handle is only built
//! after the backend confirms that the path holds a node of the right kind;
//! after that it is a plain value. Deleting the node does not invalidate the
//! handle, later calls simply fail with [`FsError::NotFound`].
//!
//! | Handle | Verified with |
//! |--------|---------------|
//! | [`Dir`], [`File`] | `node_type_following_symlinks` |
//! | [`Symlink`], [`Alias`], [`Special`] | `node_type` |
//!
//! Two handles are equal when they use the same backend instance and the same
//! path, even if different paths resolve to one node.
//!
//! ```rust
//! use nodefs::{Backend, MockFs, Node};
//!
//! let backend = Backend::from(MockFs::new());
//! let docs = backend.root().create_dir("docs").unwrap();
//! let mut note = docs.create_file("note.txt").unwrap();
//! note.replace_contents(b"hello").unwrap();
//!
//! note.rename("renamed.txt").unwrap();
//! assert_eq!(note.path(), std::path::Path::new("/docs/renamed.txt"));
//! assert_eq!(docs.children().unwrap().files, vec![note]);
//! ```

mod handles;
mod traversal;

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::path::PathExt;
use crate::{Fs, FsError, MockFs, NodeType, RealFs, WellKnownDir};

pub use handles::{Alias, Dir, File, Special, Symlink};
use sealed::Sealed;
pub use traversal::{Children, Descendants};

/// The engine a handle talks to.
///
/// A small closed enum keeps handles inline and cheap to clone.
#[derive(Debug, Clone)]
pub enum Backend {
    /// In-memory engine.
    Mock(MockFs),
    /// Host operating system.
    Real(RealFs),
}

impl Backend {
    /// The contract behind this backend.
    pub fn fs(&self) -> &dyn Fs {
        match self {
            Backend::Mock(fs) => fs,
            Backend::Real(fs) => fs,
        }
    }

    /// Handle to `/`.
    pub fn root(&self) -> Dir {
        Dir::unchecked(self.clone(), PathBuf::from("/"))
    }

    /// Handle to whatever exists at `path`, without following a final link.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing is there
    pub fn node(&self, path: impl Into<PathBuf>) -> Result<AnyNode, FsError> {
        let path = path.into();
        match self.fs().node_type(&path)? {
            Some(kind) => Ok(AnyNode::new(self.clone(), path, kind)),
            None => Err(FsError::NotFound { path }),
        }
    }

    /// Handle to the directory at `path`.
    pub fn dir(&self, path: impl Into<PathBuf>) -> Result<Dir, FsError> {
        Dir::at(self.clone(), path)
    }

    /// Handle to the file at `path`.
    pub fn file(&self, path: impl Into<PathBuf>) -> Result<File, FsError> {
        File::at(self.clone(), path)
    }

    /// Handle to the symlink at `path`.
    pub fn symlink(&self, path: impl Into<PathBuf>) -> Result<Symlink, FsError> {
        Symlink::at(self.clone(), path)
    }

    /// Create a node of the requested kind and return its handle.
    ///
    /// # Errors
    ///
    /// Whatever the matching `create_*` contract call returns.
    /// [`FsError::NotSupported`] for aliases on the host backend.
    pub fn create(&self, path: impl Into<PathBuf>, new: NewNode) -> Result<AnyNode, FsError> {
        let path = path.into();
        let kind = match &new {
            NewNode::Dir => {
                self.fs().create_dir(&path)?;
                NodeType::Dir
            }
            NewNode::File => {
                self.fs().create_file(&path)?;
                NodeType::File
            }
            NewNode::Symlink { destination } => {
                self.fs().create_symlink(&path, destination)?;
                NodeType::Symlink
            }
            NewNode::Alias { destination } => {
                match self {
                    Backend::Mock(fs) => fs.create_alias(&path, destination)?,
                    Backend::Real(_) => {
                        return Err(FsError::NotSupported {
                            operation: "create_alias",
                        });
                    }
                }
                NodeType::Alias
            }
        };
        Ok(AnyNode::new(self.clone(), path, kind))
    }

    /// The well-known directory, created if the backend manages it.
    pub fn well_known_dir(&self, which: WellKnownDir) -> Result<Dir, FsError> {
        let path = self.fs().well_known_dir(which)?;
        Dir::at(self.clone(), path)
    }
}

impl PartialEq for Backend {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Backend::Mock(a), Backend::Mock(b)) => a.same_store(b),
            (Backend::Real(_), Backend::Real(_)) => true,
            _ => false,
        }
    }
}

impl Eq for Backend {}

impl From<MockFs> for Backend {
    fn from(fs: MockFs) -> Self {
        Backend::Mock(fs)
    }
}

impl From<RealFs> for Backend {
    fn from(fs: RealFs) -> Self {
        Backend::Real(fs)
    }
}

/// Kind of node for [`Backend::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewNode {
    /// Directory, parents created as needed.
    Dir,
    /// Empty file.
    File,
    /// Symlink storing `destination` verbatim.
    Symlink {
        /// Where the link points.
        destination: PathBuf,
    },
    /// Alias node (in-memory engine only).
    Alias {
        /// Where the alias points.
        destination: PathBuf,
    },
}

mod sealed {
    use std::path::PathBuf;

    pub trait Sealed {
        fn path_mut(&mut self) -> &mut PathBuf;
    }
}

/// Operations shared by every handle kind.
///
/// Sealed: implemented by [`Dir`], [`File`], [`Symlink`], [`Special`],
/// [`Alias`] and [`AnyNode`].
pub trait Node: Sealed + Clone + PartialEq + fmt::Debug {
    /// The backend this handle talks to.
    fn backend(&self) -> &Backend;

    /// The path this handle was created with, updated by moves and renames.
    fn path(&self) -> &Path;

    /// The kind this handle was verified as.
    fn node_type(&self) -> NodeType;

    /// Final path component. `None` for the root.
    fn name(&self) -> Option<&OsStr> {
        self.path().last_component()
    }

    /// The containing directory.
    fn parent(&self) -> Result<Dir, FsError> {
        Dir::at(self.backend().clone(), self.path().removing_last_component())
    }

    /// Returns `true` if something still exists at the handle's path.
    fn exists(&self) -> Result<bool, FsError> {
        Ok(self.backend().fs().node_type(self.path())?.is_some())
    }

    /// The canonical path with every link resolved.
    fn realpath(&self) -> Result<PathBuf, FsError> {
        self.backend().fs().realpath_of(self.path())
    }

    /// Delete the node (and its subtree).
    fn delete(self) -> Result<(), FsError> {
        self.backend().fs().delete_node(self.path())
    }

    /// Copy the node; returns a handle to the copy.
    ///
    /// Placement follows [`FsWrite::copy_node`](crate::FsWrite::copy_node).
    fn copy_to(&self, destination: &Path) -> Result<Self, FsError> {
        let landed = self.backend().fs().copy_node(self.path(), destination)?;
        let mut copy = self.clone();
        *copy.path_mut() = landed;
        Ok(copy)
    }

    /// Move the node and point this handle at its new location.
    fn move_to(&mut self, destination: &Path) -> Result<(), FsError> {
        let landed = self.backend().fs().move_node(self.path(), destination)?;
        *self.path_mut() = landed;
        Ok(())
    }

    /// Move the node into `dir`, keeping its name.
    fn move_into(&mut self, dir: &Dir) -> Result<(), FsError> {
        self.move_to(dir.path())
    }

    /// Rename within the same parent and point this handle at the new name.
    fn rename(&mut self, new_name: &str) -> Result<(), FsError> {
        self.backend().fs().rename_node(self.path(), new_name)?;
        let renamed = self.path().removing_last_component().join(new_name);
        *self.path_mut() = renamed;
        Ok(())
    }

    /// Path of this node relative to `ancestor`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADescendant`] if the node is not below `ancestor`
    fn relative_path_from(&self, ancestor: &Dir) -> Result<PathBuf, FsError> {
        self.path().strip_ancestor(ancestor.path())
    }

    /// Names of the node's extended attributes.
    fn xattr_names(&self) -> Result<Vec<String>, FsError> {
        self.backend().fs().xattr_names(self.path())
    }

    /// Value of one extended attribute, `None` if unset.
    fn get_xattr(&self, name: &str) -> Result<Option<Vec<u8>>, FsError> {
        self.backend().fs().get_xattr(self.path(), name)
    }

    /// Set one extended attribute.
    fn set_xattr(&self, name: &str, value: &[u8]) -> Result<(), FsError> {
        self.backend().fs().set_xattr(self.path(), name, value)
    }

    /// Remove one extended attribute. Absent names are ignored.
    fn remove_xattr(&self, name: &str) -> Result<(), FsError> {
        self.backend().fs().remove_xattr(self.path(), name)
    }
}

/// A handle of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyNode {
    /// Directory handle.
    Dir(Dir),
    /// File handle.
    File(File),
    /// Symlink handle.
    Symlink(Symlink),
    /// Special node handle.
    Special(Special),
    /// Alias handle.
    Alias(Alias),
}

impl AnyNode {
    /// Wrap a path whose kind the backend just reported.
    pub(crate) fn new(backend: Backend, path: PathBuf, kind: NodeType) -> Self {
        match kind {
            NodeType::Dir => AnyNode::Dir(Dir::unchecked(backend, path)),
            NodeType::File => AnyNode::File(File::unchecked(backend, path)),
            NodeType::Symlink => AnyNode::Symlink(Symlink::unchecked(backend, path)),
            NodeType::Special => AnyNode::Special(Special::unchecked(backend, path)),
            NodeType::Alias => AnyNode::Alias(Alias::unchecked(backend, path)),
        }
    }

    /// The directory handle, if this is one.
    pub fn as_dir(&self) -> Option<&Dir> {
        match self {
            AnyNode::Dir(dir) => Some(dir),
            _ => None,
        }
    }

    /// The file handle, if this is one.
    pub fn as_file(&self) -> Option<&File> {
        match self {
            AnyNode::File(file) => Some(file),
            _ => None,
        }
    }

    /// The symlink handle, if this is one.
    pub fn as_symlink(&self) -> Option<&Symlink> {
        match self {
            AnyNode::Symlink(link) => Some(link),
            _ => None,
        }
    }
}

macro_rules! delegate {
    ($self:ident, $node:ident => $body:expr) => {
        match $self {
            AnyNode::Dir($node) => $body,
            AnyNode::File($node) => $body,
            AnyNode::Symlink($node) => $body,
            AnyNode::Special($node) => $body,
            AnyNode::Alias($node) => $body,
        }
    };
}

impl Sealed for AnyNode {
    fn path_mut(&mut self) -> &mut PathBuf {
        delegate!(self, node => node.path_mut())
    }
}

impl Node for AnyNode {
    fn backend(&self) -> &Backend {
        delegate!(self, node => node.backend())
    }

    fn path(&self) -> &Path {
        delegate!(self, node => node.path())
    }

    fn node_type(&self) -> NodeType {
        delegate!(self, node => node.node_type())
    }
}

macro_rules! into_any {
    ($($kind:ident),*) => {
        $(
            impl From<$kind> for AnyNode {
                fn from(node: $kind) -> Self {
                    AnyNode::$kind(node)
                }
            }
        )*
    };
}

into_any!(Dir, File, Symlink, Special, Alias);

/// Confirm that `path` holds a node of kind `expected`.
fn verify(backend: &Backend, path: &Path, expected: NodeType, follow: bool) -> Result<(), FsError> {
    let found = if follow {
        backend.fs().node_type_following_symlinks(path)?
    } else {
        backend.fs().node_type(path)?
    };
    match found {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(FsError::WrongType {
            path: path.to_path_buf(),
            actual,
        }),
        None => Err(FsError::NotFound {
            path: path.to_path_buf(),
        }),
    }
}
