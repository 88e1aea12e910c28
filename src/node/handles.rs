//! Typed handles for each node kind, generated by the `handle!` macro.

use std::path::{Path, PathBuf};

use super::sealed::Sealed;
use super::{AnyNode, Backend, Children, Descendants, Node, verify};
use crate::path::validate_name;
use crate::{DirEntry, FsError, NodeType};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $kind:expr, follow: $follow:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            backend: Backend,
            path: PathBuf,
        }

        impl $name {
            /// Handle to the node at `path`, after checking its kind.
            ///
            /// # Errors
            ///
            /// - [`FsError::NotFound`] if nothing is there
            /// - [`FsError::WrongType`] if something of another kind is there
            pub fn at(backend: impl Into<Backend>, path: impl Into<PathBuf>) -> Result<Self, FsError> {
                let backend = backend.into();
                let path = path.into();
                verify(&backend, &path, $kind, $follow)?;
                Ok(Self { backend, path })
            }

            pub(crate) fn unchecked(backend: Backend, path: PathBuf) -> Self {
                Self { backend, path }
            }
        }

        impl Sealed for $name {
            fn path_mut(&mut self) -> &mut PathBuf {
                &mut self.path
            }
        }

        impl Node for $name {
            fn backend(&self) -> &Backend {
                &self.backend
            }

            fn path(&self) -> &Path {
                &self.path
            }

            fn node_type(&self) -> NodeType {
                $kind
            }
        }
    };
}

handle!(
    /// A directory, or a link that resolves to one.
    Dir, NodeType::Dir, follow: true
);
handle!(
    /// A regular file, or a link that resolves to one.
    File, NodeType::File, follow: true
);
handle!(
    /// A symbolic link itself, not its target.
    Symlink, NodeType::Symlink, follow: false
);
handle!(
    /// A FIFO, socket, device or other node without contents.
    Special, NodeType::Special, follow: false
);
handle!(
    /// A platform alias node itself.
    Alias, NodeType::Alias, follow: false
);

impl Dir {
    /// Raw listing of immediate children.
    pub fn contents(&self) -> Result<Vec<DirEntry>, FsError> {
        self.backend.fs().contents_of_directory(&self.path)
    }

    /// Immediate children, partitioned by kind.
    pub fn children(&self) -> Result<Children, FsError> {
        Ok(Children::from_entries(&self.backend, self.contents()?))
    }

    /// Every node below this directory, depth first.
    ///
    /// Each call starts a fresh traversal. Only the listing of this directory
    /// can fail; subdirectories that cannot be listed are skipped.
    pub fn descendants(&self) -> Result<Descendants, FsError> {
        Descendants::new(self)
    }

    fn child_path(&self, name: &str) -> Result<PathBuf, FsError> {
        validate_name(&self.path, name)?;
        Ok(self.path.join(name))
    }

    /// Handle to the child called `name`, of whatever kind it is.
    pub fn child(&self, name: &str) -> Result<AnyNode, FsError> {
        self.backend.node(self.child_path(name)?)
    }

    /// Handle to the child directory called `name`.
    pub fn dir(&self, name: &str) -> Result<Dir, FsError> {
        Dir::at(self.backend.clone(), self.child_path(name)?)
    }

    /// Handle to the child file called `name`.
    pub fn file(&self, name: &str) -> Result<File, FsError> {
        File::at(self.backend.clone(), self.child_path(name)?)
    }

    /// Create (or reuse) the child directory called `name`.
    pub fn create_dir(&self, name: &str) -> Result<Dir, FsError> {
        let path = self.child_path(name)?;
        self.backend.fs().create_dir(&path)?;
        Ok(Dir::unchecked(self.backend.clone(), path))
    }

    /// Create an empty child file called `name`.
    pub fn create_file(&self, name: &str) -> Result<File, FsError> {
        let path = self.child_path(name)?;
        self.backend.fs().create_file(&path)?;
        Ok(File::unchecked(self.backend.clone(), path))
    }

    /// Create a child symlink called `name` pointing at `destination`.
    pub fn create_symlink(&self, name: &str, destination: &Path) -> Result<Symlink, FsError> {
        let path = self.child_path(name)?;
        self.backend.fs().create_symlink(&path, destination)?;
        Ok(Symlink::unchecked(self.backend.clone(), path))
    }
}

impl File {
    /// The full contents.
    pub fn contents(&self) -> Result<Vec<u8>, FsError> {
        self.backend.fs().contents_of_file(&self.path)
    }

    /// The full contents as UTF-8.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidData`] if the bytes are not UTF-8
    pub fn contents_string(&self) -> Result<String, FsError> {
        String::from_utf8(self.contents()?).map_err(|err| FsError::InvalidData {
            path: self.path.clone(),
            details: err.to_string(),
        })
    }

    /// Size in bytes.
    pub fn size(&self) -> Result<u64, FsError> {
        self.backend.fs().size_of_file(&self.path)
    }

    /// Overwrite the contents.
    pub fn replace_contents(&self, data: &[u8]) -> Result<(), FsError> {
        self.backend.fs().replace_contents_of_file(&self.path, data)
    }

    /// Append to the contents.
    pub fn append_contents(&self, data: &[u8]) -> Result<(), FsError> {
        self.backend.fs().append_contents_of_file(&self.path, data)
    }
}

impl Symlink {
    /// The stored destination, verbatim.
    pub fn destination(&self) -> Result<PathBuf, FsError> {
        self.backend.fs().destination_of(&self.path)
    }

    /// Handle to the node the link ultimately points at.
    pub fn resolve(&self) -> Result<AnyNode, FsError> {
        self.backend.node(self.realpath()?)
    }
}

impl Alias {
    /// The stored destination, verbatim.
    pub fn destination(&self) -> Result<PathBuf, FsError> {
        self.backend.fs().destination_of(&self.path)
    }

    /// Handle to the node the alias ultimately points at.
    pub fn resolve(&self) -> Result<AnyNode, FsError> {
        self.backend.node(self.realpath()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockFs;

    fn root() -> Dir {
        Backend::from(MockFs::new()).root()
    }

    #[test]
    fn child_names_must_be_single_components() {
        let root = root();
        assert!(matches!(root.create_dir("a/b"), Err(FsError::InvalidCall { .. })));
        assert!(matches!(root.child(".."), Err(FsError::InvalidCall { .. })));
    }

    #[test]
    fn file_contents_round_trip() {
        let file = root().create_file("f").unwrap();
        assert_eq!(file.contents().unwrap(), b"");
        file.replace_contents(b"one").unwrap();
        file.append_contents(b" two").unwrap();
        assert_eq!(file.contents_string().unwrap(), "one two");
        assert_eq!(file.size().unwrap(), 7);
    }

    #[test]
    fn non_utf8_contents_are_invalid_data() {
        let file = root().create_file("bin").unwrap();
        file.replace_contents(&[0xff, 0xfe]).unwrap();
        assert!(matches!(file.contents_string(), Err(FsError::InvalidData { .. })));
    }

    #[test]
    fn symlink_resolves_to_target_handle() {
        let root = root();
        let target = root.create_dir("target").unwrap();
        let link = root.create_symlink("link", Path::new("target")).unwrap();

        assert_eq!(link.destination().unwrap(), PathBuf::from("target"));
        assert_eq!(link.resolve().unwrap(), AnyNode::Dir(target));
    }

    #[test]
    fn alias_resolves_like_a_symlink() {
        let fs = MockFs::new();
        let root = Backend::from(fs.clone()).root();
        let file = root.create_file("f").unwrap();
        fs.create_alias(Path::new("/al"), Path::new("/f")).unwrap();

        let alias = Alias::at(fs, "/al").unwrap();
        assert_eq!(alias.destination().unwrap(), PathBuf::from("/f"));
        assert_eq!(alias.resolve().unwrap(), AnyNode::File(file));
    }

    #[test]
    fn special_nodes_support_identity_operations() {
        let fs = MockFs::new();
        fs.inject_special(Path::new("/fifo")).unwrap();
        let mut special = Special::at(fs.clone(), "/fifo").unwrap();

        special.rename("pipe").unwrap();
        assert_eq!(special.path(), Path::new("/pipe"));
        assert!(File::at(fs, "/pipe").is_err());
        special.delete().unwrap();
    }

    #[test]
    fn handles_created_through_dir_are_exercisable() {
        let root = root();
        let sub = root.create_dir("sub").unwrap();
        sub.create_file("x").unwrap();
        assert_eq!(root.dir("sub").unwrap(), sub);
        assert!(sub.file("x").is_ok());
        assert!(matches!(sub.file("nope"), Err(FsError::NotFound { .. })));
    }
}
