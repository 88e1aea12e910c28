//! Immediate children and lazy depth-first traversal of a directory.

use tracing::trace;

use super::{Alias, AnyNode, Backend, Dir, File, Node, Special, Symlink};
use crate::{DirEntry, FsError};

/// Immediate children of a directory, partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children {
    /// Regular files.
    pub files: Vec<File>,
    /// Directories.
    pub dirs: Vec<Dir>,
    /// Symlinks, not followed.
    pub symlinks: Vec<Symlink>,
    /// Special nodes.
    pub specials: Vec<Special>,
    /// Alias nodes, not followed.
    pub aliases: Vec<Alias>,
}

impl Children {
    pub(crate) fn from_entries(backend: &Backend, entries: Vec<DirEntry>) -> Self {
        let mut children = Children::default();
        for entry in entries {
            match AnyNode::new(backend.clone(), entry.path, entry.node_type) {
                AnyNode::Dir(dir) => children.dirs.push(dir),
                AnyNode::File(file) => children.files.push(file),
                AnyNode::Symlink(link) => children.symlinks.push(link),
                AnyNode::Special(special) => children.specials.push(special),
                AnyNode::Alias(alias) => children.aliases.push(alias),
            }
        }
        children
    }

    /// All children, lazily wrapped as [`AnyNode`].
    pub fn iter(&self) -> impl Iterator<Item = AnyNode> + '_ {
        self.files
            .iter()
            .cloned()
            .map(AnyNode::from)
            .chain(self.dirs.iter().cloned().map(AnyNode::from))
            .chain(self.symlinks.iter().cloned().map(AnyNode::from))
            .chain(self.specials.iter().cloned().map(AnyNode::from))
            .chain(self.aliases.iter().cloned().map(AnyNode::from))
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.files.len() + self.dirs.len() + self.symlinks.len() + self.specials.len() + self.aliases.len()
    }

    /// Returns `true` if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Depth-first walk over every node below a directory.
///
/// Symlinks and aliases are yielded but never descended into.
#[derive(Debug)]
pub struct Descendants {
    backend: Backend,
    pending: Vec<AnyNode>,
}

impl Descendants {
    pub(crate) fn new(root: &Dir) -> Result<Self, FsError> {
        let backend = root.backend().clone();
        let mut walk = Self {
            pending: Vec::new(),
            backend,
        };
        let entries = root.contents()?;
        walk.push(entries);
        Ok(walk)
    }

    fn push(&mut self, entries: Vec<DirEntry>) {
        // Reversed so that pop() yields the listing order.
        self.pending.extend(
            entries
                .into_iter()
                .rev()
                .map(|entry| AnyNode::new(self.backend.clone(), entry.path, entry.node_type)),
        );
    }
}

impl Iterator for Descendants {
    type Item = AnyNode;

    fn next(&mut self) -> Option<AnyNode> {
        let node = self.pending.pop()?;
        if let AnyNode::Dir(dir) = &node {
            match dir.contents() {
                Ok(entries) => self.push(entries),
                Err(err) => {
                    trace!(path = %dir.path().display(), error = %err, "skipping unlistable directory");
                }
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::{FsWrite, MockFs};

    fn tree() -> (MockFs, Dir) {
        let fs = MockFs::new();
        let root = Backend::from(fs.clone()).root();
        let a = root.create_dir("a").unwrap();
        a.create_dir("b").unwrap().create_file("deep").unwrap();
        a.create_file("f").unwrap();
        a.create_symlink("loop", Path::new("/a")).unwrap();
        fs.inject_special(Path::new("/a/fifo")).unwrap();
        (fs, a)
    }

    #[test]
    fn children_are_partitioned() {
        let (_, a) = tree();
        let children = a.children().unwrap();
        assert_eq!(children.dirs.len(), 1);
        assert_eq!(children.files.len(), 1);
        assert_eq!(children.symlinks.len(), 1);
        assert_eq!(children.specials.len(), 1);
        assert!(children.aliases.is_empty());
        assert_eq!(children.iter().count(), children.len());
    }

    #[test]
    fn descendants_visit_every_node_once_without_following_links() {
        let (_, a) = tree();
        let paths: Vec<PathBuf> = a
            .descendants()
            .unwrap()
            .map(|node| node.path().to_path_buf())
            .collect();
        let unique: BTreeSet<_> = paths.iter().cloned().collect();

        assert_eq!(paths.len(), unique.len());
        assert_eq!(
            unique,
            ["/a/b", "/a/b/deep", "/a/f", "/a/loop", "/a/fifo"]
                .into_iter()
                .map(PathBuf::from)
                .collect()
        );
    }

    #[test]
    fn descendants_restart_on_each_call() {
        let (_, a) = tree();
        let first = a.descendants().unwrap().count();
        assert_eq!(a.descendants().unwrap().count(), first);
    }

    #[test]
    fn unlistable_subdirectory_is_yielded_without_children() {
        let fs = MockFs::new();
        let top = Backend::from(fs.clone()).root().create_dir("top").unwrap();
        top.create_dir("a").unwrap().create_file("a1").unwrap();
        top.create_dir("b").unwrap().create_file("b1").unwrap();
        top.create_file("z").unwrap();

        let mut walk = top.descendants().unwrap();
        assert_eq!(walk.next().unwrap().path(), Path::new("/top/a"));
        // `/top/b` is queued but not yet listed.
        fs.delete_node(Path::new("/top/b")).unwrap();

        let rest: Vec<PathBuf> = walk.map(|node| node.path().to_path_buf()).collect();
        assert_eq!(
            rest,
            ["/top/a/a1", "/top/b", "/top/z"].map(PathBuf::from).to_vec()
        );
    }

    #[test]
    fn listing_failure_of_root_is_reported() {
        let (fs, a) = tree();
        fs.delete_node(a.path()).unwrap();
        assert!(matches!(a.descendants(), Err(FsError::NotFound { .. })));
    }
}
