//! The path-to-node map behind [`MockFs`](super::MockFs).
//!
//! Every method here runs with the engine's lock already held, so a
//! multi-step mutation is one critical section.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::attributes::XattrTable;
use crate::path::{PathExt, absolute};
use crate::resolver::{Follow, LinkSource, Probe, resolve};
use crate::transfer::{self, Destination, Placement};
use crate::{DirEntry, FsError, NodeType};

/// Failure points a test harness can arm on the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// The next move loses its source between the copy and delete phases,
    /// so the delete fails and the move rolls back.
    VanishSourceBeforeDelete,
}

/// One record in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MockNode {
    Dir {
        xattrs: XattrTable,
    },
    File {
        contents: Vec<u8>,
        xattrs: XattrTable,
    },
    Symlink {
        destination: PathBuf,
        xattrs: XattrTable,
    },
    Alias {
        destination: PathBuf,
        xattrs: XattrTable,
    },
    Special {
        xattrs: XattrTable,
    },
}

impl MockNode {
    pub(crate) fn dir() -> Self {
        MockNode::Dir {
            xattrs: XattrTable::default(),
        }
    }

    pub(crate) fn file() -> Self {
        MockNode::File {
            contents: Vec::new(),
            xattrs: XattrTable::default(),
        }
    }

    pub(crate) fn symlink(destination: &Path) -> Self {
        MockNode::Symlink {
            destination: destination.to_path_buf(),
            xattrs: XattrTable::default(),
        }
    }

    pub(crate) fn alias(destination: &Path) -> Self {
        MockNode::Alias {
            destination: destination.to_path_buf(),
            xattrs: XattrTable::default(),
        }
    }

    pub(crate) fn special() -> Self {
        MockNode::Special {
            xattrs: XattrTable::default(),
        }
    }

    pub(crate) fn kind(&self) -> NodeType {
        match self {
            MockNode::Dir { .. } => NodeType::Dir,
            MockNode::File { .. } => NodeType::File,
            MockNode::Symlink { .. } => NodeType::Symlink,
            MockNode::Alias { .. } => NodeType::Alias,
            MockNode::Special { .. } => NodeType::Special,
        }
    }

    fn destination(&self) -> Option<&Path> {
        match self {
            MockNode::Symlink { destination, .. } | MockNode::Alias { destination, .. } => {
                Some(destination)
            }
            _ => None,
        }
    }

    pub(crate) fn xattrs(&self) -> &XattrTable {
        match self {
            MockNode::Dir { xattrs }
            | MockNode::File { xattrs, .. }
            | MockNode::Symlink { xattrs, .. }
            | MockNode::Alias { xattrs, .. }
            | MockNode::Special { xattrs } => xattrs,
        }
    }

    pub(crate) fn xattrs_mut(&mut self) -> &mut XattrTable {
        match self {
            MockNode::Dir { xattrs }
            | MockNode::File { xattrs, .. }
            | MockNode::Symlink { xattrs, .. }
            | MockNode::Alias { xattrs, .. }
            | MockNode::Special { xattrs } => xattrs,
        }
    }
}

/// Copy leaves the source in place; move removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transfer {
    Copy,
    Move,
}

/// Canonical absolute path → node record. `/` is always a directory.
#[derive(Debug)]
pub(crate) struct Ptn {
    nodes: BTreeMap<PathBuf, MockNode>,
    faults: Vec<Fault>,
}

impl LinkSource for Ptn {
    fn probe(&self, path: &Path) -> Probe<'_> {
        match self.nodes.get(path) {
            None => Probe::Missing,
            Some(node) => match node.destination() {
                Some(destination) => Probe::Link(destination),
                None => Probe::Node(node.kind()),
            },
        }
    }
}

impl Ptn {
    pub(crate) fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathBuf::from("/"), MockNode::dir());
        Self {
            nodes,
            faults: Vec::new(),
        }
    }

    pub(crate) fn arm(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    fn take_fault(&mut self, fault: Fault) -> bool {
        match self.faults.iter().position(|armed| *armed == fault) {
            Some(index) => {
                self.faults.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        self.nodes.keys().cloned().collect()
    }

    pub(crate) fn get(&self, path: &Path) -> Option<&MockNode> {
        self.nodes.get(path)
    }

    pub(crate) fn get_mut(&mut self, path: &Path) -> Option<&mut MockNode> {
        self.nodes.get_mut(path)
    }

    pub(crate) fn kind_at(&self, path: &Path) -> Option<NodeType> {
        self.nodes.get(path).map(MockNode::kind)
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Full resolution. The final component may be missing.
    pub(crate) fn realpath(&self, path: &Path) -> Result<PathBuf, FsError> {
        resolve(self, &absolute(path)?, Follow::All).into_result()
    }

    /// Resolution of every component but the last.
    pub(crate) fn resolve_ancestors(&self, path: &Path) -> Result<PathBuf, FsError> {
        resolve(self, &absolute(path)?, Follow::Ancestors).into_result()
    }

    /// The ancestor-resolved path of an existing node and its kind.
    pub(crate) fn existing(&self, path: &Path) -> Result<(PathBuf, NodeType), FsError> {
        let resolved = self.resolve_ancestors(path)?;
        match self.kind_at(&resolved) {
            Some(kind) => Ok((resolved, kind)),
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The error for a fully resolved path with nothing at it.
    ///
    /// When the requested path itself is a dangling link, the link's
    /// destination is reported; otherwise the requested path is.
    pub(crate) fn not_found(&self, requested: &Path, resolved: PathBuf) -> FsError {
        let dangling = self
            .resolve_ancestors(requested)
            .is_ok_and(|own| matches!(self.probe(&own), Probe::Link(_)));
        let path = if dangling {
            resolved
        } else {
            requested.to_path_buf()
        };
        FsError::NotFound { path }
    }

    // ------------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------------

    pub(crate) fn create_dir(&mut self, path: &Path) -> Result<(), FsError> {
        let path = absolute(path)?;
        if path.is_root() {
            return Err(FsError::AlreadyExists {
                path,
                existing: NodeType::Dir,
            });
        }

        let mut built = PathBuf::from("/");
        for name in path.iter().skip(1) {
            let candidate = built.join(name);
            match self.kind_at(&candidate) {
                None => {
                    debug!(path = %candidate.display(), "creating directory");
                    self.nodes.insert(candidate.clone(), MockNode::dir());
                    built = candidate;
                }
                Some(NodeType::Dir) => built = candidate,
                Some(NodeType::Symlink | NodeType::Alias) => {
                    let target = self.realpath(&candidate)?;
                    match self.kind_at(&target) {
                        Some(NodeType::Dir) => built = target,
                        Some(actual) => {
                            return Err(FsError::WrongType {
                                path: candidate,
                                actual,
                            });
                        }
                        None => return Err(FsError::NotFound { path: target }),
                    }
                }
                Some(actual) => {
                    return Err(FsError::WrongType {
                        path: candidate,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }

    /// Create a non-directory node whose parent must already exist.
    pub(crate) fn create_leaf(&mut self, path: &Path, node: MockNode) -> Result<(), FsError> {
        let resolved = self.resolve_ancestors(path)?;
        if let Some(existing) = self.kind_at(&resolved) {
            return Err(FsError::AlreadyExists {
                path: path.to_path_buf(),
                existing,
            });
        }
        self.require_parent_dir(&resolved)?;

        debug!(path = %resolved.display(), kind = %node.kind(), "creating node");
        self.nodes.insert(resolved, node);
        Ok(())
    }

    fn require_parent_dir(&self, resolved: &Path) -> Result<(), FsError> {
        let parent = resolved.removing_last_component();
        match self.kind_at(&parent) {
            Some(NodeType::Dir) => Ok(()),
            Some(actual) => Err(FsError::WrongType {
                path: parent,
                actual,
            }),
            None => Err(FsError::NotFound { path: parent }),
        }
    }

    // ------------------------------------------------------------------------
    // Contents
    // ------------------------------------------------------------------------

    /// The byte buffer of the file `path` resolves to.
    pub(crate) fn file(&self, path: &Path) -> Result<&Vec<u8>, FsError> {
        let real = self.realpath(path)?;
        match self.nodes.get(&real) {
            Some(MockNode::File { contents, .. }) => Ok(contents),
            Some(node) => Err(FsError::WrongType {
                path: path.to_path_buf(),
                actual: node.kind(),
            }),
            None => Err(self.not_found(path, real)),
        }
    }

    pub(crate) fn file_mut(&mut self, path: &Path) -> Result<&mut Vec<u8>, FsError> {
        let real = self.realpath(path)?;
        if !self.nodes.contains_key(&real) {
            return Err(self.not_found(path, real));
        }
        match self.nodes.get_mut(&real) {
            Some(MockNode::File { contents, .. }) => Ok(contents),
            Some(node) => Err(FsError::WrongType {
                path: path.to_path_buf(),
                actual: node.kind(),
            }),
            None => Err(FsError::NotFound { path: real }),
        }
    }

    pub(crate) fn children(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let requested = absolute(path)?;
        let real = self.realpath(&requested)?;
        match self.kind_at(&real) {
            Some(NodeType::Dir) => {}
            Some(actual) => {
                return Err(FsError::WrongType {
                    path: requested,
                    actual,
                });
            }
            None => return Err(self.not_found(&requested, real)),
        }

        Ok(self
            .nodes
            .range(real.clone()..)
            .skip(1)
            .take_while(|(child, _)| child.starts_with(&real))
            .filter(|(child, _)| child.parent() == Some(real.as_path()))
            .filter_map(|(child, node)| {
                Some(DirEntry {
                    path: requested.join(child.last_component()?),
                    node_type: node.kind(),
                })
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // Removal and transfer
    // ------------------------------------------------------------------------

    /// Remove `path` and everything below it. Returns how many records went.
    fn remove_tree(&mut self, path: &Path) -> usize {
        let doomed: Vec<PathBuf> = self
            .nodes
            .range(path.to_path_buf()..)
            .take_while(|(key, _)| key.starts_with(path))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.nodes.remove(key);
        }
        doomed.len()
    }

    pub(crate) fn delete(&mut self, path: &Path) -> Result<(), FsError> {
        let target = self.resolve_ancestors(path)?;
        if target.is_root() {
            return Err(FsError::InvalidCall {
                path: target,
                reason: "the root cannot be deleted",
            });
        }
        let removed = self.remove_tree(&target);
        if removed == 0 {
            return Err(FsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %target.display(), removed, "deleted node");
        Ok(())
    }

    /// What sits at an ancestor-resolved destination.
    fn destination(&self, destination: &Path) -> Destination {
        match self.probe(destination) {
            Probe::Missing => Destination::Missing,
            Probe::Link(_) if self.kind_at(destination) == Some(NodeType::Symlink) => {
                match self.realpath(destination) {
                    Ok(target) => {
                        let target_kind = self.kind_at(&target);
                        Destination::Symlink {
                            target,
                            target_kind,
                        }
                    }
                    Err(_) => Destination::Symlink {
                        target: destination.to_path_buf(),
                        target_kind: None,
                    },
                }
            }
            Probe::Link(_) => Destination::Node(NodeType::Alias),
            Probe::Node(kind) => Destination::Node(kind),
        }
    }

    /// Copy or move `source` to `destination`. Returns where it landed.
    pub(crate) fn transfer(
        &mut self,
        source: &Path,
        destination: &Path,
        mode: Transfer,
    ) -> Result<PathBuf, FsError> {
        let (source, source_kind) = self.existing(source)?;
        let destination = self.resolve_ancestors(destination)?;
        let found = self.destination(&destination);
        let placement = transfer::plan(&source, source_kind, &destination, found)?;
        let target = placement.path().to_path_buf();

        if target == source {
            return Ok(target);
        }
        if let Placement::Create(_) = placement {
            self.require_parent_dir(&target)?;
        }

        let snapshot = self.nodes.clone();
        match self.place(&source, &target, mode) {
            Ok(()) => {
                debug!(
                    source = %source.display(),
                    target = %target.display(),
                    ?mode,
                    "transferred node"
                );
                Ok(target)
            }
            Err(err) => {
                warn!(
                    source = %source.display(),
                    target = %target.display(),
                    error = %err,
                    "transfer failed, restoring snapshot"
                );
                self.nodes = snapshot;
                Err(err)
            }
        }
    }

    fn place(&mut self, source: &Path, target: &Path, mode: Transfer) -> Result<(), FsError> {
        let subtree: Vec<(PathBuf, MockNode)> = self
            .nodes
            .range(source.to_path_buf()..)
            .take_while(|(key, _)| key.starts_with(source))
            .filter_map(|(key, node)| Some((key.rebase(source, target)?, node.clone())))
            .collect();

        self.remove_tree(target);
        self.nodes.extend(subtree);

        if mode == Transfer::Move {
            if self.take_fault(Fault::VanishSourceBeforeDelete) {
                self.remove_tree(source);
            }
            if self.remove_tree(source) == 0 {
                return Err(FsError::NotFound {
                    path: source.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn rename(&mut self, source: &Path, new_name: &str) -> Result<PathBuf, FsError> {
        crate::path::validate_name(source, new_name)?;
        let (resolved, _) = self.existing(source)?;
        if resolved.is_root() {
            return Err(FsError::InvalidCall {
                path: resolved,
                reason: "the root cannot be renamed",
            });
        }

        let sibling = resolved.removing_last_component().join(new_name);
        if let Some(existing) = self.kind_at(&sibling) {
            return Err(FsError::AlreadyExists {
                path: sibling,
                existing,
            });
        }
        self.transfer(&resolved, &sibling, Transfer::Move)
    }
}
