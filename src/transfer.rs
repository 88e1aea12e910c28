//! Copy/move placement shared by every backend.
//!
//! Both backends resolve the ancestors of the source and destination, probe
//! what sits at the destination, and hand the result to [`plan`], which
//! decides where the node lands.

use std::path::{Path, PathBuf};

use crate::path::PathExt;
use crate::{FsError, NodeType};

/// What the backend found at the ancestor-resolved destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Destination {
    /// Nothing is there.
    Missing,
    /// A node that is not a symlink.
    Node(NodeType),
    /// A symlink. `target_kind` is the kind it resolves to, `None` if it
    /// dangles or loops.
    Symlink {
        target: PathBuf,
        target_kind: Option<NodeType>,
    },
}

/// Where a copied or moved node lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Nothing was there; place the node at this path.
    Create(PathBuf),
    /// Place the node as a new child of a directory. The path already
    /// includes the source's name.
    Rehome(PathBuf),
    /// Remove what is at this path, then place the node there.
    Replace(PathBuf),
}

impl Placement {
    pub(crate) fn path(&self) -> &Path {
        match self {
            Placement::Create(path) | Placement::Rehome(path) | Placement::Replace(path) => path,
        }
    }
}

/// Decide where `source` (already ancestor-resolved, of `source_kind`) lands
/// when transferred to the ancestor-resolved `destination`.
///
/// # Errors
///
/// - [`FsError::InvalidCall`] if the source is the root, or a directory would
///   land inside itself
pub(crate) fn plan(
    source: &Path,
    source_kind: NodeType,
    destination: &Path,
    found: Destination,
) -> Result<Placement, FsError> {
    let Some(name) = source.last_component() else {
        return Err(FsError::InvalidCall {
            path: source.to_path_buf(),
            reason: "the root cannot be copied or moved",
        });
    };

    let placement = match found {
        Destination::Missing => Placement::Create(destination.to_path_buf()),
        Destination::Node(NodeType::Dir) => Placement::Rehome(destination.join(name)),
        Destination::Node(_) => Placement::Replace(destination.to_path_buf()),
        Destination::Symlink {
            target,
            target_kind: Some(NodeType::Dir),
        } => Placement::Rehome(target.join(name)),
        Destination::Symlink { .. } => Placement::Replace(destination.to_path_buf()),
    };

    if source_kind == NodeType::Dir && placement.path().is_descendant_of(source) {
        return Err(FsError::InvalidCall {
            path: destination.to_path_buf(),
            reason: "a directory cannot be placed inside itself",
        });
    }
    // Replacing an ancestor would delete the source along with it.
    if source.is_descendant_of(placement.path()) {
        return Err(FsError::InvalidCall {
            path: destination.to_path_buf(),
            reason: "a node cannot replace its own ancestor",
        });
    }
    Ok(placement)
}
