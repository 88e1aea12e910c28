//! # Host Backend
//!
//! [`RealFs`] implements the contract on top of the operating system. It
//! shares the copy/move placement rules with the in-memory engine, so the two
//! agree on where a transferred node lands.
//!
//! Differences from [`MockFs`](crate::MockFs):
//! - ancestor symlinks are resolved by the kernel, not by this crate
//! - a replaced destination is renamed aside and restored if the transfer
//!   fails, but a partially copied source tree is only deleted, not rolled
//!   back node by node
//! - alias nodes are never reported
//! - special nodes (FIFOs, sockets, devices) cannot be copied

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::path::{PathExt, absolute, validate_name};
use crate::transfer::{self, Destination, Placement};
use crate::{
    Capabilities, DirEntry, FsDir, FsError, FsKnownDirs, FsLink, FsLookup, FsRead, FsWrite,
    FsXattr, NodeType, WellKnownDir, XattrPolicy,
};

/// The host operating system's filesystem.
///
/// Paths must be absolute. Relative paths fail with [`FsError::InvalidCall`]
/// rather than being resolved against the process working directory.
///
/// ```rust,no_run
/// use nodefs::{FsKnownDirs, RealFs, WellKnownDir};
///
/// let fs = RealFs::new();
/// let scratch = fs.well_known_dir(WellKnownDir::UniqueTemporary).unwrap();
/// assert!(scratch.starts_with(fs.well_known_dir(WellKnownDir::Temporary).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RealFs {
    xattr_policy: XattrPolicy,
}

impl RealFs {
    /// Host backend with 255-byte attribute names and no namespace checks
    /// beyond what the kernel applies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host backend with custom attribute rules.
    pub fn with_xattr_policy(xattr_policy: XattrPolicy) -> Self {
        Self { xattr_policy }
    }

    fn lookup(&self, path: &Path, follow: bool) -> Result<Option<NodeType>, FsError> {
        let path = absolute(path)?;
        let metadata = if follow {
            fs::metadata(&path)
        } else {
            fs::symlink_metadata(&path)
        };
        match metadata {
            Ok(metadata) => Ok(Some(kind_of(metadata.file_type()))),
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                Ok(None)
            }
            Err(err) => Err(FsError::io("stat", path, err)),
        }
    }

    /// The kind at `path` without following a final symlink, or `NotFound`.
    fn existing(&self, path: &Path) -> Result<(PathBuf, NodeType), FsError> {
        let path = absolute(path)?;
        match self.lookup(&path, false)? {
            Some(kind) => Ok((path, kind)),
            None => Err(FsError::NotFound { path }),
        }
    }

    /// Resolve `path` to a regular file, reporting what blocked it otherwise.
    fn regular_file(&self, path: &Path) -> Result<PathBuf, FsError> {
        let path = absolute(path)?;
        match self.lookup(&path, true)? {
            Some(NodeType::File) => Ok(path),
            Some(actual) => Err(FsError::WrongType { path, actual }),
            None => Err(missing(&path)),
        }
    }

    /// First component of `path` that exists and is not a directory.
    fn blocking_component(&self, path: &Path) -> Option<(PathBuf, NodeType)> {
        let mut built = PathBuf::from("/");
        for name in path.iter().skip(1) {
            built.push(name);
            match self.lookup(&built, true) {
                Ok(Some(NodeType::Dir)) => {}
                Ok(Some(actual)) => return Some((built, actual)),
                _ => return None,
            }
        }
        None
    }

    fn destination(&self, destination: &Path) -> Result<Destination, FsError> {
        Ok(match self.lookup(destination, false)? {
            None => Destination::Missing,
            Some(NodeType::Symlink) => {
                let target = fs::canonicalize(destination).unwrap_or_else(|_| destination.to_path_buf());
                let target_kind = self.lookup(destination, true).ok().flatten();
                Destination::Symlink {
                    target,
                    target_kind,
                }
            }
            Some(kind) => Destination::Node(kind),
        })
    }

    /// Rename whatever occupies `target` to a hidden sibling so it can be
    /// restored if the transfer fails.
    fn set_aside(&self, target: &Path) -> Result<Option<PathBuf>, FsError> {
        if self.lookup(target, false)?.is_none() {
            return Ok(None);
        }
        let name = target.last_component().unwrap_or_default().to_string_lossy();
        let aside = target.with_file_name(format!(".{name}.{}", uuid::Uuid::new_v4().simple()));
        fs::rename(target, &aside).map_err(|err| FsError::io("rename", target, err))?;
        trace!(target = %target.display(), aside = %aside.display(), "set occupant aside");
        Ok(Some(aside))
    }

    fn transfer(&self, source: &Path, destination: &Path, copy: bool) -> Result<PathBuf, FsError> {
        let (source, source_kind) = self.existing(source)?;
        let destination = absolute(destination)?;
        let found = self.destination(&destination)?;
        let placement = transfer::plan(&source, source_kind, &destination, found)?;
        let target = placement.path().to_path_buf();

        if target == source {
            return Ok(target);
        }
        let occupant = match placement {
            Placement::Create(_) => None,
            Placement::Rehome(_) | Placement::Replace(_) => self.set_aside(&target)?,
        };

        let placed = if copy {
            copy_tree(&source, &target)
        } else {
            fs::rename(&source, &target).map_err(|err| FsError::io("rename", &source, err))
        };
        if let Err(err) = placed {
            warn!(
                source = %source.display(),
                target = %target.display(),
                error = %err,
                "transfer failed, restoring destination"
            );
            if copy && fs::symlink_metadata(&target).is_ok() {
                remove_any(&target)?;
            }
            if let Some(aside) = occupant {
                fs::rename(&aside, &target).map_err(|err| FsError::io("rename", &aside, err))?;
            }
            return Err(err);
        }
        if let Some(aside) = occupant {
            if let Err(err) = remove_any(&aside) {
                warn!(path = %aside.display(), error = %err, "could not remove replaced node");
            }
        }
        debug!(
            source = %source.display(),
            target = %target.display(),
            copy,
            "transferred node"
        );
        Ok(target)
    }
}

fn kind_of(file_type: fs::FileType) -> NodeType {
    if file_type.is_symlink() {
        NodeType::Symlink
    } else if file_type.is_dir() {
        NodeType::Dir
    } else if file_type.is_file() {
        NodeType::File
    } else {
        NodeType::Special
    }
}

/// `NotFound` for `path`, naming the destination when `path` is a dangling
/// symlink.
fn missing(path: &Path) -> FsError {
    let dangling = fs::symlink_metadata(path).is_ok_and(|metadata| metadata.file_type().is_symlink());
    let path = match fs::read_link(path) {
        Ok(destination) if dangling => path.removing_last_component().join(destination).normalized(),
        _ => path.to_path_buf(),
    };
    FsError::NotFound { path }
}

/// Delete a node of any kind without following a final symlink.
fn remove_any(path: &Path) -> Result<(), FsError> {
    let metadata = fs::symlink_metadata(path).map_err(|err| FsError::io("stat", path, err))?;
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|err| FsError::io("delete", path, err))
}

fn copy_tree(source: &Path, target: &Path) -> Result<(), FsError> {
    let metadata = fs::symlink_metadata(source).map_err(|err| FsError::io("stat", source, err))?;
    match kind_of(metadata.file_type()) {
        NodeType::Dir => {
            fs::create_dir(target).map_err(|err| FsError::io("create_dir", target, err))?;
            let entries = fs::read_dir(source).map_err(|err| FsError::io("read_dir", source, err))?;
            for entry in entries {
                let entry = entry.map_err(|err| FsError::io("read_dir", source, err))?;
                copy_tree(&entry.path(), &target.join(entry.file_name()))?;
            }
        }
        NodeType::File => {
            fs::copy(source, target).map_err(|err| FsError::io("copy", source, err))?;
        }
        NodeType::Symlink => {
            let destination = fs::read_link(source).map_err(|err| FsError::io("read_link", source, err))?;
            symlink(&destination, target)?;
        }
        NodeType::Special | NodeType::Alias => {
            return Err(FsError::NotSupported {
                operation: "copy of a special node",
            });
        }
    }
    copy_xattrs(source, target)
}

#[cfg(unix)]
fn symlink(destination: &Path, link: &Path) -> Result<(), FsError> {
    std::os::unix::fs::symlink(destination, link).map_err(|err| FsError::io("symlink", link, err))
}

#[cfg(not(unix))]
fn symlink(_destination: &Path, _link: &Path) -> Result<(), FsError> {
    Err(FsError::NotSupported {
        operation: "create_symlink",
    })
}

#[cfg(unix)]
fn copy_xattrs(source: &Path, target: &Path) -> Result<(), FsError> {
    let names = match xattr::list(source) {
        Ok(names) => names,
        Err(err) if err.kind() == ErrorKind::Unsupported => {
            trace!(path = %source.display(), "filesystem has no extended attributes");
            return Ok(());
        }
        Err(err) => return Err(FsError::io("listxattr", source, err)),
    };
    for name in names {
        let value = xattr::get(source, &name).map_err(|err| FsError::io("getxattr", source, err))?;
        if let Some(value) = value {
            xattr::set(target, &name, &value).map_err(|err| FsError::io("setxattr", target, err))?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn copy_xattrs(_source: &Path, _target: &Path) -> Result<(), FsError> {
    Ok(())
}

// ============================================================================
// Contract
// ============================================================================

impl FsLookup for RealFs {
    fn node_type(&self, path: &Path) -> Result<Option<NodeType>, FsError> {
        self.lookup(path, false)
    }

    fn node_type_following_symlinks(&self, path: &Path) -> Result<Option<NodeType>, FsError> {
        self.lookup(path, true)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NATIVE
    }
}

impl FsRead for RealFs {
    fn contents_of_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        let path = self.regular_file(path)?;
        fs::read(&path).map_err(|err| FsError::io("read", path, err))
    }

    fn size_of_file(&self, path: &Path) -> Result<u64, FsError> {
        let path = self.regular_file(path)?;
        fs::metadata(&path)
            .map(|metadata| metadata.len())
            .map_err(|err| FsError::io("stat", path, err))
    }
}

impl FsDir for RealFs {
    fn contents_of_directory(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let path = absolute(path)?;
        match self.lookup(&path, true)? {
            Some(NodeType::Dir) => {}
            Some(actual) => return Err(FsError::WrongType { path, actual }),
            None => return Err(missing(&path)),
        }

        let entries = fs::read_dir(&path).map_err(|err| FsError::io("read_dir", &path, err))?;
        entries
            .map(|entry| {
                let entry = entry.map_err(|err| FsError::io("read_dir", &path, err))?;
                let file_type = entry
                    .file_type()
                    .map_err(|err| FsError::io("stat", entry.path(), err))?;
                Ok(DirEntry {
                    path: path.join(entry.file_name()),
                    node_type: kind_of(file_type),
                })
            })
            .collect()
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        let path = absolute(path)?;
        if path.is_root() {
            return Err(FsError::AlreadyExists {
                path,
                existing: NodeType::Dir,
            });
        }
        match fs::create_dir_all(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "creating directory");
                Ok(())
            }
            Err(err) => match self.blocking_component(&path) {
                Some((blocked, actual)) => Err(FsError::WrongType {
                    path: blocked,
                    actual,
                }),
                None => Err(FsError::io("create_dir", path, err)),
            },
        }
    }
}

impl FsWrite for RealFs {
    fn create_file(&self, path: &Path) -> Result<(), FsError> {
        let path = absolute(path)?;
        if let Some(existing) = self.lookup(&path, false)? {
            return Err(FsError::AlreadyExists { path, existing });
        }
        let parent = path.removing_last_component();
        match self.lookup(&parent, true)? {
            Some(NodeType::Dir) => {}
            Some(actual) => return Err(FsError::WrongType { path: parent, actual }),
            None => return Err(FsError::NotFound { path: parent }),
        }

        debug!(path = %path.display(), "creating file");
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map(drop)
            .map_err(|err| FsError::io("create", path, err))
    }

    fn replace_contents_of_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let path = self.regular_file(path)?;
        debug!(path = %path.display(), len = data.len(), "replacing contents");
        fs::write(&path, data).map_err(|err| FsError::io("write", path, err))
    }

    fn append_contents_of_file(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        let path = self.regular_file(path)?;
        debug!(path = %path.display(), len = data.len(), "appending contents");
        OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(data))
            .map_err(|err| FsError::io("append", path, err))
    }

    fn delete_node(&self, path: &Path) -> Result<(), FsError> {
        let (path, kind) = self.existing(path)?;
        if path.is_root() {
            return Err(FsError::InvalidCall {
                path,
                reason: "the root cannot be deleted",
            });
        }
        let removed = match kind {
            NodeType::Dir => fs::remove_dir_all(&path),
            _ => fs::remove_file(&path),
        };
        removed.map_err(|err| FsError::io("delete", &path, err))?;
        debug!(path = %path.display(), %kind, "deleted node");
        Ok(())
    }

    fn copy_node(&self, source: &Path, destination: &Path) -> Result<PathBuf, FsError> {
        self.transfer(source, destination, true)
    }

    fn move_node(&self, source: &Path, destination: &Path) -> Result<PathBuf, FsError> {
        self.transfer(source, destination, false)
    }

    fn rename_node(&self, source: &Path, new_name: &str) -> Result<PathBuf, FsError> {
        validate_name(source, new_name)?;
        let (source, _) = self.existing(source)?;
        if source.is_root() {
            return Err(FsError::InvalidCall {
                path: source,
                reason: "the root cannot be renamed",
            });
        }
        let sibling = source.removing_last_component().join(new_name);
        if let Some(existing) = self.lookup(&sibling, false)? {
            return Err(FsError::AlreadyExists {
                path: sibling,
                existing,
            });
        }
        fs::rename(&source, &sibling).map_err(|err| FsError::io("rename", &source, err))?;
        debug!(source = %source.display(), target = %sibling.display(), "renamed node");
        Ok(sibling)
    }
}

impl FsLink for RealFs {
    fn create_symlink(&self, link: &Path, destination: &Path) -> Result<(), FsError> {
        let link = absolute(link)?;
        if let Some(existing) = self.lookup(&link, false)? {
            return Err(FsError::AlreadyExists {
                path: link,
                existing,
            });
        }
        debug!(link = %link.display(), destination = %destination.display(), "creating symlink");
        symlink(destination, &link)
    }

    fn destination_of(&self, path: &Path) -> Result<PathBuf, FsError> {
        match self.existing(path)? {
            (path, NodeType::Symlink) => {
                fs::read_link(&path).map_err(|err| FsError::io("read_link", path, err))
            }
            (path, actual) => Err(FsError::WrongType { path, actual }),
        }
    }

    fn realpath_of(&self, path: &Path) -> Result<PathBuf, FsError> {
        let path = absolute(path)?;
        fs::canonicalize(&path).map_err(|err| match FsError::io("canonicalize", &path, err) {
            FsError::NotFound { .. } => missing(&path),
            other => other,
        })
    }
}

#[cfg(unix)]
impl FsXattr for RealFs {
    fn xattr_names(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let (path, _) = self.existing(path)?;
        let names = xattr::list(&path).map_err(|err| FsError::io("listxattr", &path, err))?;
        Ok(names
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    fn get_xattr(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>, FsError> {
        let (path, kind) = self.existing(path)?;
        self.xattr_policy.check_access(&path, name, kind)?;
        xattr::get(&path, name).map_err(|err| FsError::io("getxattr", path, err))
    }

    fn set_xattr(&self, path: &Path, name: &str, value: &[u8]) -> Result<(), FsError> {
        let (path, kind) = self.existing(path)?;
        self.xattr_policy.check_set(&path, name, kind)?;
        debug!(path = %path.display(), name, "setting attribute");
        xattr::set(&path, name, value).map_err(|err| match err.kind() {
            ErrorKind::Unsupported | ErrorKind::PermissionDenied => FsError::AttributeNotSupported {
                path: path.clone(),
                name: name.to_string(),
            },
            _ => FsError::io("setxattr", &path, err),
        })
    }

    fn remove_xattr(&self, path: &Path, name: &str) -> Result<(), FsError> {
        if self.get_xattr(path, name)?.is_none() {
            return Ok(());
        }
        let (path, _) = self.existing(path)?;
        debug!(path = %path.display(), name, "removing attribute");
        xattr::remove(&path, name).map_err(|err| FsError::io("removexattr", path, err))
    }
}

#[cfg(not(unix))]
impl FsXattr for RealFs {
    fn xattr_names(&self, _path: &Path) -> Result<Vec<String>, FsError> {
        Err(FsError::NotSupported {
            operation: "extended attributes",
        })
    }

    fn get_xattr(&self, path: &Path, _name: &str) -> Result<Option<Vec<u8>>, FsError> {
        self.xattr_names(path).map(|_| None)
    }

    fn set_xattr(&self, path: &Path, _name: &str, _value: &[u8]) -> Result<(), FsError> {
        self.xattr_names(path).map(drop)
    }

    fn remove_xattr(&self, path: &Path, _name: &str) -> Result<(), FsError> {
        self.xattr_names(path).map(drop)
    }
}

impl FsKnownDirs for RealFs {
    fn well_known_dir(&self, which: WellKnownDir) -> Result<PathBuf, FsError> {
        let path = match which {
            WellKnownDir::Home => dirs::home_dir(),
            WellKnownDir::Downloads => dirs::download_dir(),
            WellKnownDir::Documents => dirs::document_dir(),
            WellKnownDir::Cache => dirs::cache_dir(),
            WellKnownDir::Temporary => Some(env::temp_dir()),
            WellKnownDir::UniqueTemporary => {
                let dir = env::temp_dir().join(uuid::Uuid::new_v4().hyphenated().to_string());
                fs::create_dir(&dir).map_err(|err| FsError::io("create_dir", &dir, err))?;
                trace!(path = %dir.display(), "created unique temporary directory");
                Some(dir)
            }
        };
        path.ok_or_else(|| FsError::NotFound {
            path: PathBuf::from(format!("<{which:?}>")),
        })
    }
}
