//! # Filesystem Traits
//!
//! The capability contract every backend implements identically.
//!
//! ## Component Traits
//!
//! | Trait | Operations |
//! |-------|------------|
//! | [`FsLookup`] | `node_type`, `node_type_following_symlinks`, `capabilities` |
//! | [`FsRead`] | `contents_of_file`, `size_of_file` |
//! | [`FsDir`] | `contents_of_directory`, `create_dir` |
//! | [`FsWrite`] | `create_file`, `replace_contents_of_file`, `append_contents_of_file`, `delete_node`, `copy_node`, `move_node`, `rename_node` |
//! | [`FsLink`] | `create_symlink`, `destination_of`, `realpath_of` |
//! | [`FsXattr`] | `xattr_names`, `get_xattr`, `set_xattr`, `remove_xattr` |
//! | [`FsKnownDirs`] | `well_known_dir` |
//!
//! ## Blanket Implementation
//!
//! [`Fs`] combines all of them. Implement the components and you get `Fs`
//! automatically.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`. Methods take `&self` to enable concurrent
//! access. Backends use interior mutability for thread-safe state management.
//!
//! ## Object Safety
//!
//! All traits are object-safe and can be used as trait objects:
//!
//! ```rust
//! use nodefs::{Fs, MockFs};
//! use std::path::Path;
//!
//! fn process(fs: &dyn Fs) {
//!     let _ = fs.contents_of_file(Path::new("/file.txt"));
//! }
//!
//! process(&MockFs::new());
//! ```

mod fs_dir;
mod fs_known_dirs;
mod fs_link;
mod fs_lookup;
mod fs_read;
mod fs_write;
mod fs_xattr;

pub use fs_dir::FsDir;
pub use fs_known_dirs::FsKnownDirs;
pub use fs_link::FsLink;
pub use fs_lookup::FsLookup;
pub use fs_read::FsRead;
pub use fs_write::FsWrite;
pub use fs_xattr::FsXattr;

/// The complete filesystem contract.
///
/// # Blanket Implementation
///
/// Automatically implemented for any type implementing every component trait.
/// You never need to implement `Fs` directly.
///
/// # Example
///
/// ```rust
/// use nodefs::{Fs, FsError};
/// use std::path::Path;
///
/// // Generic function that works with any Fs implementation
/// fn backup_file<B: Fs>(fs: &B, src: &Path, backups: &Path) -> Result<(), FsError> {
///     // Idempotent, creates missing parents
///     fs.create_dir(backups)?;
///
///     // Destination is a directory, so the copy lands at backups/<name>
///     fs.copy_node(src, backups)?;
///     Ok(())
/// }
/// ```
pub trait Fs: FsLookup + FsRead + FsDir + FsWrite + FsLink + FsXattr + FsKnownDirs {}

// Blanket implementation - any type implementing all components gets Fs for free
impl<T> Fs for T where T: FsLookup + FsRead + FsDir + FsWrite + FsLink + FsXattr + FsKnownDirs {}
