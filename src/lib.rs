//! # nodefs
//!
//! A node-oriented filesystem abstraction with two interchangeable backends:
//! an in-memory engine ([`MockFs`]) for fast, deterministic tests, and the
//! host operating system ([`RealFs`]).
//!
//! ---
//!
//! ## Quick Start
//!
//! Code written against [`Fs`] (or `&dyn Fs`) runs unchanged on either
//! backend:
//!
//! ```rust
//! use nodefs::{Fs, FsError, FsLookup, FsWrite, MockFs, NodeType};
//! use std::path::Path;
//!
//! fn archive<B: Fs + ?Sized>(fs: &B, report: &Path) -> Result<(), FsError> {
//!     fs.create_dir(Path::new("/archive/2024"))?;
//!     fs.move_node(report, Path::new("/archive/2024"))?;
//!     Ok(())
//! }
//!
//! let fs = MockFs::new();
//! fs.create_file(Path::new("/report.txt")).unwrap();
//! archive(&fs, Path::new("/report.txt")).unwrap();
//! assert_eq!(
//!     fs.node_type(Path::new("/archive/2024/report.txt")).unwrap(),
//!     Some(NodeType::File)
//! );
//! ```
//!
//! Typed handles ([`Dir`], [`File`], [`Symlink`], ...) wrap a [`Backend`] and
//! a path and offer the same operations node by node.
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Fs`] | The complete capability contract |
//! | [`MockFs`] | In-memory engine with a single-lock path-to-node map |
//! | [`RealFs`] | Host filesystem backend |
//! | [`Backend`] | Either backend, held by node handles |
//! | [`NodeType`] | Closed set of node kinds |
//! | [`FsError`] | Error type with contextual variants |
//!
//! ---
//!
//! ## Resolution
//!
//! Every path the engine touches is absolute and lexically normalized.
//! Symlinks and aliases met on the way are substituted by an iterative walk
//! with a per-call visited set, so a loop ends in
//! [`FsError::CircularChain`] instead of recursing forever. Operations that
//! must tell "is a symlink" from "points through a symlink" resolve every
//! component except the last.
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. [`MockFs`] guards its
//! whole store with one lock taken once per call, so compound operations
//! such as a move with rollback never interleave.
//!
//! ---
//!
//! ## Logging
//!
//! Mutations are reported through [`tracing`] at `debug` level, link
//! substitutions at `trace`, and move rollbacks at `warn`. No subscriber is
//! installed by this crate.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`NodeType`], [`DirEntry`], [`MockConfig`], etc., and the `FsExtJson` helpers |

// Private modules
mod attributes;
mod config;
mod error;
mod ext;
mod mock;
mod node;
mod path;
mod real;
mod resolver;
mod traits;
mod transfer;
mod types;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{Capabilities, DirEntry, NodeType, WellKnownDir};

// Public re-exports - paths
pub use path::{PathExt, normalize};

// Public re-exports - contract
pub use traits::{Fs, FsDir, FsKnownDirs, FsLink, FsLookup, FsRead, FsWrite, FsXattr};

// Public re-exports - extended attributes
pub use attributes::{NamespacePolicy, XattrPolicy};

// Public re-exports - backends
pub use config::MockConfig;
pub use mock::{Fault, MockFs};
pub use real::RealFs;

// Public re-exports - node handles
pub use node::{
    Alias, AnyNode, Backend, Children, Descendants, Dir, File, NewNode, Node, Special, Symlink,
};

// Public re-exports - infrastructure
pub use ext::FsExt;

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::FsExtJson;
