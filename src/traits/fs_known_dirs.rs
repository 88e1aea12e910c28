//! Well-known directory lookup.

use std::path::PathBuf;

use crate::{FsError, WellKnownDir};

/// Locate system directories such as home or the temporary directory.
pub trait FsKnownDirs: Send + Sync {
    /// Path of a well-known directory.
    ///
    /// [`WellKnownDir::UniqueTemporary`] creates a fresh directory inside
    /// [`WellKnownDir::Temporary`] on every call.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the host has no such directory
    fn well_known_dir(&self, which: WellKnownDir) -> Result<PathBuf, FsError>;
}
