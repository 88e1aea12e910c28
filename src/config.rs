//! Configuration for the in-memory engine.

use std::path::PathBuf;

use crate::{Capabilities, XattrPolicy};

/// Settings for a [`MockFs`](crate::MockFs).
///
/// # Example
///
/// ```rust
/// use nodefs::{Capabilities, MockConfig, MockFs, XattrPolicy};
///
/// let fs = MockFs::with_config(
///     MockConfig::default()
///         .with_capabilities(Capabilities::MINIMAL)
///         .with_xattr_policy(XattrPolicy::LINUX),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MockConfig {
    /// Optional parts of the contract the engine provides.
    pub capabilities: Capabilities,
    /// Extended attribute naming rules.
    pub xattr_policy: XattrPolicy,
    /// Virtual home directory. Downloads, documents and cache live below it.
    pub home: PathBuf,
    /// Virtual temporary directory.
    pub temporary: PathBuf,
}

impl MockConfig {
    /// Capabilities and attribute rules of the host this runs on.
    pub fn emulating_host() -> Self {
        let xattr_policy = if cfg!(target_os = "linux") {
            XattrPolicy::LINUX
        } else {
            XattrPolicy::PERMISSIVE
        };
        Self {
            capabilities: Capabilities::NATIVE,
            xattr_policy,
            ..Self::default()
        }
    }

    /// Replace the capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Replace the attribute policy.
    pub fn with_xattr_policy(mut self, xattr_policy: XattrPolicy) -> Self {
        self.xattr_policy = xattr_policy;
        self
    }

    /// Replace the virtual home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Replace the virtual temporary directory.
    pub fn with_temporary(mut self, temporary: impl Into<PathBuf>) -> Self {
        self.temporary = temporary.into();
        self
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::ALL,
            xattr_policy: XattrPolicy::PERMISSIVE,
            home: PathBuf::from("/home/mock"),
            temporary: PathBuf::from("/tmp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_everything() {
        let config = MockConfig::default();
        assert_eq!(config.capabilities, Capabilities::ALL);
        assert_eq!(config.xattr_policy, XattrPolicy::PERMISSIVE);
    }

    #[test]
    fn host_emulation_has_no_aliases() {
        assert!(!MockConfig::emulating_host().capabilities.aliases);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn host_emulation_on_linux_checks_namespaces() {
        assert_eq!(MockConfig::emulating_host().xattr_policy, XattrPolicy::LINUX);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_round_trips_through_json() {
        let config = MockConfig::default().with_home("/home/ci");
        let json = serde_json::to_string(&config).unwrap();
        let back: MockConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
