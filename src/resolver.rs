//! # Path Resolution Engine
//!
//! Computes canonical paths over any node source that can answer "what is at
//! this exact path", following symlinks and aliases along the way.
//!
//! ## Modes
//!
//! - **Full** ([`Follow::All`]): every resolvable node met while walking is
//!   substituted, including one in the final component. This is `realpath`.
//! - **Ancestors only** ([`Follow::Ancestors`]): the final component is kept
//!   as is, so callers can tell "this path IS a symlink" from "this path
//!   points through a symlink".
//!
//! ## Algorithm
//!
//! The walk keeps a stack of pending components and an accumulated `built`
//! path. After each component is appended, a resolvable node at `built` is
//! replaced by its destination (spliced against `built`'s parent when
//! relative), and the destination's components are pushed in front of the
//! remaining ones so the walk restarts from the root with the new base.
//!
//! Every link substituted is recorded in a per-call visited set. Entering the
//! same link twice yields [`Resolution::CircularChain`] carrying the first link
//! of the chain.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::trace;

use crate::path::{PathExt, normalize};
use crate::{FsError, NodeType};

/// What a node source holds at one exact path.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Probe<'a> {
    /// Nothing.
    Missing,
    /// A non-resolvable node.
    Node(NodeType),
    /// A resolvable node and its stored destination.
    Link(&'a Path),
}

/// A store the engine can walk.
pub(crate) trait LinkSource {
    /// Look at exactly `path`, never following anything.
    fn probe(&self, path: &Path) -> Probe<'_>;
}

/// Which resolvable components get substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Follow {
    /// Every component, including the last.
    All,
    /// Every component except the last.
    Ancestors,
}

/// Outcome of a resolution walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// The canonical path. Its final component may not exist.
    Resolved(PathBuf),
    /// The walk entered a loop. Carries the first link entered.
    CircularChain(PathBuf),
    /// An intermediate component is missing.
    NotFound(PathBuf),
}

impl Resolution {
    pub(crate) fn into_result(self) -> Result<PathBuf, FsError> {
        match self {
            Resolution::Resolved(path) => Ok(path),
            Resolution::CircularChain(path) => Err(FsError::CircularChain { path }),
            Resolution::NotFound(path) => Err(FsError::NotFound { path }),
        }
    }
}

/// Resolve an absolute `path` against `source`.
///
/// A missing intermediate component reports the path the caller asked for,
/// unless the walk was expanding a link destination at the time, in which
/// case the destination is reported.
pub(crate) fn resolve<S: LinkSource + ?Sized>(source: &S, path: &Path, follow: Follow) -> Resolution {
    let original = normalize(path);
    let mut pending = reversed_components(&original);
    let mut built = PathBuf::from("/");

    let mut visited = HashSet::new();
    let mut chain: Vec<PathBuf> = Vec::new();
    // Destinations being expanded, with the pending depth each one ends at.
    let mut expanding: Vec<(PathBuf, usize)> = Vec::new();

    while let Some(name) = pending.pop() {
        built.push(&name);
        let is_final = pending.is_empty();
        while expanding
            .last()
            .is_some_and(|(_, floor)| pending.len() < *floor)
        {
            expanding.pop();
        }

        match source.probe(&built) {
            Probe::Missing if !is_final => {
                let reported = match expanding.last() {
                    Some((destination, _)) => destination.clone(),
                    None => original,
                };
                return Resolution::NotFound(reported);
            }
            Probe::Link(destination) if !is_final || follow == Follow::All => {
                if !visited.insert(built.clone()) {
                    let start = chain.first().cloned().unwrap_or(built);
                    return Resolution::CircularChain(start);
                }
                chain.push(built.clone());

                let target = normalize(&built.removing_last_component().join(destination));
                trace!(link = %built.display(), target = %target.display(), "substituting link");

                let floor = pending.len();
                pending.extend(reversed_components(&target));
                expanding.push((target, floor));
                built = PathBuf::from("/");
            }
            _ => {}
        }
    }

    Resolution::Resolved(built)
}

/// Normal components of a normalized path, last first.
fn reversed_components(path: &Path) -> Vec<OsString> {
    path.components()
        .rev()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_os_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Minimal node source keyed by path
    struct MockSource {
        entries: HashMap<PathBuf, MockEntry>,
    }

    enum MockEntry {
        Node(NodeType),
        Link(PathBuf),
    }

    impl MockSource {
        fn new() -> Self {
            let mut entries = HashMap::new();
            entries.insert(PathBuf::from("/"), MockEntry::Node(NodeType::Dir));
            Self { entries }
        }

        fn dir(mut self, path: &str) -> Self {
            self.entries
                .insert(PathBuf::from(path), MockEntry::Node(NodeType::Dir));
            self
        }

        fn file(mut self, path: &str) -> Self {
            self.entries
                .insert(PathBuf::from(path), MockEntry::Node(NodeType::File));
            self
        }

        fn link(mut self, path: &str, target: &str) -> Self {
            self.entries
                .insert(PathBuf::from(path), MockEntry::Link(PathBuf::from(target)));
            self
        }
    }

    impl LinkSource for MockSource {
        fn probe(&self, path: &Path) -> Probe<'_> {
            match self.entries.get(path) {
                None => Probe::Missing,
                Some(MockEntry::Node(kind)) => Probe::Node(*kind),
                Some(MockEntry::Link(target)) => Probe::Link(target),
            }
        }
    }

    fn realpath(source: &MockSource, path: &str) -> Resolution {
        resolve(source, Path::new(path), Follow::All)
    }

    fn resolved(path: &str) -> Resolution {
        Resolution::Resolved(PathBuf::from(path))
    }

    #[test]
    fn canonical_path_is_unchanged() {
        let source = MockSource::new().dir("/a").dir("/a/b").file("/a/b/f");
        assert_eq!(realpath(&source, "/a/b/f"), resolved("/a/b/f"));
        assert_eq!(realpath(&source, "/"), resolved("/"));
    }

    #[test]
    fn resolving_twice_matches_resolving_once() {
        let source = MockSource::new().dir("/t").file("/t/f").link("/l", "/t");
        let once = realpath(&source, "/l/f");
        let Resolution::Resolved(path) = once.clone() else {
            panic!("expected resolution, got {once:?}");
        };
        assert_eq!(resolve(&source, &path, Follow::All), once);
    }

    #[test]
    fn follows_absolute_link_in_ancestor() {
        let source = MockSource::new().dir("/target").file("/target/f").link("/link", "/target");
        assert_eq!(realpath(&source, "/link/f"), resolved("/target/f"));
    }

    #[test]
    fn follows_relative_link_against_parent() {
        let source = MockSource::new()
            .dir("/dir")
            .dir("/dir/target")
            .link("/dir/link", "target");
        assert_eq!(realpath(&source, "/dir/link"), resolved("/dir/target"));
    }

    #[test]
    fn relative_link_with_parent_components() {
        let source = MockSource::new()
            .dir("/a")
            .dir("/b")
            .file("/b/f")
            .link("/a/up", "../b");
        assert_eq!(realpath(&source, "/a/up/f"), resolved("/b/f"));
    }

    #[test]
    fn link_chain_resolves_to_end() {
        let source = MockSource::new()
            .dir("/d")
            .link("/one", "/two")
            .link("/two", "/three")
            .link("/three", "/d");
        assert_eq!(realpath(&source, "/one"), resolved("/d"));
    }

    #[test]
    fn ancestor_mode_keeps_final_link() {
        let source = MockSource::new()
            .dir("/d")
            .link("/d/s", "/elsewhere")
            .link("/l", "/d");
        assert_eq!(
            resolve(&source, Path::new("/l/s"), Follow::Ancestors),
            resolved("/d/s")
        );
    }

    #[test]
    fn ancestor_mode_follows_links_inside_destination() {
        let source = MockSource::new()
            .dir("/d")
            .link("/m", "/d")
            .link("/l", "/m");
        assert_eq!(
            resolve(&source, Path::new("/l/new"), Follow::Ancestors),
            resolved("/d/new")
        );
    }

    #[test]
    fn missing_final_component_still_resolves() {
        let source = MockSource::new().dir("/d").link("/l", "/d");
        assert_eq!(realpath(&source, "/l/new"), resolved("/d/new"));
    }

    #[test]
    fn missing_intermediate_reports_original_path() {
        let source = MockSource::new();
        assert_eq!(
            realpath(&source, "/nope/x"),
            Resolution::NotFound(PathBuf::from("/nope/x"))
        );
    }

    #[test]
    fn broken_link_reports_destination() {
        let source = MockSource::new().link("/s", "/missing");
        assert_eq!(
            realpath(&source, "/s/x"),
            Resolution::NotFound(PathBuf::from("/missing"))
        );
        assert_eq!(realpath(&source, "/s"), resolved("/missing"));
    }

    #[test]
    fn self_link_is_circular() {
        let source = MockSource::new().link("/a", "/a");
        assert_eq!(
            realpath(&source, "/a"),
            Resolution::CircularChain(PathBuf::from("/a"))
        );
    }

    #[test]
    fn relative_self_link_is_circular() {
        let source = MockSource::new().dir("/d").link("/d/me", "./me");
        assert_eq!(
            realpath(&source, "/d/me"),
            Resolution::CircularChain(PathBuf::from("/d/me"))
        );
    }

    #[test]
    fn three_link_cycle_reports_first_link() {
        let source = MockSource::new()
            .link("/a", "/b")
            .link("/b", "/c")
            .link("/c", "/a");
        assert_eq!(
            realpath(&source, "/a"),
            Resolution::CircularChain(PathBuf::from("/a"))
        );
        assert_eq!(
            realpath(&source, "/b"),
            Resolution::CircularChain(PathBuf::from("/b"))
        );
    }

    #[test]
    fn cycle_entered_through_another_link_reports_chain_start() {
        let source = MockSource::new()
            .link("/entry", "/a")
            .link("/a", "/b")
            .link("/b", "/a");
        assert_eq!(
            realpath(&source, "/entry"),
            Resolution::CircularChain(PathBuf::from("/entry"))
        );
    }

    #[test]
    fn ancestor_mode_ignores_cycle_in_final_component() {
        let source = MockSource::new().link("/a", "/b").link("/b", "/a");
        assert_eq!(
            resolve(&source, Path::new("/a"), Follow::Ancestors),
            resolved("/a")
        );
    }

    #[test]
    fn into_result_maps_errors() {
        let err = Resolution::CircularChain(PathBuf::from("/a"))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, FsError::CircularChain { path } if path == PathBuf::from("/a")));

        let err = Resolution::NotFound(PathBuf::from("/x")).into_result().unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
