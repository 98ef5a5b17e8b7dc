// src/core/build_dirs.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The build directories a session is responsible for deleting at teardown.
/// Pure bookkeeping: nothing here touches the filesystem.
#[derive(Debug, Default, Clone)]
pub struct BuildDirs {
    dirs: BTreeSet<PathBuf>,
}

impl BuildDirs {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the path was not tracked yet.
    pub fn track(&mut self, dir: PathBuf) -> bool {
        self.dirs.insert(dir)
    }

    /// Returns `true` if the path was tracked.
    pub fn untrack(&mut self, dir: &Path) -> bool {
        self.dirs.remove(dir)
    }

    /// Whether `dir` is tracked.
    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    /// Number of tracked directories.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// `true` when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// The tracked paths in sorted order, without removing them.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.dirs.iter().cloned().collect()
    }

    /// Takes every tracked path out, leaving the set empty.
    pub fn drain(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.dirs).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_untrack_and_drain() {
        let mut dirs = BuildDirs::new();
        assert!(dirs.track(PathBuf::from("/pkg/a/build")));
        assert!(!dirs.track(PathBuf::from("/pkg/a/build")));
        assert!(dirs.track(PathBuf::from("/pkg/b/build")));
        assert_eq!(dirs.len(), 2);

        assert!(dirs.untrack(Path::new("/pkg/a/build")));
        assert!(!dirs.contains(Path::new("/pkg/a/build")));

        let drained = dirs.drain();
        assert_eq!(drained, vec![PathBuf::from("/pkg/b/build")]);
        assert!(dirs.is_empty());
        assert!(dirs.drain().is_empty());
    }
}
