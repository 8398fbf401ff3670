//! Set abstraction over compiled-object file paths.
//!
//! The sync algorithm is nothing but set algebra over "files the PLT has" and
//! "files the PLT should have", so the set operations live here as
//! first-class, independently testable functions. Backed by a `BTreeSet` so
//! iteration order (and therefore backend invocation order and output files)
//! is deterministic.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;

/// A deduplicated, order-irrelevant set of compiled-object file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    paths: BTreeSet<Utf8PathBuf>,
}

impl FileSet {
    /// Create an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single path. Returns false if it was already present.
    pub fn insert(&mut self, path: Utf8PathBuf) -> bool {
        self.paths.insert(path)
    }

    /// Add every path from `other` to this set.
    pub fn extend(&mut self, other: FileSet) {
        self.paths.extend(other.paths);
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate the paths in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        self.paths.iter().map(Utf8PathBuf::as_path)
    }

    /// The paths as a sorted vector, the shape backend invocations take.
    pub fn to_sorted_vec(&self) -> Vec<Utf8PathBuf> {
        self.paths.iter().cloned().collect()
    }

    /// Paths in `self` but not in `other`.
    pub fn difference(&self, other: &FileSet) -> FileSet {
        FileSet {
            paths: self.paths.difference(&other.paths).cloned().collect(),
        }
    }

    /// Paths in both `self` and `other`.
    pub fn intersection(&self, other: &FileSet) -> FileSet {
        FileSet {
            paths: self.paths.intersection(&other.paths).cloned().collect(),
        }
    }

    /// Paths in either `self` or `other`.
    pub fn union(&self, other: &FileSet) -> FileSet {
        FileSet {
            paths: self.paths.union(&other.paths).cloned().collect(),
        }
    }
}

impl FromIterator<Utf8PathBuf> for FileSet {
    fn from_iter<I: IntoIterator<Item = Utf8PathBuf>>(iter: I) -> Self {
        FileSet {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FileSet {
    type Item = Utf8PathBuf;
    type IntoIter = std::collections::btree_set::IntoIter<Utf8PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// The three pairwise-disjoint partitions a sync run works through.
///
/// `remove ∪ check ∪ add` always equals `old ∪ new`:
/// - `remove`: in the PLT, no longer required
/// - `check`: in the PLT and still required (re-validated in place)
/// - `add`: required, not yet in the PLT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPartition {
    pub remove: FileSet,
    pub check: FileSet,
    pub add: FileSet,
}

impl SyncPartition {
    /// Partition `old` (current PLT contents) against `new` (required set).
    pub fn partition(old: &FileSet, new: &FileSet) -> SyncPartition {
        SyncPartition {
            remove: old.difference(new),
            check: old.intersection(new),
            add: new.difference(old),
        }
    }

    /// True when no sub-phase has any work. Since the partitions cover
    /// `old ∪ new`, this means both input sets were empty.
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.check.is_empty() && self.add.is_empty()
    }
}
