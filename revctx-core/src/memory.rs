//! In-process [`RevisionStore`] for tests and tooling.
//!
//! Commits, trees and blobs live in hash maps; object ids are synthesized
//! with git's object hashing so they look and sort like real ids. Every
//! store call is counted so callers can observe how often the engine
//! reaches into the store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use git2::{ObjectType, Oid};

use crate::error::StoreError;
use crate::source::RevisionStore;
use crate::types::Revision;

/// Snapshot of how many times each store operation ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub parse_revision: usize,
    pub find_path: usize,
    pub open_blob: usize,
    pub merged_commits: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.parse_revision + self.find_path + self.open_blob + self.merged_commits
    }
}

#[derive(Debug, Default)]
struct Counters {
    parse_revision: AtomicUsize,
    find_path: AtomicUsize,
    open_blob: AtomicUsize,
    merged_commits: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    commits: HashMap<Oid, Revision>,
    /// Creation sequence of each commit; higher is newer.
    sequence: HashMap<Oid, usize>,
    trees: HashMap<Oid, BTreeMap<String, Oid>>,
    blobs: HashMap<Oid, Vec<u8>>,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a commit whose tree holds exactly `files` (`(path, text)`).
    ///
    /// Returns the new commit id. Identical inputs still produce distinct
    /// commits.
    pub fn commit(
        &mut self,
        message: &str,
        parents: &[Oid],
        files: &[(&str, &str)],
    ) -> Result<Oid, StoreError> {
        let mut entries = BTreeMap::new();
        for (path, text) in files {
            let blob = Oid::hash_object(ObjectType::Blob, text.as_bytes())?;
            self.blobs.insert(blob, text.as_bytes().to_vec());
            entries.insert((*path).to_owned(), blob);
        }

        let mut tree_repr = String::new();
        for (path, blob) in &entries {
            tree_repr.push_str(&format!("{blob} {path}\n"));
        }
        let tree = Oid::hash_object(ObjectType::Tree, tree_repr.as_bytes())?;
        self.trees.insert(tree, entries);

        let seq = self.commits.len();
        let mut commit_repr = format!("tree {tree}\n");
        for parent in parents {
            commit_repr.push_str(&format!("parent {parent}\n"));
        }
        commit_repr.push_str(&format!("seq {seq}\n\n{message}"));
        let id = Oid::hash_object(ObjectType::Commit, commit_repr.as_bytes())?;

        self.commits.insert(
            id,
            Revision { id, tree, message: message.to_owned(), parents: parents.to_vec() },
        );
        self.sequence.insert(id, seq);
        Ok(id)
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            parse_revision: self.counters.parse_revision.load(Ordering::Relaxed),
            find_path: self.counters.find_path.load(Ordering::Relaxed),
            open_blob: self.counters.open_blob.load(Ordering::Relaxed),
            merged_commits: self.counters.merged_commits.load(Ordering::Relaxed),
        }
    }

    fn ancestors(&self, start: Oid, out: &mut HashSet<Oid>) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !out.insert(id) {
                continue;
            }
            if let Some(commit) = self.commits.get(&id) {
                stack.extend(commit.parents.iter().copied());
            }
        }
    }
}

impl RevisionStore for MemoryStore {
    fn parse_revision(&self, id: Oid) -> Result<Revision, StoreError> {
        self.counters.parse_revision.fetch_add(1, Ordering::Relaxed);
        self.commits.get(&id).cloned().ok_or(StoreError::RevisionNotFound(id))
    }

    fn find_path(&self, tree: Oid, path: &str) -> Result<Option<Oid>, StoreError> {
        self.counters.find_path.fetch_add(1, Ordering::Relaxed);
        let entries = self.trees.get(&tree).ok_or(StoreError::ObjectNotFound(tree))?;
        Ok(entries.get(path).copied())
    }

    fn open_blob(&self, id: Oid) -> Result<Vec<u8>, StoreError> {
        self.counters.open_blob.fetch_add(1, Ordering::Relaxed);
        self.blobs.get(&id).cloned().ok_or(StoreError::ObjectNotFound(id))
    }

    fn merged_commits(
        &self,
        merge: &Revision,
        uninteresting_parent: usize,
    ) -> Result<Vec<Revision>, StoreError> {
        self.counters.merged_commits.fetch_add(1, Ordering::Relaxed);

        let mut hidden = HashSet::new();
        let mut reachable = HashSet::new();
        for (idx, parent) in merge.parents.iter().enumerate() {
            if idx + 1 == uninteresting_parent {
                self.ancestors(*parent, &mut hidden);
            } else {
                self.ancestors(*parent, &mut reachable);
            }
        }

        let mut merged = reachable
            .difference(&hidden)
            .map(|id| self.commits.get(id).cloned().ok_or(StoreError::RevisionNotFound(*id)))
            .collect::<Result<Vec<_>, _>>()?;
        merged.sort_by_key(|c| std::cmp::Reverse(self.sequence.get(&c.id).copied()));
        Ok(merged)
    }
}
