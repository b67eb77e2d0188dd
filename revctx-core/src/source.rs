//! Content classes and the adapter that renders them from a revision store.
//!
//! A [`RevisionStore`] only knows commits, trees and blobs. [`StoreSource`]
//! turns those into line-addressable [`Content`] for each [`ContentClass`]:
//! tracked files are decoded blobs, the commit message and the merge list
//! are rendered documents.

use std::fmt::Write as _;

use git2::Oid;

use crate::content::Content;
use crate::error::StoreError;
use crate::types::{abbreviate, Revision, COMMIT_MSG, MERGE_LIST};

/// Parent that merge lists are computed against (1-based).
pub const MERGE_LIST_PARENT: usize = 1;

/// Read-only capabilities the engine needs from an object database.
pub trait RevisionStore {
    /// Parses the commit `id`.
    fn parse_revision(&self, id: Oid) -> Result<Revision, StoreError>;

    /// Looks up `path` in `tree`. Returns `None` when no file lives at
    /// `path`; directories and submodules count as absent.
    fn find_path(&self, tree: Oid, path: &str) -> Result<Option<Oid>, StoreError>;

    /// Reads the raw bytes of blob `id`.
    fn open_blob(&self, id: Oid) -> Result<Vec<u8>, StoreError>;

    /// Commits reachable from the parents of `merge` other than parent
    /// number `uninteresting_parent` (1-based), excluding everything
    /// reachable from that parent. Newest first.
    fn merged_commits(
        &self,
        merge: &Revision,
        uninteresting_parent: usize,
    ) -> Result<Vec<Revision>, StoreError>;
}

impl<S: RevisionStore + ?Sized> RevisionStore for &S {
    fn parse_revision(&self, id: Oid) -> Result<Revision, StoreError> {
        (**self).parse_revision(id)
    }

    fn find_path(&self, tree: Oid, path: &str) -> Result<Option<Oid>, StoreError> {
        (**self).find_path(tree, path)
    }

    fn open_blob(&self, id: Oid) -> Result<Vec<u8>, StoreError> {
        (**self).open_blob(id)
    }

    fn merged_commits(
        &self,
        merge: &Revision,
        uninteresting_parent: usize,
    ) -> Result<Vec<Revision>, StoreError> {
        (**self).merged_commits(merge, uninteresting_parent)
    }
}

/// The kind of document a comment path points into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentClass {
    /// A tracked file in the revision's tree.
    File(String),
    /// The revision's commit message.
    CommitMessage,
    /// Commits merged in, relative to parent number `parent` (1-based).
    MergeList { parent: usize },
}

impl ContentClass {
    /// Classifies a comment path. The pseudo-paths select the rendered
    /// documents; anything else is a tree path.
    pub fn for_path(path: &str) -> Self {
        match path {
            COMMIT_MSG => ContentClass::CommitMessage,
            MERGE_LIST => ContentClass::MergeList { parent: MERGE_LIST_PARENT },
            _ => ContentClass::File(path.to_owned()),
        }
    }
}

/// Produces line-addressable content for a resolved revision.
pub trait ContentSource {
    fn resolve_revision(&self, id: Oid) -> Result<Revision, StoreError>;

    /// Lines of the file at `path`, or `None` if the tree has no such file.
    fn lines_of_file(&self, revision: &Revision, path: &str) -> Result<Option<Content>, StoreError>;

    fn lines_of_commit_message(&self, revision: &Revision) -> Result<Content, StoreError>;

    /// The merge list of `revision` against parent number `parent`. Empty for
    /// revisions with fewer than two parents.
    fn lines_of_merge_list(&self, revision: &Revision, parent: usize) -> Result<Content, StoreError>;

    /// Dispatches on `class`. `None` only for a file missing from the tree.
    fn lines_of(
        &self,
        revision: &Revision,
        class: &ContentClass,
    ) -> Result<Option<Content>, StoreError> {
        match class {
            ContentClass::File(path) => self.lines_of_file(revision, path),
            ContentClass::CommitMessage => self.lines_of_commit_message(revision).map(Some),
            ContentClass::MergeList { parent } => {
                self.lines_of_merge_list(revision, *parent).map(Some)
            }
        }
    }
}

/// [`ContentSource`] backed by any [`RevisionStore`].
#[derive(Debug, Clone)]
pub struct StoreSource<S> {
    store: S,
}

impl<S: RevisionStore> StoreSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: RevisionStore> ContentSource for StoreSource<S> {
    fn resolve_revision(&self, id: Oid) -> Result<Revision, StoreError> {
        self.store.parse_revision(id)
    }

    fn lines_of_file(
        &self,
        revision: &Revision,
        path: &str,
    ) -> Result<Option<Content>, StoreError> {
        let Some(blob) = self.store.find_path(revision.tree, path)? else {
            return Ok(None);
        };
        let raw = self.store.open_blob(blob)?;
        Ok(Some(Content::from_bytes(&raw)))
    }

    fn lines_of_commit_message(&self, revision: &Revision) -> Result<Content, StoreError> {
        Ok(Content::from_text(&revision.message))
    }

    fn lines_of_merge_list(
        &self,
        revision: &Revision,
        parent: usize,
    ) -> Result<Content, StoreError> {
        if !revision.is_merge() {
            return Ok(Content::empty());
        }
        let merged = self.store.merged_commits(revision, parent)?;
        Ok(Content::from_text(&render_merge_list(&merged)))
    }
}

/// Renders the merge list document for already-collected commits.
pub fn render_merge_list(merged: &[Revision]) -> String {
    let mut doc = String::from("Merge List:\n\n");
    for commit in merged {
        let _ = writeln!(doc, "* {} {}", abbreviate(commit.id), short_message(&commit.message));
    }
    doc
}

/// The first paragraph of a commit message, folded onto one line.
pub fn short_message(message: &str) -> String {
    let paragraph = message.trim_start().split("\n\n").next().unwrap_or_default();
    paragraph.trim().lines().collect::<Vec<_>>().join(" ")
}
