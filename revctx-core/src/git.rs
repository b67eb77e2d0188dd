//! [`RevisionStore`] over a libgit2 repository.
//!
//! `git2::Repository` is `Send` but not `Sync`: a `GitStore` belongs to one
//! thread at a time. The parallel loader opens one store per worker.

use std::path::Path;

use git2::{Commit, ErrorCode, ObjectType, Oid, Repository, Sort};

use crate::error::StoreError;
use crate::source::RevisionStore;
use crate::types::Revision;

pub struct GitStore {
    repo: Repository,
}

impl GitStore {
    /// Opens the repository at `path` (work tree or bare).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self { repo: Repository::open(path)? })
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }

    /// Resolves a revision expression (`HEAD~1`, a branch, a hex id) to the
    /// id of the commit it names.
    pub fn resolve_spec(&self, spec: &str) -> Result<Oid, StoreError> {
        Ok(self.repo.revparse_single(spec)?.peel_to_commit()?.id())
    }
}

fn to_revision(commit: &Commit<'_>) -> Revision {
    Revision {
        id: commit.id(),
        tree: commit.tree_id(),
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        parents: commit.parent_ids().collect(),
    }
}

/// Whether `path` can name a tree entry at all: non-empty, relative and
/// free of empty, `.` and `..` segments.
fn is_tree_path(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(|seg| !matches!(seg, "" | "." | ".."))
}

impl RevisionStore for GitStore {
    fn parse_revision(&self, id: Oid) -> Result<Revision, StoreError> {
        match self.repo.find_commit(id) {
            Ok(commit) => Ok(to_revision(&commit)),
            Err(e) if e.code() == ErrorCode::NotFound => Err(StoreError::RevisionNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    fn find_path(&self, tree: Oid, path: &str) -> Result<Option<Oid>, StoreError> {
        let tree = self.repo.find_tree(tree)?;
        // libgit2 rejects these with a generic error rather than NotFound.
        if !is_tree_path(path) {
            return Ok(None);
        }
        match tree.get_path(Path::new(path)) {
            Ok(entry) if entry.kind() == Some(ObjectType::Blob) => Ok(Some(entry.id())),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn open_blob(&self, id: Oid) -> Result<Vec<u8>, StoreError> {
        match self.repo.find_blob(id) {
            Ok(blob) => Ok(blob.content().to_vec()),
            Err(e) if e.code() == ErrorCode::NotFound => Err(StoreError::ObjectNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    fn merged_commits(
        &self,
        merge: &Revision,
        uninteresting_parent: usize,
    ) -> Result<Vec<Revision>, StoreError> {
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TIME)?;
        for (idx, parent) in merge.parents.iter().enumerate() {
            if idx + 1 == uninteresting_parent {
                walk.hide(*parent)?;
            } else {
                walk.push(*parent)?;
            }
        }
        walk.map(|oid| -> Result<Revision, StoreError> {
            let commit = self.repo.find_commit(oid?)?;
            Ok(to_revision(&commit))
        })
        .collect()
    }
}
