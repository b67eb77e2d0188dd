//! Resolution of the source lines surrounding review comments.
//!
//! Given comments anchored to commits, [`ContextLoader`] returns for each
//! comment the lines it refers to: lines of a tracked file, of the commit
//! message (`/COMMIT_MSG`), or of the merge list (`/MERGE_LIST`). Comments
//! are grouped by commit so each commit is parsed once and each file blob is
//! decoded once per batch.
//!
//! The object database is reached through [`RevisionStore`]; [`GitStore`]
//! implements it over libgit2 and [`memory::MemoryStore`] in memory.

pub mod content;
pub mod db;
pub mod error;
pub mod git;
pub mod loader;
pub mod memory;
pub mod parallel;
pub mod range;
pub mod schema;
pub mod source;
pub mod types;

mod cache;

pub use content::{assemble, assemble_padded, Content};
pub use error::{ContextError, StoreError};
pub use git::GitStore;
pub use loader::{group_by_commit, ContextLoader, ContextMap};
pub use parallel::ParallelContextLoader;
pub use range::Range;
pub use source::{ContentClass, ContentSource, RevisionStore, StoreSource};
pub use types::{Comment, CommentRange, Context, Revision, Short, COMMIT_MSG, MERGE_LIST};
