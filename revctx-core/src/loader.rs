//! Batch resolution of comment contexts.
//!
//! Comments are grouped by commit so each commit is parsed once, and every
//! content class (file path, commit message, merge list) is loaded at most
//! once per commit no matter how many comments point into it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use git2::Oid;
use tracing::{debug, instrument, warn};

use crate::cache::{ContentCache, OnceSlot};
use crate::content::{self, Content};
use crate::error::{Result, StoreError};
use crate::range;
use crate::source::{ContentClass, ContentSource};
use crate::types::{Comment, Context, Revision};

/// Context of every comment in a batch, keyed by the comment itself.
pub type ContextMap<'c> = HashMap<&'c Comment, Context>;

/// Resolves the context of comments against a [`ContentSource`].
#[derive(Debug, Clone)]
pub struct ContextLoader<S> {
    source: S,
    padding: u32,
}

impl<S: ContentSource> ContextLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source, padding: 0 }
    }

    /// Adds up to `padding` lines before and after each comment's own lines.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Loads the context for multiple comments at once.
    ///
    /// Every distinct input comment gets exactly one entry. Comments without
    /// an anchor, and comments on paths missing from their commit's tree,
    /// map to an empty [`Context`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::ContextError::InvalidRange`] if any comment's range
    /// does not fit its content, and [`crate::ContextError::Storage`] if the
    /// store fails. Either aborts the whole batch.
    pub fn get_context<'c, I>(&self, comments: I) -> Result<ContextMap<'c>>
    where
        I: IntoIterator<Item = &'c Comment>,
    {
        let groups = group_by_commit(comments);
        let mut result = HashMap::with_capacity(groups.values().map(Vec::len).sum());
        for (commit_id, group) in groups {
            self.resolve_group(commit_id, &group, &mut result)?;
        }
        Ok(result)
    }

    /// Resolves all comments on `commit_id` into `out`.
    #[instrument(skip_all, fields(commit = %commit_id, comments = comments.len()))]
    pub(crate) fn resolve_group<'c>(
        &self,
        commit_id: Oid,
        comments: &[&'c Comment],
        out: &mut ContextMap<'c>,
    ) -> Result<()> {
        let group = RevisionGroup::new(&self.source, commit_id);
        for &comment in comments {
            let context = self.context_for(&group, comment)?;
            out.insert(comment, context);
        }
        Ok(())
    }

    fn context_for(&self, group: &RevisionGroup<'_, S>, comment: &Comment) -> Result<Context> {
        let Some(range) = range::resolve(comment) else {
            return Ok(Context::empty());
        };
        let class = ContentClass::for_path(&comment.file_path);
        match group.content(&class)? {
            Some(text) => content::assemble_padded(&text, range, self.padding),
            None => {
                let revision = group.revision()?;
                warn!(
                    path = %comment.file_path,
                    tree = %revision.tree,
                    "could not find path in the git tree"
                );
                Ok(Context::empty())
            }
        }
    }
}

/// Groups comments by the commit they are anchored to.
///
/// Groups are ordered by commit id; within a group the input order is kept.
pub fn group_by_commit<'c, I>(comments: I) -> BTreeMap<Oid, Vec<&'c Comment>>
where
    I: IntoIterator<Item = &'c Comment>,
{
    let mut groups: BTreeMap<Oid, Vec<&'c Comment>> = BTreeMap::new();
    for comment in comments {
        groups.entry(comment.commit_id).or_default().push(comment);
    }
    groups
}

/// Per-commit scope: the parsed commit and its loaded content.
///
/// The commit is parsed on first use, so a group whose comments all lack
/// anchors never touches the store.
struct RevisionGroup<'s, S> {
    source: &'s S,
    commit_id: Oid,
    revision: OnceSlot<Arc<Revision>>,
    contents: ContentCache,
}

impl<'s, S: ContentSource> RevisionGroup<'s, S> {
    fn new(source: &'s S, commit_id: Oid) -> Self {
        Self {
            source,
            commit_id,
            revision: OnceSlot::default(),
            contents: ContentCache::default(),
        }
    }

    fn revision(&self) -> std::result::Result<Arc<Revision>, StoreError> {
        self.revision
            .get_or_try_init(|| self.source.resolve_revision(self.commit_id).map(Arc::new))
    }

    fn content(&self, class: &ContentClass) -> std::result::Result<Option<Arc<Content>>, StoreError> {
        self.contents.get_or_load(class, || {
            let revision = self.revision()?;
            let loaded = self.source.lines_of(&revision, class)?;
            debug!(
                ?class,
                lines = loaded.as_ref().map(Content::line_count),
                "loaded content"
            );
            Ok(loaded)
        })
    }
}
