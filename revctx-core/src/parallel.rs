//! Resolves comment contexts on a pool of worker threads.
//!
//! Revision groups are independent of each other, so they are sharded over
//! workers through a crossbeam channel. Each worker opens its own content
//! source: `git2::Repository` is !Sync and must be opened inside the thread
//! that uses it, never shared.

use std::collections::HashMap;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crossbeam_channel::Receiver;
use git2::Oid;
use tracing::{debug, info};

use crate::error::{ContextError, Result, StoreError};
use crate::loader::{group_by_commit, ContextLoader, ContextMap};
use crate::source::ContentSource;
use crate::types::Comment;

const DEFAULT_WORKERS: usize = 4;

type Job<'c> = (Oid, Vec<&'c Comment>);

/// The first error raised by any worker, in the order workers raised them.
#[derive(Debug, Default)]
struct FirstFailure {
    raised: AtomicBool,
    error: Mutex<Option<ContextError>>,
}

impl FirstFailure {
    fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Keeps `err` only if no other worker failed before it.
    fn record(&self, err: ContextError) {
        if !self.raised.swap(true, Ordering::AcqRel) {
            *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
        }
    }

    fn into_error(self) -> Option<ContextError> {
        self.error.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Parallel counterpart of [`ContextLoader`].
///
/// `open` is called once per worker thread to create that worker's source.
pub struct ParallelContextLoader<F> {
    open: F,
    workers: usize,
    padding: u32,
}

impl<F, S> ParallelContextLoader<F>
where
    F: Fn() -> std::result::Result<S, StoreError> + Sync,
    S: ContentSource,
{
    pub fn new(open: F) -> Self {
        Self { open, workers: DEFAULT_WORKERS, padding: 0 }
    }

    /// Sets the maximum number of worker threads (at least one).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Loads the context for multiple comments, one revision group per job.
    ///
    /// Produces the same mapping as [`ContextLoader::get_context`]. The first
    /// failure in time stops workers from taking further jobs, and its error
    /// is returned.
    pub fn get_context<'c, I>(&self, comments: I) -> Result<ContextMap<'c>>
    where
        I: IntoIterator<Item = &'c Comment>,
    {
        let groups = group_by_commit(comments);
        if groups.is_empty() {
            return Ok(HashMap::new());
        }
        let total: usize = groups.values().map(Vec::len).sum();
        let workers = self.workers.min(groups.len());
        info!(groups = groups.len(), comments = total, workers, "resolving comment contexts");

        let (tx, rx) = crossbeam_channel::unbounded::<Job<'c>>();
        for job in groups {
            // The receiver outlives this loop, so sending cannot fail.
            let _ = tx.send(job);
        }
        drop(tx);

        let failure = FirstFailure::default();
        let outcomes = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let rx = &rx;
                    let failure = &failure;
                    scope.spawn(move || self.worker_loop(worker, rx, failure))
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
        });

        let mut result = HashMap::with_capacity(total);
        for outcome in outcomes {
            match outcome {
                Ok(partial) => result.extend(partial),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        match failure.into_error() {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Takes jobs until the queue is drained or some worker has failed.
    /// Errors go to `failure`; the partial map is discarded by the caller then.
    fn worker_loop<'c>(
        &self,
        worker: usize,
        rx: &Receiver<Job<'c>>,
        failure: &FirstFailure,
    ) -> ContextMap<'c> {
        let _span = tracing::info_span!("context_worker", worker).entered();

        let mut out = HashMap::new();
        let source = match (self.open)() {
            Ok(source) => source,
            Err(e) => {
                failure.record(e.into());
                return out;
            }
        };
        let loader = ContextLoader::new(source).with_padding(self.padding);

        for (commit_id, comments) in rx.iter() {
            if failure.is_raised() {
                debug!("stopping after a failure");
                break;
            }
            if let Err(e) = loader.resolve_group(commit_id, &comments, &mut out) {
                failure.record(e);
                break;
            }
        }
        out
    }
}
