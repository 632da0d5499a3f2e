//! Fixed-size worker pool for concurrent file downloads.
//!
//! Jobs sit in a shared queue; `workers` tasks (never more than there are jobs)
//! pull from it until it is empty. Each finished job produces one [`DownloadResult`] on a bounded
//! channel, so at most `workers` downloads are in flight and completed results
//! cannot pile up faster than the consumer drains them.
//!
//! # Concurrency Model
//!
//! - Each worker runs in its own Tokio task
//! - Claiming a job holds the queue lock only for the pop, never across an await
//! - The result stream ends once every worker has dropped its sender, which
//!   only happens after the queue is empty and its last download has returned

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use super::client::FileFetcher;
use super::constants::MAX_PARALLEL;
use super::error::DownloadError;
use super::filename::resolve_entry_name;
use super::report::Reporter;
use crate::api::FileDescriptor;

/// Minimum allowed worker count.
const MIN_PARALLEL: usize = 1;

/// One unit of work: a descriptor and its submission position.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Zero-based submission order.
    pub index: usize,
    pub descriptor: FileDescriptor,
}

/// Outcome of executing one [`DownloadJob`].
#[derive(Debug)]
pub struct DownloadResult {
    /// Zero-based submission order of the job.
    pub index: usize,
    pub descriptor: FileDescriptor,
    /// Sanitized archive entry name for this file.
    pub resolved_name: String,
    pub outcome: Result<Vec<u8>, DownloadError>,
}

type JobQueue = Arc<Mutex<VecDeque<DownloadJob>>>;

/// Worker pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool with `parallel` workers, clamped to `1..=MAX_PARALLEL`.
    #[must_use]
    pub fn new(parallel: usize) -> Self {
        let workers = parallel.clamp(MIN_PARALLEL, MAX_PARALLEL);
        if workers != parallel {
            debug!(requested = parallel, workers, "clamped worker count");
        }
        Self { workers }
    }

    /// Returns the number of workers the pool starts.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queues one job per descriptor and starts the workers.
    ///
    /// Starts `min(workers, jobs)` tasks. Must be called from within a Tokio runtime.
    #[instrument(skip_all, fields(workers = self.workers, jobs = descriptors.len()))]
    pub fn start(
        &self,
        descriptors: Vec<FileDescriptor>,
        fetcher: Arc<dyn FileFetcher>,
        reporter: Arc<dyn Reporter>,
    ) -> PoolRun {
        let total = descriptors.len();
        let jobs: VecDeque<DownloadJob> = descriptors
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| DownloadJob { index, descriptor })
            .collect();
        let queue: JobQueue = Arc::new(Mutex::new(jobs));

        // Never more workers than jobs; an empty queue starts none.
        let spawned = self.workers.min(total);
        let (tx, rx) = mpsc::channel(self.workers);
        let mut workers = JoinSet::new();
        for worker_id in 0..spawned {
            workers.spawn(run_worker(
                worker_id,
                total,
                Arc::clone(&queue),
                Arc::clone(&fetcher),
                Arc::clone(&reporter),
                tx.clone(),
            ));
        }
        // Only workers hold senders now, so the channel closes when the last one exits.
        drop(tx);

        debug!(spawned, "workers started");
        PoolRun {
            results: rx,
            workers,
            total,
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(super::constants::DEFAULT_PARALLEL)
    }
}

/// A running pool: the result stream plus the worker handles.
#[derive(Debug)]
pub struct PoolRun {
    results: mpsc::Receiver<DownloadResult>,
    workers: JoinSet<()>,
    total: usize,
}

impl PoolRun {
    /// Number of jobs submitted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Waits for the next result in completion order.
    ///
    /// Returns `None` once every worker has exited.
    pub async fn next_result(&mut self) -> Option<DownloadResult> {
        self.results.recv().await
    }

    /// Waits for every worker task to exit.
    ///
    /// Returns the number of workers that panicked. Panics are logged but do
    /// not fail the run.
    pub async fn join(mut self) -> usize {
        self.results.close();
        let mut panicked = 0;
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "download worker panicked");
                panicked += 1;
            }
        }
        panicked
    }
}

async fn run_worker(
    worker_id: usize,
    total: usize,
    queue: JobQueue,
    fetcher: Arc<dyn FileFetcher>,
    reporter: Arc<dyn Reporter>,
    results: mpsc::Sender<DownloadResult>,
) {
    let mut processed = 0usize;

    while let Some(job) = claim_next(&queue) {
        let resolved_name = resolve_entry_name(&job.descriptor);
        reporter.downloading(job.index + 1, total, &resolved_name);

        // A panicking fetch still yields one result for its job.
        let outcome = match AssertUnwindSafe(fetcher.fetch(&job.descriptor))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                warn!(worker_id, file_id = %job.descriptor.id, "fetch panicked");
                Err(DownloadError::panicked(&job.descriptor.id, payload.as_ref()))
            }
        };
        processed += 1;

        let result = DownloadResult {
            index: job.index,
            descriptor: job.descriptor,
            resolved_name,
            outcome,
        };
        if results.send(result).await.is_err() {
            warn!(worker_id, "result receiver dropped; worker stopping");
            return;
        }
    }

    debug!(worker_id, processed, "worker finished");
}

fn claim_next(queue: &JobQueue) -> Option<DownloadJob> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}
