use std::sync::Arc;

use flume::Receiver;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::work::client::{Client, SharedSender};
use crate::work::entry::QueueEntry;
use crate::work::handler::JobHandler;

/// Sizing of a [`WorkerPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of jobs that may run at the same time.
    pub workers: usize,
    /// Jobs that may wait in the queue before `Client::send` waits.
    pub queue_capacity: usize,
}

impl PoolConfig {
    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            queue_capacity: workers,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::with_workers(10)
    }
}

#[derive(Debug)]
struct Worker {
    index: usize,
    join_handle: JoinHandle<()>,
}

impl Worker {
    fn spawn<THandler: JobHandler>(
        index: usize,
        handler: Arc<THandler>,
        receiver: Receiver<QueueEntry<THandler>>,
        cancel: CancellationToken,
    ) -> Self {
        let join_handle = tokio::spawn(worker_loop(index, handler, receiver, cancel));
        Self { index, join_handle }
    }

    async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.join_handle.await
    }
}

// Runs until every sender is gone and the queue is empty. Entries that are
// still queued after cancellation are handed to the handler with the
// cancelled token, so each one reports instead of vanishing.
async fn worker_loop<THandler: JobHandler>(
    index: usize,
    handler: Arc<THandler>,
    receiver: Receiver<QueueEntry<THandler>>,
    cancel: CancellationToken,
) {
    tracing::trace!("Worker {index} started");

    while let Ok(entry) = receiver.recv_async().await {
        tracing::trace!(
            "Worker {index} processing job {}, added {}ms ago",
            entry.id,
            entry.queue_time.elapsed().as_millis()
        );

        let output = handler.handle(entry.request, &cancel).await;

        if entry.response_tx.send(output).is_err() {
            tracing::debug!("Receiver of job {} went away before completion", entry.id);
        }
    }

    tracing::trace!("Worker {index} stopped");
}

/// A fixed set of workers sharing one bounded queue.
///
/// The pool is meant to live as long as the process. [`WorkerPool::shutdown`]
/// cancels in-flight work, lets the queue drain and joins every worker.
pub struct WorkerPool<THandler>
where
    THandler: JobHandler,
{
    tx: SharedSender<THandler>,
    workers: Mutex<Vec<Worker>>,
    cancel: CancellationToken,
    config: PoolConfig,
}

impl<THandler> WorkerPool<THandler>
where
    THandler: JobHandler,
{
    /// Spawn the workers. Must be called from within a tokio runtime.
    pub fn new(handler: THandler, config: PoolConfig) -> Self {
        let (tx, rx) = flume::bounded(config.queue_capacity.max(1));
        let handler = Arc::new(handler);
        let cancel = CancellationToken::new();

        let workers = (0..config.workers.max(1))
            .map(|index| Worker::spawn(index, handler.clone(), rx.clone(), cancel.clone()))
            .collect::<Vec<_>>();

        tracing::debug!("Started worker pool with {} workers", workers.len());

        Self {
            tx: Arc::new(RwLock::new(Some(tx))),
            workers: Mutex::new(workers),
            cancel,
            config,
        }
    }

    pub fn client(&self) -> Client<THandler> {
        Client::new(self.tx.clone())
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the pool.
    ///
    /// New submissions fail with `PoolClosed`, running jobs see the cancelled
    /// token and queued jobs report as cancelled. Safe to call more than once:
    /// the workers are joined by the first call only.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        // Waits for in-flight `Client::send` calls, then drops the only sender
        // so the workers exit once the queue is empty.
        if self.tx.write().await.take().is_some() {
            tracing::info!("Shutting down worker pool");
        }

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            let index = worker.index;
            if let Err(e) = worker.join().await {
                tracing::error!("Worker {index} terminated abnormally: {e}");
            }
        }
    }
}
