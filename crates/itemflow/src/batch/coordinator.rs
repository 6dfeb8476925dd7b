use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::batch::handle::{BatchHandle, BatchResolver, RunId};
use crate::batch::{
    BatchConfig, BatchError, BatchResult, FailureCause, ItemFailure, ItemOutcome, ItemProcessor,
};
use crate::model::Item;
use crate::store::ItemStore;
use crate::work::{Client, WorkerPool};

/// Starts batch runs on a shared worker pool.
///
/// Cheap to clone. The pool itself is owned by whoever created it and must be
/// shut down separately.
#[derive(Clone)]
pub struct BatchCoordinator {
    store: Arc<dyn ItemStore>,
    client: Client<ItemProcessor>,
}

impl BatchCoordinator {
    pub fn new(store: Arc<dyn ItemStore>, client: Client<ItemProcessor>) -> Self {
        Self { store, client }
    }

    /// Create the worker pool for `config` together with a coordinator
    /// submitting to it. Must be called from within a tokio runtime.
    pub fn spawn(
        store: Arc<dyn ItemStore>,
        config: &BatchConfig,
    ) -> (Self, WorkerPool<ItemProcessor>) {
        let processor = ItemProcessor::new(store.clone(), config.process_delay);
        let pool = WorkerPool::new(processor, config.pool_config());
        (Self::new(store, pool.client()), pool)
    }

    /// Start a run and return its handle immediately.
    pub fn start(&self) -> BatchHandle {
        let (handle, resolver) = BatchHandle::pending();
        let this = self.clone();

        tokio::spawn(async move { this.drive(resolver).await });

        handle
    }

    async fn drive(self, resolver: BatchResolver) {
        let run_id = resolver.id();
        let result = self.execute(run_id).await;

        match &result {
            Ok(items) => tracing::info!("Batch {run_id} processed {} item(s)", items.len()),
            Err(e) => tracing::error!("Batch {run_id} failed: {e}"),
        }

        resolver.resolve(result);
    }

    async fn execute(&self, run_id: RunId) -> BatchResult {
        let ids = self.store.list_ids().await.map_err(BatchError::Snapshot)?;
        tracing::info!("Batch {run_id} started for {} item(s)", ids.len());

        let mut pending = FuturesUnordered::new();
        let mut closed = false;

        for id in ids {
            match self.client.send(id).await {
                Ok(rx) => pending.push(async move {
                    // A dropped sender means the job never got to report.
                    rx.await.unwrap_or(ItemOutcome::Failed(ItemFailure {
                        id,
                        cause: FailureCause::Cancelled,
                    }))
                }),
                Err(e) => {
                    tracing::warn!("Batch {run_id} could not queue item {id}: {e}");
                    closed = true;
                    break;
                }
            }
        }

        // Join on everything that was queued, even when queueing stopped early.
        let mut processed: Vec<Item> = Vec::with_capacity(pending.len());
        let mut failures: Vec<ItemFailure> = Vec::new();
        let mut skipped = 0usize;

        while let Some(outcome) = pending.next().await {
            match outcome {
                ItemOutcome::Processed(item) => processed.push(item),
                ItemOutcome::Skipped(_) => skipped += 1,
                ItemOutcome::Failed(failure) => failures.push(failure),
            }
        }

        tracing::debug!(
            "Batch {run_id} joined: {} processed, {} skipped, {} failed",
            processed.len(),
            skipped,
            failures.len()
        );

        if closed {
            return Err(BatchError::PoolClosed);
        }

        if !failures.is_empty() {
            failures.sort_by_key(|failure| failure.id);
            return Err(BatchError::Failed(failures));
        }

        Ok(processed)
    }
}
