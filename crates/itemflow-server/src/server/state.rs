use std::sync::Arc;
use std::time::Duration;

use itemflow::work::WorkerPool;
use itemflow::{BatchConfig, BatchCoordinator, InMemoryStore, ItemProcessor, ItemService, ItemStore};

use crate::server::runs::BatchRegistry;

/// Represents the state of the server.
pub struct ServerState {
    pub items: ItemService,
    pub coordinator: BatchCoordinator,
    pub runs: BatchRegistry,
    pool: WorkerPool<ItemProcessor>,
}

impl ServerState {
    /// Wire the service and the batch pool to one store. Must be called from
    /// within a tokio runtime.
    pub fn new(store: Arc<dyn ItemStore>, batch_config: &BatchConfig) -> Self {
        let (coordinator, pool) = BatchCoordinator::spawn(store.clone(), batch_config);

        Self {
            items: ItemService::new(store),
            coordinator,
            runs: BatchRegistry::default(),
            pool,
        }
    }

    /// Keep unread results of background runs for `retention` after they finish.
    pub fn with_run_retention(mut self, retention: Duration) -> Self {
        self.runs = BatchRegistry::new(retention);
        self
    }

    pub fn in_memory(store: InMemoryStore, batch_config: &BatchConfig) -> Self {
        Self::new(Arc::new(store), batch_config)
    }

    /// Stop the batch worker pool. Later calls are no-ops.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
