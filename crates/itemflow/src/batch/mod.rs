//! Concurrent batch processing of every stored item.
//!
//! A run snapshots the ids in the store, queues one [`ItemProcessor`] job per
//! id on the shared worker pool and hands back a [`BatchHandle`] straight
//! away. A single aggregation task owns the results: workers only report
//! through their job's oneshot channel, so no collection is ever written from
//! two places.

mod coordinator;
mod handle;
mod processor;

use std::time::Duration;

use thiserror::Error;

pub use coordinator::BatchCoordinator;
pub use handle::{BatchHandle, BatchResult, RunId};
pub use processor::ItemProcessor;

use crate::model::{Item, ItemId};
use crate::store::StoreError;
use crate::work::PoolConfig;

/// Settings shared by every batch run of one coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Items processed at the same time.
    pub workers: usize,
    /// Simulated latency before each item is read.
    pub process_delay: Duration,
}

impl BatchConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::with_workers(self.workers)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            process_delay: Duration::from_millis(100),
        }
    }
}

/// Terminal state of one item within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Processed(Item),
    /// The id no longer resolves to an item.
    Skipped(ItemId),
    Failed(ItemFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: ItemId,
    pub cause: FailureCause,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("task cancelled before completion")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("{} item(s) failed: {}", .0.len(), describe_failures(.0))]
    Failed(Vec<ItemFailure>),

    #[error("could not snapshot item ids: {0}")]
    Snapshot(StoreError),

    #[error("worker pool closed before every item was queued")]
    PoolClosed,

    #[error("batch run ended without a result")]
    Aborted,
}

impl BatchError {
    /// Ids of the items that failed, ascending. Empty for run-level errors.
    pub fn failed_ids(&self) -> Vec<ItemId> {
        match self {
            BatchError::Failed(failures) => failures.iter().map(|f| f.id).collect(),
            _ => Vec::new(),
        }
    }
}

fn describe_failures(failures: &[ItemFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("item {} ({})", f.id, f.cause))
        .collect::<Vec<_>>()
        .join(", ")
}
