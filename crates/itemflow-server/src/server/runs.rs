use std::collections::HashMap;
use std::time::Duration;

use itemflow::{BatchHandle, BatchResult, RunId};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Current view of a tracked run.
#[derive(Debug)]
pub enum RunPoll {
	Pending,
	Finished(BatchResult),
}

#[derive(Debug)]
struct TrackedRun {
	handle: BatchHandle,
	/// First time a sweep saw the run finished.
	finished_at: Option<Instant>,
}

/// Batch runs started without waiting for them.
///
/// A finished run is forgotten once its result has been read, or once it has
/// sat unread for longer than the retention period.
#[derive(Debug)]
pub struct BatchRegistry {
	runs: RwLock<HashMap<RunId, TrackedRun>>,
	retention: Duration,
}

impl BatchRegistry {
	pub fn new(retention: Duration) -> Self {
		Self {
			runs: RwLock::new(HashMap::new()),
			retention,
		}
	}

	pub async fn track(&self, handle: BatchHandle) -> RunId {
		let run_id = handle.id();
		let mut runs = self.runs.write().await;
		self.sweep(&mut runs);
		runs.insert(
			run_id,
			TrackedRun {
				handle,
				finished_at: None,
			},
		);
		run_id
	}

	/// `None` for unknown, expired or already consumed runs.
	pub async fn poll(&self, run_id: RunId) -> Option<RunPoll> {
		let mut runs = self.runs.write().await;
		self.sweep(&mut runs);

		let result = runs.get(&run_id)?.handle.try_result();
		match result {
			None => Some(RunPoll::Pending),
			Some(result) => {
				runs.remove(&run_id);
				Some(RunPoll::Finished(result))
			}
		}
	}

	/// Drop finished runs that have outlived the retention period.
	pub async fn prune(&self) {
		let mut runs = self.runs.write().await;
		self.sweep(&mut runs);
	}

	fn sweep(&self, runs: &mut HashMap<RunId, TrackedRun>) {
		let now = Instant::now();
		let before = runs.len();

		runs.retain(|_, run| {
			if run.finished_at.is_none() && run.handle.is_finished() {
				run.finished_at = Some(now);
			}
			run.finished_at
				.map_or(true, |finished_at| now.duration_since(finished_at) < self.retention)
		});

		let expired = before - runs.len();
		if expired > 0 {
			tracing::debug!("Expired {expired} unread batch run(s)");
		}
	}

	pub async fn len(&self) -> usize {
		self.runs.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.runs.read().await.is_empty()
	}
}

impl Default for BatchRegistry {
	fn default() -> Self {
		Self::new(Duration::from_secs(300))
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use itemflow::work::WorkerPool;
	use itemflow::{BatchConfig, BatchCoordinator, InMemoryStore, ItemProcessor, NewItem};

	use super::*;

	fn coordinator(delay: Duration) -> (BatchCoordinator, WorkerPool<ItemProcessor>) {
		let store = Arc::new(InMemoryStore::with_items(vec![NewItem {
			name: "Widget".into(),
			email: "widget@example.com".into(),
			..Default::default()
		}]));
		let config = BatchConfig {
			workers: 2,
			process_delay: delay,
		};
		BatchCoordinator::spawn(store, &config)
	}

	#[tokio::test]
	async fn test_finished_run_is_consumed() -> anyhow::Result<()> {
		let (coordinator, pool) = coordinator(Duration::from_millis(50));
		let registry = BatchRegistry::default();

		let handle = coordinator.start();
		let run_id = registry.track(handle.clone()).await;
		assert!(matches!(registry.poll(run_id).await, Some(RunPoll::Pending)));

		handle.wait().await?;
		let Some(RunPoll::Finished(Ok(items))) = registry.poll(run_id).await else {
			panic!("run should be finished");
		};
		assert_eq!(items.len(), 1);

		assert!(registry.poll(run_id).await.is_none());
		assert!(registry.is_empty().await);

		pool.shutdown().await;
		Ok(())
	}

	#[tokio::test]
	async fn test_unknown_run() {
		let registry = BatchRegistry::default();
		assert!(registry.poll(RunId::new_v4()).await.is_none());
		assert_eq!(registry.len().await, 0);
	}

	#[tokio::test]
	async fn test_unread_runs_expire() -> anyhow::Result<()> {
		let (coordinator, pool) = coordinator(Duration::ZERO);
		let registry = BatchRegistry::new(Duration::from_millis(50));

		let mut handles = Vec::new();
		for _ in 0..100 {
			let handle = coordinator.start();
			registry.track(handle.clone()).await;
			handles.push(handle);
		}
		for handle in &handles {
			handle.wait().await?;
		}

		// Still readable right after finishing.
		registry.prune().await;
		assert_eq!(registry.len().await, 100);

		tokio::time::sleep(Duration::from_millis(100)).await;
		registry.prune().await;
		assert!(registry.is_empty().await);
		assert!(registry.poll(handles[0].id()).await.is_none());

		pool.shutdown().await;
		Ok(())
	}

	#[tokio::test]
	async fn test_pending_run_never_expires() -> anyhow::Result<()> {
		let (coordinator, pool) = coordinator(Duration::from_millis(300));
		let registry = BatchRegistry::new(Duration::ZERO);

		let handle = coordinator.start();
		let run_id = registry.track(handle.clone()).await;
		tokio::time::sleep(Duration::from_millis(20)).await;
		registry.prune().await;
		assert!(matches!(registry.poll(run_id).await, Some(RunPoll::Pending)));

		handle.wait().await?;
		pool.shutdown().await;
		Ok(())
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_finished_run_is_read_once_by_concurrent_pollers() -> anyhow::Result<()> {
		let (coordinator, pool) = coordinator(Duration::ZERO);
		let registry = Arc::new(BatchRegistry::default());

		let handle = coordinator.start();
		let run_id = registry.track(handle.clone()).await;
		handle.wait().await?;

		let pollers = (0..8)
			.map(|_| {
				let registry = registry.clone();
				tokio::spawn(async move { registry.poll(run_id).await })
			})
			.collect::<Vec<_>>();

		let mut finished = 0;
		for poller in pollers {
			match poller.await? {
				Some(RunPoll::Finished(_)) => finished += 1,
				Some(RunPoll::Pending) => panic!("run already finished"),
				None => {}
			}
		}
		assert_eq!(finished, 1);

		pool.shutdown().await;
		Ok(())
	}
}
