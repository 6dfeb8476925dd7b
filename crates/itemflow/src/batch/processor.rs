use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::batch::{FailureCause, ItemFailure, ItemOutcome};
use crate::model::{Item, ItemId, STATUS_PROCESSED};
use crate::store::ItemStore;
use crate::work::JobHandler;

/// Marks a single item as processed.
///
/// Holds no per-run state, so one instance serves every worker of the pool.
pub struct ItemProcessor {
    store: Arc<dyn ItemStore>,
    delay: Duration,
}

impl ItemProcessor {
    pub fn new(store: Arc<dyn ItemStore>, delay: Duration) -> Self {
        Self { store, delay }
    }

    async fn process(
        &self,
        id: ItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<Item>, FailureCause> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FailureCause::Cancelled),
            _ = tokio::time::sleep(self.delay) => {}
        }

        let Some(mut item) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };

        // Not conditioned on the previous status, re-running is harmless.
        item.status = Some(STATUS_PROCESSED.to_string());
        let saved = self.store.save(item).await?;

        Ok(Some(saved))
    }
}

#[async_trait]
impl JobHandler for ItemProcessor {
    type Input = ItemId;
    type Output = ItemOutcome;

    async fn handle(&self, id: ItemId, cancel: &CancellationToken) -> ItemOutcome {
        match self.process(id, cancel).await {
            Ok(Some(item)) => {
                tracing::trace!("Processed item {}", id);
                ItemOutcome::Processed(item)
            }
            Ok(None) => {
                tracing::debug!("Skipping item {}: not found", id);
                ItemOutcome::Skipped(id)
            }
            Err(cause) => {
                tracing::warn!("Processing item {} failed: {}", id, cause);
                ItemOutcome::Failed(ItemFailure { id, cause })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewItem;
    use crate::store::InMemoryStore;

    fn store_with_one_item() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::with_items(vec![NewItem {
            name: "Item 1".into(),
            status: Some("NEW".into()),
            email: "item1@example.com".into(),
            ..Default::default()
        }]))
    }

    #[tokio::test]
    async fn test_marks_existing_item_processed() -> anyhow::Result<()> {
        let store = store_with_one_item();
        let processor = ItemProcessor::new(store.clone(), Duration::ZERO);

        let outcome = processor.handle(1, &CancellationToken::new()).await;

        let ItemOutcome::Processed(item) = &outcome else {
            panic!("expected a processed item, got {outcome:?}");
        };
        assert!(item.is_processed());
        assert_eq!(store.find_by_id(1).await?.as_ref(), Some(item));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_item_is_skipped() {
        let processor = ItemProcessor::new(store_with_one_item(), Duration::ZERO);
        let outcome = processor.handle(99, &CancellationToken::new()).await;
        assert_eq!(outcome, ItemOutcome::Skipped(99));
    }

    #[tokio::test]
    async fn test_cancelled_before_write() -> anyhow::Result<()> {
        let store = store_with_one_item();
        let processor = ItemProcessor::new(store.clone(), Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = processor.handle(1, &cancel).await;

        assert_eq!(
            outcome,
            ItemOutcome::Failed(ItemFailure {
                id: 1,
                cause: FailureCause::Cancelled
            })
        );
        // Nothing was written.
        assert_eq!(store.find_by_id(1).await?.and_then(|i| i.status), Some("NEW".into()));
        Ok(())
    }
}
