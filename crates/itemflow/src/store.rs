//! Persistence gateway.
//!
//! The rest of the crate only talks to storage through [`ItemStore`]. The
//! bundled [`InMemoryStore`] backs the server and the tests; any other backend
//! has to provide the same CRUD semantics and its own consistency guarantees.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::model::{Item, ItemId, NewItem};

/// Failure reported by a store backend.
///
/// Cloneable so one failure can be handed to every observer of a batch run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write rejected for item {id}: {reason}")]
    WriteRejected { id: ItemId, reason: String },
}

#[async_trait]
pub trait ItemStore: Send + Sync + 'static {
    /// Snapshot of every known id, ascending.
    async fn list_ids(&self) -> Result<Vec<ItemId>, StoreError>;

    async fn find_all(&self) -> Result<Vec<Item>, StoreError>;

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Persist a new item under a freshly generated id.
    async fn create(&self, new: NewItem) -> Result<Item, StoreError>;

    /// Insert or replace `item` by id and return what was stored.
    async fn save(&self, item: Item) -> Result<Item, StoreError>;

    /// Returns `true` when an item was removed.
    async fn delete_by_id(&self, id: ItemId) -> Result<bool, StoreError>;
}

#[derive(Debug)]
pub struct InMemoryStore {
    items: RwLock<BTreeMap<ItemId, Item>>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Build a store holding `items`, numbered from 1 in order.
    pub fn with_items(items: Vec<NewItem>) -> Self {
        let items = items
            .into_iter()
            .zip(1..)
            .map(|(new, id)| (id, Item::from_new(id, new)))
            .collect::<BTreeMap<_, _>>();
        let next_id = items.keys().next_back().map_or(1, |id| id + 1);

        Self {
            items: RwLock::new(items),
            next_id: AtomicI64::new(next_id),
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn list_ids(&self) -> Result<Vec<ItemId>, StoreError> {
        Ok(self.items.read().await.keys().copied().collect())
    }

    async fn find_all(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn create(&self, new: NewItem) -> Result<Item, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let item = Item::from_new(id, new);
        self.items.write().await.insert(id, item.clone());
        tracing::trace!("Created item {}", id);
        Ok(item)
    }

    async fn save(&self, item: Item) -> Result<Item, StoreError> {
        // Keep the sequence ahead of ids that were saved explicitly.
        self.next_id.fetch_max(item.id + 1, Ordering::Relaxed);
        self.items.write().await.insert(item.id, item.clone());
        tracing::trace!("Saved item {}", item.id);
        Ok(item)
    }

    async fn delete_by_id(&self, id: ItemId) -> Result<bool, StoreError> {
        let removed = self.items.write().await.remove(&id).is_some();
        tracing::trace!("Deleted item {}: {}", id, removed);
        Ok(removed)
    }
}
