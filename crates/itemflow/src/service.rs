use std::sync::Arc;

use crate::model::{Item, ItemId, NewItem, STATUS_NEW};
use crate::store::ItemStore;
use crate::{Error, Result};

/// CRUD operations on top of an [`ItemStore`].
#[derive(Clone)]
pub struct ItemService {
    store: Arc<dyn ItemStore>,
}

impl ItemService {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub async fn find_all(&self) -> Result<Vec<Item>> {
        Ok(self.store.find_all().await?)
    }

    /// Validate and persist a new item. Items without a status start as `NEW`.
    pub async fn create(&self, mut new: NewItem) -> Result<Item> {
        new.validate().map_err(Error::Validation)?;
        if new.status.is_none() {
            new.status = Some(STATUS_NEW.to_string());
        }

        let item = self.store.create(new).await?;
        tracing::debug!("Created item {}", item.id);
        Ok(item)
    }

    pub async fn get(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Replace the fields of an existing item. `None` when `id` is unknown.
    pub async fn update(&self, id: ItemId, update: NewItem) -> Result<Option<Item>> {
        update.validate().map_err(Error::Validation)?;

        let Some(mut item) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };
        item.apply(update);

        let saved = self.store.save(item).await?;
        tracing::debug!("Updated item {}", saved.id);
        Ok(Some(saved))
    }

    pub async fn delete(&self, id: ItemId) -> Result<()> {
        if self.store.delete_by_id(id).await? {
            tracing::debug!("Deleted item {}", id);
            Ok(())
        } else {
            Err(Error::ItemNotFound(id))
        }
    }
}
