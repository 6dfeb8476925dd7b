use itemflow::{BatchError, BatchResult, Item, ItemId, NewItem, RunId};
use serde::{Deserialize, Serialize};

/// Wire representation of an item.
///
/// `id` is ignored on input; the path or the store decides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDto {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email: String,
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        Self {
            id: Some(item.id),
            name: item.name,
            description: item.description,
            status: item.status,
            email: item.email,
        }
    }
}

impl From<ItemDto> for NewItem {
    fn from(dto: ItemDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            status: dto.status,
            email: dto.email,
        }
    }
}

pub fn to_dtos(items: Vec<Item>) -> Vec<ItemDto> {
    items.into_iter().map(ItemDto::from).collect()
}

#[derive(Debug, Serialize)]
pub struct RunAccepted {
    pub run_id: RunId,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunStatus {
    Pending {
        run_id: RunId,
    },
    Succeeded {
        run_id: RunId,
        items: Vec<ItemDto>,
    },
    Failed {
        run_id: RunId,
        error: String,
        failed_ids: Vec<ItemId>,
    },
}

impl RunStatus {
    pub fn finished(run_id: RunId, result: BatchResult) -> Self {
        match result {
            Ok(items) => RunStatus::Succeeded {
                run_id,
                items: to_dtos(items),
            },
            Err(err) => RunStatus::failed(run_id, &err),
        }
    }

    fn failed(run_id: RunId, err: &BatchError) -> Self {
        RunStatus::Failed {
            run_id,
            error: err.to_string(),
            failed_ids: err.failed_ids(),
        }
    }
}
