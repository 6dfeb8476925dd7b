use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use itemflow::ItemId;

use crate::server::data_models::{to_dtos, ItemDto};
use crate::server::state::ServerState;
use crate::server::ServerError;

pub async fn list_items(
    State(server_state): State<Arc<ServerState>>,
) -> Result<Json<Vec<ItemDto>>, ServerError> {
    let items = server_state.items.find_all().await?;
    Ok(Json(to_dtos(items)))
}

pub async fn create_item(
    State(server_state): State<Arc<ServerState>>,
    Json(dto): Json<ItemDto>,
) -> Result<(StatusCode, Json<ItemDto>), ServerError> {
    let created = server_state.items.create(dto.into()).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn get_item(
    State(server_state): State<Arc<ServerState>>,
    Path(id): Path<ItemId>,
) -> Result<Json<ItemDto>, ServerError> {
    let item = server_state
        .items
        .get(id)
        .await?
        .ok_or(ServerError::ItemNotFound)?;
    Ok(Json(item.into()))
}

pub async fn update_item(
    State(server_state): State<Arc<ServerState>>,
    Path(id): Path<ItemId>,
    Json(dto): Json<ItemDto>,
) -> Result<Json<ItemDto>, ServerError> {
    let updated = server_state
        .items
        .update(id, dto.into())
        .await?
        .ok_or(ServerError::ItemNotFound)?;
    Ok(Json(updated.into()))
}

pub async fn delete_item(
    State(server_state): State<Arc<ServerState>>,
    Path(id): Path<ItemId>,
) -> Result<StatusCode, ServerError> {
    server_state.items.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemflow::{BatchConfig, InMemoryStore, NewItem};

    fn test_state() -> Arc<ServerState> {
        let store = InMemoryStore::with_items(vec![NewItem {
            name: "Test Item".into(),
            description: Some("A test item".into()),
            status: Some("AVAILABLE".into()),
            email: "test@example.com".into(),
        }]);
        Arc::new(ServerState::in_memory(store, &BatchConfig::default()))
    }

    fn dto(name: &str, email: &str) -> ItemDto {
        ItemDto {
            id: None,
            name: name.into(),
            description: None,
            status: None,
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn test_list_items() -> anyhow::Result<()> {
        let state = test_state();
        let Json(items) = list_items(State(state.clone())).await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Test Item");
        state.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_item() -> anyhow::Result<()> {
        let state = test_state();
        let (status, Json(created)) =
            create_item(State(state.clone()), Json(dto("New", "new@example.com"))).await?;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.id, Some(2));
        assert_eq!(created.status.as_deref(), Some("NEW"));
        state.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_invalid_item() {
        let state = test_state();
        let result = create_item(State(state.clone()), Json(dto("", "bad"))).await;

        let Err(ServerError::Validation(errors)) = result else {
            panic!("expected a validation error");
        };
        let messages = errors.iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(messages, vec!["name: Name is required", "email: Invalid email format"]);
        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_item() -> anyhow::Result<()> {
        let state = test_state();
        let Json(item) = get_item(State(state.clone()), Path(1)).await?;
        assert_eq!(item.email, "test@example.com");

        let missing = get_item(State(state.clone()), Path(42)).await;
        assert!(matches!(missing, Err(ServerError::ItemNotFound)));
        state.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_update_item() -> anyhow::Result<()> {
        let state = test_state();
        let update = ItemDto {
            status: Some("SOLD".into()),
            description: Some("Updated Description".into()),
            ..dto("Updated Item", "updated@example.com")
        };

        let Json(updated) = update_item(State(state.clone()), Path(1), Json(update.clone())).await?;
        assert_eq!(updated.id, Some(1));
        assert_eq!(updated.name, "Updated Item");
        assert_eq!(updated.email, "updated@example.com");

        let missing = update_item(State(state.clone()), Path(42), Json(update)).await;
        assert!(matches!(missing, Err(ServerError::ItemNotFound)));
        state.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item() -> anyhow::Result<()> {
        let state = test_state();
        let status = delete_item(State(state.clone()), Path(1)).await?;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let missing = delete_item(State(state.clone()), Path(1)).await;
        assert!(matches!(missing, Err(ServerError::ItemNotFound)));
        state.shutdown().await;
        Ok(())
    }
}
