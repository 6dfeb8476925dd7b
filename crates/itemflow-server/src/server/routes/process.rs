use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use itemflow::RunId;
use tokio::time::Instant;

use crate::server::data_models::{to_dtos, ItemDto, RunAccepted, RunStatus};
use crate::server::runs::RunPoll;
use crate::server::state::ServerState;
use crate::server::ServerError;

/// Run a batch over every item and answer once it is done.
pub async fn process_items(
    State(server_state): State<Arc<ServerState>>,
) -> Result<Json<Vec<ItemDto>>, ServerError> {
    let start = Instant::now();
    let handle = server_state.coordinator.start();
    tracing::debug!("Started batch {} and waiting for it", handle.id());

    let items = handle.wait().await?;

    tracing::trace!("Batch {} took {} ms", handle.id(), start.elapsed().as_millis());
    Ok(Json(to_dtos(items)))
}

/// Start a batch in the background and return its id.
pub async fn start_processing(
    State(server_state): State<Arc<ServerState>>,
) -> (StatusCode, Json<RunAccepted>) {
    let handle = server_state.coordinator.start();
    let run_id = server_state.runs.track(handle).await;
    tracing::debug!("Accepted batch {run_id}");

    (StatusCode::ACCEPTED, Json(RunAccepted { run_id }))
}

/// Report on a background batch. A finished run can be read once.
pub async fn processing_status(
    State(server_state): State<Arc<ServerState>>,
    Path(run_id): Path<RunId>,
) -> Result<Json<RunStatus>, ServerError> {
    let status = match server_state.runs.poll(run_id).await {
        None => return Err(ServerError::RunNotFound),
        Some(RunPoll::Pending) => RunStatus::Pending { run_id },
        Some(RunPoll::Finished(result)) => RunStatus::finished(run_id, result),
    };

    Ok(Json(status))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use itemflow::{BatchConfig, InMemoryStore, NewItem, STATUS_PROCESSED};

    fn test_state(delay: Duration) -> Arc<ServerState> {
        let items = (1..=2)
            .map(|n| NewItem {
                name: format!("Item {n}"),
                status: Some("NEW".into()),
                email: format!("item{n}@example.com"),
                ..Default::default()
            })
            .collect();
        let config = BatchConfig {
            workers: 10,
            process_delay: delay,
        };
        Arc::new(ServerState::in_memory(InMemoryStore::with_items(items), &config))
    }

    #[tokio::test]
    async fn test_process_items() -> anyhow::Result<()> {
        let state = test_state(Duration::from_millis(5));

        let Json(items) = process_items(State(state.clone())).await?;

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item.status.as_deref() == Some(STATUS_PROCESSED)));
        state.shutdown().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_process_items_after_shutdown() {
        let state = test_state(Duration::from_millis(5));
        state.shutdown().await;

        let result = process_items(State(state.clone())).await;
        assert!(matches!(result, Err(ServerError::BatchFailed(_))));
    }

    #[tokio::test]
    async fn test_background_run_can_be_polled() -> anyhow::Result<()> {
        let state = test_state(Duration::from_millis(50));

        let (status, Json(accepted)) = start_processing(State(state.clone())).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let Json(first) = processing_status(State(state.clone()), Path(accepted.run_id)).await?;
        assert!(matches!(first, RunStatus::Pending { .. }));

        let finished = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let Json(status) = processing_status(State(state.clone()), Path(accepted.run_id))
                    .await
                    .expect("run is tracked until it finishes");
                if !matches!(status, RunStatus::Pending { .. }) {
                    break status;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await?;

        let RunStatus::Succeeded { items, .. } = &finished else {
            panic!("expected a successful run, got {finished:?}");
        };
        assert_eq!(items.len(), 2);

        let consumed = processing_status(State(state.clone()), Path(accepted.run_id)).await;
        assert!(matches!(consumed, Err(ServerError::RunNotFound)));

        state.shutdown().await;
        Ok(())
    }
}
