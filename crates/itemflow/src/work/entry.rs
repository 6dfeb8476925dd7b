use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::work::handler::JobHandler;

pub type JobId = Uuid;

/// Queue entry
#[derive(Debug)]
pub struct QueueEntry<THandler>
where
    THandler: JobHandler,
{
    /// Identifier
    pub id: JobId,

    /// Input handed to the handler
    pub request: THandler::Input,

    /// Response sender
    pub response_tx: oneshot::Sender<THandler::Output>,

    /// Instant when this entry was queued
    pub queue_time: Instant,
}

impl<THandler> QueueEntry<THandler>
where
    THandler: JobHandler,
{
    pub fn new(request: THandler::Input, response_tx: oneshot::Sender<THandler::Output>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            response_tx,
            queue_time: Instant::now(),
        }
    }
}
