use std::sync::Arc;

use tokio::sync::{oneshot, RwLock};

use crate::work::entry::QueueEntry;
use crate::work::handler::JobHandler;
use crate::{Error, Result};

pub(crate) type SharedSender<THandler> = Arc<RwLock<Option<flume::Sender<QueueEntry<THandler>>>>>;

/// Submission side of a [`WorkerPool`](crate::work::WorkerPool).
pub struct Client<THandler>
where
    THandler: JobHandler,
{
    tx: SharedSender<THandler>,
}

impl<THandler> Client<THandler>
where
    THandler: JobHandler,
{
    pub(crate) fn new(tx: SharedSender<THandler>) -> Self {
        Self { tx }
    }

    /// Queue one job and return the receiver its output will arrive on.
    ///
    /// Waits for queue capacity when every worker is busy. If the receiver
    /// resolves to an error, the job was dropped before it could report.
    pub async fn send(&self, value: THandler::Input) -> Result<oneshot::Receiver<THandler::Output>> {
        let (tx, rx) = oneshot::channel();
        let entry = QueueEntry::new(value, tx);

        // The read guard is held across the send so shutdown cannot close the
        // channel underneath an in-flight submission.
        let guard = self.tx.read().await;
        let sender = guard.as_ref().ok_or(Error::PoolClosed)?;
        tracing::trace!("Queueing job {}", entry.id);
        sender
            .send_async(entry)
            .await
            .map_err(|_| Error::PoolClosed)?;

        Ok(rx)
    }

    pub async fn is_closed(&self) -> bool {
        self.tx.read().await.is_none()
    }
}

impl<THandler> Clone for Client<THandler>
where
    THandler: JobHandler,
{
    fn clone(&self) -> Self {
        Client {
            tx: self.tx.clone(),
        }
    }
}
