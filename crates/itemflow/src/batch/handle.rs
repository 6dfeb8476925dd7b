use tokio::sync::watch;
use uuid::Uuid;

use crate::batch::BatchError;
use crate::model::Item;

pub type RunId = Uuid;

pub type BatchResult = Result<Vec<Item>, BatchError>;

#[derive(Debug, Clone)]
enum RunState {
    Pending,
    Finished(BatchResult),
}

impl RunState {
    fn result(&self) -> Option<&BatchResult> {
        match self {
            RunState::Pending => None,
            RunState::Finished(result) => Some(result),
        }
    }
}

/// Observer side of one batch run.
///
/// Clones observe the same run. The run resolves exactly once and every
/// observer sees the same terminal result. Dropping all handles does not stop
/// the run.
#[derive(Debug, Clone)]
pub struct BatchHandle {
    id: RunId,
    rx: watch::Receiver<RunState>,
}

/// Completion side of one batch run, consumed by [`BatchResolver::resolve`].
///
/// Dropping it unresolved, e.g. when the aggregation task panics, finishes the
/// run with [`BatchError::Aborted`].
#[derive(Debug)]
pub(crate) struct BatchResolver {
    id: RunId,
    tx: Option<watch::Sender<RunState>>,
}

impl BatchHandle {
    pub(crate) fn pending() -> (Self, BatchResolver) {
        let id = Uuid::new_v4();
        let (tx, rx) = watch::channel(RunState::Pending);
        (Self { id, rx }, BatchResolver { id, tx: Some(tx) })
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.rx.borrow().result().is_some()
    }

    /// The terminal result if the run is done, without waiting.
    pub fn try_result(&self) -> Option<BatchResult> {
        self.rx.borrow().result().cloned()
    }

    /// Wait until every item of the run is terminal.
    pub async fn wait(&self) -> BatchResult {
        let mut rx = self.rx.clone();
        let state = rx.wait_for(|state| state.result().is_some()).await;

        match state {
            Ok(state) => state.result().cloned().unwrap_or(Err(BatchError::Aborted)),
            Err(_) => Err(BatchError::Aborted),
        }
    }
}

impl BatchResolver {
    pub(crate) fn id(&self) -> RunId {
        self.id
    }

    pub(crate) fn resolve(mut self, result: BatchResult) {
        if let Some(tx) = self.tx.take() {
            // `send_replace` succeeds even when nobody holds a handle anymore.
            tx.send_replace(RunState::Finished(result));
        }
    }
}

impl Drop for BatchResolver {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            tracing::error!("Batch run {} dropped without a result", self.id);
            tx.send_replace(RunState::Finished(Err(BatchError::Aborted)));
        }
    }
}
