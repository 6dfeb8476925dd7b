use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait representing a stateless job processor shared by every worker of a
/// pool.
///
/// `cancel` is the pool's shutdown token. Implementations should race their
/// suspension points against it and return their own cancelled output rather
/// than keep working.
#[async_trait]
pub trait JobHandler
where
    Self: Send + Sync + 'static,
{
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn handle(&self, input: Self::Input, cancel: &CancellationToken) -> Self::Output;
}
