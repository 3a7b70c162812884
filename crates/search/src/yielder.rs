use async_trait::async_trait;

/// Suspension point handed to the index build loop.
///
/// A cold build walks the whole spine on the caller's task; yielding every
/// few chapters keeps other work on a single-threaded runtime responsive.
#[async_trait]
pub trait Yielder: Send + Sync {
    async fn yield_now(&self);
}

/// Yields back to the tokio scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioYielder;

#[async_trait]
impl Yielder for TokioYielder {
    async fn yield_now(&self) {
        tokio::task::yield_now().await;
    }
}
