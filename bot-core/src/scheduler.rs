//! Delays for background actions. The id names the delay so tests can resolve it on demand.

use async_trait::async_trait;
use std::time::Duration;

/// Source of identifiable delays. Cancellation is layered on top by the engine's context.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Resolves once `duration` has elapsed (or whenever the implementation decides for `id`).
    async fn delay(&self, id: &str, duration: Duration);
}

/// Real-time scheduler backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn delay(&self, id: &str, duration: Duration) {
        tracing::trace!(delay_id = %id, duration_ms = duration.as_millis() as u64, "Delay started");
        tokio::time::sleep(duration).await;
    }
}
