//! Pacing between search iterations.
//!
//! Discovery awaits the pacer before every provider call. Keeping this behind
//! a trait lets tests swap in [`NoPacer`](crate::pacing::NoPacer) or drive
//! [`FixedDelayPacer`](crate::pacing::FixedDelayPacer) with tokio's paused
//! clock instead of sleeping for real.

use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next external call may be issued.
    async fn pause(&self);
}

#[async_trait]
impl<P: Pacer + ?Sized> Pacer for std::sync::Arc<P> {
    async fn pause(&self) {
        (**self).pause().await
    }
}
