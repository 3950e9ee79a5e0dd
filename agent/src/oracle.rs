//! Strategy oracle interface

use std::sync::Arc;

use async_trait::async_trait;

/// Something that turns a battle prompt into a free-text answer
///
/// Replies are expected to end with a `CHOSEN MOVE:` line; everything
/// before it is treated as rationale.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn decide(&self, prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn decide(&self, prompt: &str) -> anyhow::Result<String> {
        (**self).decide(prompt).await
    }
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Box<T> {
    async fn decide(&self, prompt: &str) -> anyhow::Result<String> {
        (**self).decide(prompt).await
    }
}
