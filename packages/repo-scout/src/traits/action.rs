//! Capability trait for actions the orchestration loop may invoke.

use async_trait::async_trait;

/// A single-method capability: text in, text out.
///
/// Implementations never fail for ordinary problems. Not-found conditions,
/// network errors and HTTP failures are encoded as explanatory text in the
/// result so the reasoning engine can react to them on its next step.
#[async_trait]
pub trait Capability: Send + Sync {
    async fn invoke(&self, argument: &str) -> String;
}

#[async_trait]
impl<T: Capability + ?Sized> Capability for Box<T> {
    async fn invoke(&self, argument: &str) -> String {
        (**self).invoke(argument).await
    }
}

#[async_trait]
impl<T: Capability + ?Sized> Capability for std::sync::Arc<T> {
    async fn invoke(&self, argument: &str) -> String {
        (**self).invoke(argument).await
    }
}
