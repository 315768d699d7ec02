use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{QueryOutcome, Request};

/// Something that can carry a [`Request`] to the data service.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue exactly one request and hand back what the service said.
    async fn execute(&self, request: Request) -> QueryOutcome<Value>;

    /// Whether the service is reachable. Polled during client
    /// initialization.
    async fn ready(&self) -> bool {
        true
    }
}

/// Shared handle used by every operation.
pub type Handle = Arc<dyn Backend>;
