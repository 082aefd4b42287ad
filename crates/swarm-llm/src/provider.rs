use async_trait::async_trait;

use crate::{Request, Response};

/// A text-completion backend. Implementations perform no retries.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn complete(&self, request: &Request) -> Result<Response, swarm_types::SwarmError>;
    fn name(&self) -> &str;
    fn default_model(&self) -> &str;
}
