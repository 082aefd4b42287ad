use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use swarm_types::SwarmError;

use crate::{ProviderAdapter, Request, Response};

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

pub trait Middleware: Send + Sync {
    fn before(&self, _request: &mut Request) {}
    fn after(&self, _request: &Request, _response: &mut Response) {}
}

// ---------------------------------------------------------------------------
// Built-in middleware: LoggingMiddleware
// ---------------------------------------------------------------------------

pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before(&self, request: &mut Request) {
        tracing::info!(
            model = %request.model,
            messages = request.messages.len(),
            "LLM request"
        );
    }

    fn after(&self, _request: &Request, response: &mut Response) {
        tracing::info!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            finish = ?response.finish_reason,
            "LLM response"
        );
    }
}

// ---------------------------------------------------------------------------
// Built-in middleware: CostTrackingMiddleware
// ---------------------------------------------------------------------------

/// Accumulates token usage. Clones share the same counters, so a caller can
/// keep one handle and give the other to the client.
#[derive(Clone)]
pub struct CostTrackingMiddleware {
    total_input: Arc<AtomicU64>,
    total_output: Arc<AtomicU64>,
    requests: Arc<AtomicU64>,
}

impl CostTrackingMiddleware {
    pub fn new() -> Self {
        Self {
            total_input: Arc::new(AtomicU64::new(0)),
            total_output: Arc::new(AtomicU64::new(0)),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn total_input_tokens(&self) -> u64 {
        self.total_input.load(Ordering::Relaxed)
    }

    pub fn total_output_tokens(&self) -> u64 {
        self.total_output.load(Ordering::Relaxed)
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl Default for CostTrackingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for CostTrackingMiddleware {
    fn after(&self, _request: &Request, response: &mut Response) {
        self.total_input
            .fetch_add(response.usage.input_tokens, Ordering::Relaxed);
        self.total_output
            .fetch_add(response.usage.output_tokens, Ordering::Relaxed);
        self.requests.fetch_add(1, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// LlmClient
// ---------------------------------------------------------------------------

pub struct LlmClient {
    providers: HashMap<String, Box<dyn ProviderAdapter>>,
    /// Name of the first registered provider; used when a request names none.
    default_provider: Option<String>,
    middleware: Vec<Box<dyn Middleware>>,
}

impl LlmClient {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: None,
            middleware: Vec::new(),
        }
    }

    pub fn register_provider(&mut self, provider: impl ProviderAdapter + 'static) {
        let name = provider.name().to_string();
        if self.default_provider.is_none() {
            self.default_provider = Some(name.clone());
        }
        self.providers.insert(name, Box::new(provider));
    }

    pub fn with_provider(mut self, provider: impl ProviderAdapter + 'static) -> Self {
        self.register_provider(provider);
        self
    }

    pub fn with_middleware(mut self, m: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(m));
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn complete(&self, request: &Request) -> Result<Response, SwarmError> {
        let provider = self.resolve_provider(request)?;
        let mut req = request.clone();

        for m in &self.middleware {
            m.before(&mut req);
        }

        let mut resp = provider.complete(&req).await?;

        for m in &self.middleware {
            m.after(&req, &mut resp);
        }

        Ok(resp)
    }

    fn resolve_provider(&self, request: &Request) -> Result<&dyn ProviderAdapter, SwarmError> {
        // 1. Explicit provider field
        if let Some(ref provider_name) = request.provider {
            return self
                .providers
                .get(provider_name)
                .map(|p| p.as_ref())
                .ok_or_else(|| {
                    SwarmError::Other(format!("Provider '{}' not registered", provider_name))
                });
        }

        // 2. First registered provider
        self.default_provider
            .as_ref()
            .and_then(|name| self.providers.get(name))
            .map(|p| p.as_ref())
            .ok_or_else(|| SwarmError::Other("No providers registered".to_string()))
    }
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
