use async_trait::async_trait;
use serde_json::json;
use swarm_types::{Result, SwarmError};

pub const DEVNET_URL: &str = "https://api.devnet.solana.com";

/// Anything that can credit an account with lamports.
#[async_trait]
pub trait FundingClient: Send + Sync {
    /// Returns the transaction signature.
    async fn request_airdrop(&self, public_key: &str, lamports: u64) -> Result<String>;
}

/// `true` for http(s) URLs with a host.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// SolanaRpcClient
// ---------------------------------------------------------------------------

/// Minimal Solana JSON-RPC client: only `requestAirdrop`.
#[derive(Debug, Clone)]
pub struct SolanaRpcClient {
    client: reqwest::Client,
    url: String,
}

impl SolanaRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if !validate_url(&url) {
            return Err(SwarmError::Config(format!("invalid RPC URL: {url}")));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }

    pub fn devnet() -> Self {
        Self {
            client: reqwest::Client::new(),
            url: DEVNET_URL.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn airdrop_body(public_key: &str, lamports: u64) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "requestAirdrop",
        "params": [public_key, lamports],
    })
}

fn parse_rpc_response(body: &serde_json::Value) -> Result<String> {
    if let Some(error) = body.get("error") {
        return Err(SwarmError::Rpc {
            code: error["code"].as_i64().unwrap_or(0),
            message: error["message"]
                .as_str()
                .unwrap_or("unknown RPC error")
                .to_string(),
        });
    }
    body["result"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| SwarmError::Other("RPC response has no result".into()))
}

#[async_trait]
impl FundingClient for SolanaRpcClient {
    async fn request_airdrop(&self, public_key: &str, lamports: u64) -> Result<String> {
        tracing::debug!(url = %self.url, public_key, lamports, "requestAirdrop");

        let resp = self
            .client
            .post(&self.url)
            .json(&airdrop_body(public_key, lamports))
            .send()
            .await
            .map_err(|e| SwarmError::Other(format!("RPC request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| SwarmError::Other(format!("RPC response unreadable: {e}")))?;

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(body) => parse_rpc_response(&body),
            Err(_) if !status.is_success() => Err(SwarmError::Rpc {
                code: i64::from(status.as_u16()),
                message: text,
            }),
            Err(e) => Err(e.into()),
        }
    }
}
