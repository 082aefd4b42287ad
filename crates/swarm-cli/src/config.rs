//! Runtime configuration: process environment first, then `.env`.

use std::path::Path;

use swarm_types::{Result, SwarmError};
use swarm_wallet::{validate_url, EnvFile, DEVNET_URL};

const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Settings shared by all subcommands.
///
/// `temperature` and `solana_rpc_url` are kept raw and validated by their
/// accessors, so a bad value only breaks the commands that read it.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub model: String,
    pub temperature: Option<String>,
    pub solana_rpc_url: Option<String>,
    pub anchor_bin: String,
}

impl SwarmConfig {
    /// Read the process environment, falling back to `env_path` for keys it
    /// does not set.
    pub async fn load(env_path: &Path) -> Result<Self> {
        let dotenv = EnvFile::load(env_path).await?;
        Ok(Self::from_lookup(layered(
            |key: &str| std::env::var(key).ok(),
            &dotenv,
        )))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("SWARM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: get("SWARM_TEMPERATURE"),
            solana_rpc_url: get("SOLANA_RPC_URL"),
            anchor_bin: get("ANCHOR_BIN").unwrap_or_else(|| "anchor".to_string()),
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| SwarmError::Config("OPENAI_API_KEY is not set".into()))
    }

    /// `SWARM_TEMPERATURE`, or 0.7 when unset.
    pub fn temperature(&self) -> Result<f32> {
        match &self.temperature {
            Some(raw) => parse_temperature(raw),
            None => Ok(DEFAULT_TEMPERATURE),
        }
    }

    /// `SOLANA_RPC_URL`, or devnet when unset.
    pub fn solana_rpc_url(&self) -> Result<&str> {
        let url = self.solana_rpc_url.as_deref().unwrap_or(DEVNET_URL);
        check_rpc_url(url)?;
        Ok(url)
    }
}

/// Look a key up in `primary`, then in `dotenv`. An empty primary value
/// falls through.
fn layered<'a>(
    primary: impl Fn(&str) -> Option<String> + 'a,
    dotenv: &'a EnvFile,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key: &str| {
        primary(key)
            .filter(|v| !v.is_empty())
            .or_else(|| dotenv.get(key).map(String::from))
    }
}

/// Must be a number in `[0, 2]`.
pub fn parse_temperature(raw: &str) -> Result<f32> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| SwarmError::Config(format!("temperature '{raw}' is not a number")))?;
    if !(0.0..=2.0).contains(&value) {
        return Err(SwarmError::Config(format!(
            "temperature {value} is outside [0, 2]"
        )));
    }
    Ok(value)
}

fn check_rpc_url(url: &str) -> Result<()> {
    if validate_url(url) {
        Ok(())
    } else {
        Err(SwarmError::Config(format!(
            "SOLANA_RPC_URL '{url}' is not an http(s) URL"
        )))
    }
}
