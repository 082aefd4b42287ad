use std::path::{Path, PathBuf};
use std::sync::Arc;

use swarm_types::Result;

use crate::env_file::EnvFile;
use crate::keypair::Keypair;
use crate::rpc::FundingClient;
use crate::wallet_file::WalletFile;

/// 2 SOL.
pub const AIRDROP_LAMPORTS: u64 = 2_000_000_000;

pub const PUBLIC_KEY_VAR: &str = "WALLET_PUBLIC_KEY";
pub const PRIVATE_KEY_VAR: &str = "WALLET_PRIVATE_KEY";

/// Creates wallets on disk and funds them on devnet.
pub struct WalletManager {
    wallet_dir: PathBuf,
    env_path: PathBuf,
    funding: Arc<dyn FundingClient>,
}

impl WalletManager {
    pub fn new(
        wallet_dir: impl Into<PathBuf>,
        env_path: impl Into<PathBuf>,
        funding: Arc<dyn FundingClient>,
    ) -> Self {
        Self {
            wallet_dir: wallet_dir.into(),
            env_path: env_path.into(),
            funding,
        }
    }

    /// `wallet/` and `.env` in the current directory.
    pub fn with_defaults(funding: Arc<dyn FundingClient>) -> Self {
        Self::new("wallet", ".env", funding)
    }

    pub fn wallet_path(&self) -> PathBuf {
        self.wallet_dir.join("wallet.json")
    }

    pub fn env_path(&self) -> &Path {
        &self.env_path
    }

    /// Generate a keypair, write `wallet.json`, and upsert both keys into `.env`.
    pub async fn generate_wallet(&self) -> Result<WalletFile> {
        let wallet = WalletFile::from_keypair(&Keypair::generate());

        let wallet_path = self.wallet_path();
        wallet.save(&wallet_path).await?;

        let mut env = EnvFile::load(&self.env_path).await?;
        env.set(PUBLIC_KEY_VAR, &wallet.public_key);
        env.set(PRIVATE_KEY_VAR, &wallet.private_key);
        env.save(&self.env_path).await?;

        tracing::info!(
            public_key = %wallet.public_key,
            wallet = %wallet_path.display(),
            env = %self.env_path.display(),
            "Wallet generated"
        );
        Ok(wallet)
    }

    /// Request a 2 SOL airdrop. Failures are logged, not returned.
    pub async fn fund_wallet_devnet(&self, public_key: &str) -> bool {
        match self.funding.request_airdrop(public_key, AIRDROP_LAMPORTS).await {
            Ok(signature) => {
                tracing::info!(public_key, %signature, "Airdrop requested");
                true
            }
            Err(e) => {
                tracing::error!(public_key, error = %e, "Airdrop request failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("wallet_dir", &self.wallet_dir)
            .field("env_path", &self.env_path)
            .finish_non_exhaustive()
    }
}
