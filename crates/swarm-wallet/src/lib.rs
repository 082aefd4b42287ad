//! Wallet utility for the contract swarm.
//!
//! Generates an ed25519 keypair, stores it in `wallet/wallet.json` and
//! `.env`, and asks a Solana RPC node for a devnet airdrop.

pub mod env_file;
pub mod keypair;
pub mod manager;
pub mod rpc;
pub mod wallet_file;

pub use env_file::EnvFile;
pub use keypair::Keypair;
pub use manager::{WalletManager, AIRDROP_LAMPORTS};
pub use rpc::{validate_url, FundingClient, SolanaRpcClient, DEVNET_URL};
pub use wallet_file::WalletFile;
