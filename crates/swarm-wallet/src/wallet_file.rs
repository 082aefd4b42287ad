use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use swarm_types::{Result, SwarmError};

use crate::keypair::Keypair;

/// Contents of `wallet.json`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletFile {
    pub public_key: String,
    pub private_key: String,
}

impl WalletFile {
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            public_key: keypair.public_key(),
            private_key: keypair.private_key(),
        }
    }

    /// Rebuild the keypair, checking that it matches the stored public key.
    pub fn keypair(&self) -> Result<Keypair> {
        let keypair = Keypair::from_base58_seed(&self.private_key)?;
        if keypair.public_key() != self.public_key {
            return Err(SwarmError::InvalidKey(
                "private key does not match public key".into(),
            ));
        }
        Ok(keypair)
    }

    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| SwarmError::Other(e.to_string()))
    }

    /// Write as pretty JSON, creating the parent directory. On Unix the file
    /// is readable by its owner only.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = self.to_json()?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(path).await?;

        // `mode` only applies on creation; an existing file keeps its bits.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl std::fmt::Debug for WalletFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletFile")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
