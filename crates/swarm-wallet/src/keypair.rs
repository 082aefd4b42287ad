use ed25519_dalek::SigningKey;
use swarm_types::{Result, SwarmError};

/// An ed25519 keypair in the form Solana tools expect.
///
/// The public key is the base58 address; the private key is the base58
/// encoding of the 32-byte secret seed.
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        let seed: [u8; 32] = rand::random();
        Self::from_seed(&seed)
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// Decode a base58 secret seed as written by [`Keypair::private_key`].
    pub fn from_base58_seed(encoded: &str) -> Result<Self> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| SwarmError::InvalidKey(format!("not base58: {e}")))?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SwarmError::InvalidKey(format!("expected 32 seed bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> String {
        bs58::encode(self.signing.verifying_key().to_bytes()).into_string()
    }

    pub fn private_key(&self) -> String {
        bs58::encode(self.signing.to_bytes()).into_string()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}
