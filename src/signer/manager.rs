use alloy_primitives::{Address, Signature, B256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::errors::SignerError;

/// Holds the private keys of accounts whose transactions are signed locally.
///
/// Senders without a key here are assumed to be managed by the node
/// (`eth_sendTransaction`).
#[derive(Debug)]
pub struct SignerManager {
    /// Map of address to signer
    signers: RwLock<HashMap<Address, PrivateKeySigner>>,
}

impl SignerManager {
    /// Create an empty signer manager
    pub fn new() -> Self {
        Self { signers: RwLock::new(HashMap::new()) }
    }

    /// Add a signer from a private key hex string (with or without `0x`)
    pub async fn add_signer_from_hex(&self, private_key_hex: &str) -> Result<Address, SignerError> {
        let signer = private_key_hex
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|_| SignerError::InvalidPrivateKey)?;

        let address = signer.address();
        self.signers.write().await.insert(address, signer);

        Ok(address)
    }

    /// Check if we have a signer for the given address
    pub async fn has_signer(&self, address: &Address) -> bool {
        self.signers.read().await.contains_key(address)
    }

    /// Sign a message hash with the specified signer
    pub async fn sign_hash(&self, address: &Address, hash: B256) -> Result<Signature, SignerError> {
        let signers = self.signers.read().await;
        let signer =
            signers.get(address).ok_or_else(|| SignerError::NoSignerForAddress(*address))?;

        signer
            .sign_hash(&hash)
            .await
            .map_err(|e| SignerError::SigningFailed(e.to_string()))
    }
}

impl Default for SignerManager {
    fn default() -> Self {
        Self::new()
    }
}
