//! Ledger collaborators
//!
//! Everything the exploit needs from the outside world, behind one trait:
//!
//!   deploy             → create a contract, return its address
//!   read_slot          → raw storage read, ignores declared visibility
//!   submit_call        → state-changing call from a chosen sender
//!   read_public_field  → the contract's own getter, public fields only
//!
//! `read_slot` and `read_public_field` are deliberately separate capabilities.
//! A getter is only generated for `public` variables, but the raw slot read
//! works on every slot of every contract: declaring a variable `private` hides
//! nothing. Confidential state has to be encrypted before it is stored.
//!
//! Implementations:
//!   InMemoryLedger: deterministic in-process ledger with simulated contracts
//!   RpcLedger:      JSON-RPC client for a dev node (anvil, hardhat, ganache)

pub mod errors;
pub mod helpers;
pub mod memory;
pub mod readers;
pub mod rpc;
pub mod selectors;
pub mod slots;
pub mod types;

pub use errors::TransportError;
pub use helpers::{
    decode_address, decode_bool, decode_u64, encode_address, encode_bytes16, encode_call,
    encode_constructor,
};
pub use memory::{InMemoryLedger, LedgerStats};
pub use readers::{read_all_fields, read_flag, StoredValue};
pub use rpc::{RpcConfig, RpcLedger};
pub use selectors::function_selector;
pub use slots::privacy_slots;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{CONSTRUCTOR_ARG_COUNT, WORD_BYTES};
use crate::word::Word;

/// Name of the target contract artifact
pub const PRIVACY_CONTRACT: &str = "Privacy";
/// Name of the attacker proxy contract artifact
pub const HACKER_CONTRACT: &str = "Hacker";

/// Outcome of a mined state-changing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    /// Whether the call executed without reverting
    pub success: bool,
    /// Transaction hash (zero when the node refused the call before mining)
    pub tx_hash: B256,
}

/// A compiled contract: a name plus creation bytecode.
///
/// Deserializes from truffle and hardhat build artifacts (`contractName`,
/// `bytecode`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    #[serde(rename = "contractName")]
    pub name: String,
    #[serde(default)]
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn new(name: impl Into<String>, bytecode: Bytes) -> Self {
        Self { name: name.into(), bytecode }
    }

    /// An artifact with no bytecode, identified by name only. Enough for the
    /// in-memory ledger, which simulates known contracts.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Bytes::new())
    }

    /// Parse a build artifact JSON document.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load a build artifact from disk.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read artifact {}", path.display()))?;
        Self::from_json(&json).wrap_err_with(|| format!("Invalid artifact {}", path.display()))
    }
}

/// The ledger as seen by the exploit driver.
///
/// Passed explicitly to every operation that needs it, so tests can substitute
/// a fake.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Create a contract from `artifact` with the given constructor arguments.
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[Bytes],
        from: Address,
    ) -> Result<Address, TransportError>;

    /// Read one raw storage slot. Any caller, any slot, any visibility.
    async fn read_slot(&self, address: Address, slot: U256) -> Result<Word, TransportError>;

    /// Submit a state-changing call. A revert is reported through
    /// `CallOutcome::success`, not as an error.
    async fn submit_call(
        &self,
        address: Address,
        calldata: Bytes,
        sender: Address,
    ) -> Result<CallOutcome, TransportError>;

    /// Call the generated getter of a public field and return its ABI word.
    async fn read_public_field(&self, address: Address, field: &str) -> Result<B256, TransportError>;
}

/// Random `bytes32` constructor arguments for the target's `data` array.
pub fn random_constructor_args() -> Vec<Bytes> {
    (0..CONSTRUCTOR_ARG_COUNT)
        .map(|_| Bytes::copy_from_slice(B256::random().as_slice()))
        .collect()
}

/// Left-align a constructor argument into a `bytes32`.
pub(crate) fn bytes32_arg(arg: &[u8]) -> Option<B256> {
    if arg.len() > WORD_BYTES {
        return None;
    }
    let mut word = [0u8; WORD_BYTES];
    word[..arg.len()].copy_from_slice(arg);
    Some(B256::from(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_constructor_args_shape() {
        let args = random_constructor_args();
        assert_eq!(args.len(), CONSTRUCTOR_ARG_COUNT);
        assert!(args.iter().all(|a| a.len() == WORD_BYTES));
        assert_ne!(args[0], args[1]);
    }

    #[test]
    fn test_artifact_from_truffle_json() {
        let json = r#"{
            "contractName": "Privacy",
            "abi": [],
            "bytecode": "0x6080604052",
            "networks": {}
        }"#;
        let artifact = ContractArtifact::from_json(json).unwrap();
        assert_eq!(artifact.name, PRIVACY_CONTRACT);
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn test_artifact_without_bytecode_defaults_empty() {
        let artifact = ContractArtifact::from_json(r#"{"contractName": "Hacker"}"#).unwrap();
        assert_eq!(artifact, ContractArtifact::named(HACKER_CONTRACT));
    }

    #[test]
    fn test_bytes32_arg_left_aligns() {
        let word = bytes32_arg(&[0xaa]).unwrap();
        assert_eq!(word[0], 0xaa);
        assert!(bytes32_arg(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_selectors_differ() {
        assert_ne!(selectors::unlock(), selectors::attack());
        assert_ne!(selectors::getter("locked"), selectors::getter("ID"));
        assert_eq!(selectors::getter("locked"), function_selector("locked()"));
    }
}
