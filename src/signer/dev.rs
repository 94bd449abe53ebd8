//! Well-known development accounts.
//!
//! These are the default mnemonic accounts of anvil and hardhat
//! (`test test test ... junk`). They are public knowledge: never fund them on
//! a real network.

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;

use super::SignerError;

/// Private keys of the first dev accounts, in order
pub const DEV_PRIVATE_KEYS: [&str; 3] = [
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

/// Index of the account that deploys the target
pub const OWNER_INDEX: usize = 0;
/// Index of the unprivileged attacker account
pub const ATTACKER_INDEX: usize = 1;

/// Address of the dev account at `index`.
pub fn dev_address(index: usize) -> Result<Address, SignerError> {
    DEV_PRIVATE_KEYS
        .get(index)
        .ok_or(SignerError::InvalidPrivateKey)?
        .parse::<PrivateKeySigner>()
        .map(|signer| signer.address())
        .map_err(|_| SignerError::InvalidPrivateKey)
}

