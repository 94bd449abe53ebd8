use alloy_primitives::Address;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_GAS_LIMIT, DEFAULT_KEY_END, DEFAULT_KEY_FIELD, DEFAULT_KEY_START, DEFAULT_LOCK_FIELD,
};
use crate::exploit::AttackPlan;
use crate::layout::PackingOrder;
use crate::onchain::RpcConfig;

/// Exploit settings loaded from a JSON file (`--config`).
///
/// Every key is optional; missing keys take the `Privacy` defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExploitConfig {
    /// Public boolean expected to flip when the unlock works
    pub lock_field: String,
    /// Selector of the value holding the key
    pub key_field: String,
    /// Key bytes relative to `key_field`
    pub key_range: Range<usize>,
    /// Packing convention of the target's compiler
    pub packing_order: PackingOrder,
    /// Gas attached to every transaction
    pub gas_limit: u64,
    /// Timeout of a single JSON-RPC request, in seconds
    pub request_timeout_secs: u64,
    /// Delay between receipt polls, in milliseconds
    pub receipt_poll_interval_ms: u64,
    /// Receipt polls before giving up
    pub receipt_attempts: u32,
}

impl Default for ExploitConfig {
    fn default() -> Self {
        let rpc = RpcConfig::default();
        Self {
            lock_field: DEFAULT_LOCK_FIELD.to_string(),
            key_field: DEFAULT_KEY_FIELD.to_string(),
            key_range: DEFAULT_KEY_START..DEFAULT_KEY_END,
            packing_order: PackingOrder::default(),
            gas_limit: DEFAULT_GAS_LIMIT,
            request_timeout_secs: rpc.request_timeout.as_secs(),
            receipt_poll_interval_ms: rpc.receipt_poll_interval.as_millis() as u64,
            receipt_attempts: rpc.receipt_attempts,
        }
    }
}

impl ExploitConfig {
    /// Read a config file. A missing path yields the defaults.
    pub fn load(path: Option<&Path>) -> eyre::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json).wrap_err_with(|| format!("Invalid config {}", path.display()))
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            gas_limit: self.gas_limit,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            receipt_poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
            receipt_attempts: self.receipt_attempts,
        }
    }

    /// Attack plan against `target` using the configured fields.
    pub fn plan(&self, target: Address, attacker: Address) -> AttackPlan {
        AttackPlan::new(target, attacker)
            .with_key(self.key_field.clone(), self.key_range.clone())
            .with_lock_field(self.lock_field.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_the_privacy_contract() {
        let config = ExploitConfig::default();
        assert_eq!(config.key_field, "data[2]");
        assert_eq!(config.key_range, 0..16);
        assert_eq!(config.rpc_config(), RpcConfig::default());

        let plan = config.plan(Address::repeat_byte(1), Address::repeat_byte(2));
        assert_eq!(plan, AttackPlan::new(Address::repeat_byte(1), Address::repeat_byte(2)));
    }

    #[test]
    fn test_partial_json_keeps_remaining_defaults() {
        let json = r#"{
            "keyField": "data[1]",
            "keyRange": { "start": 16, "end": 32 },
            "packingOrder": "lsbfirst",
            "receiptAttempts": 5
        }"#;
        let config: ExploitConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.key_field, "data[1]");
        assert_eq!(config.key_range, 16..32);
        assert_eq!(config.packing_order, PackingOrder::LsbFirst);
        assert_eq!(config.rpc_config().receipt_attempts, 5);
        assert_eq!(config.lock_field, "locked");
        assert_eq!(config.gas_limit, DEFAULT_GAS_LIMIT);
    }

    #[test]
    fn test_load_without_path_is_default() {
        assert_eq!(ExploitConfig::load(None).unwrap(), ExploitConfig::default());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = ExploitConfig::load(Some(Path::new("/nonexistent/slotbreach.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
