//! Deterministic in-process ledger.
//!
//! Hosts simulated versions of the two contracts the exploit deals with:
//!
//! ```text
//! contract Privacy {
//!     bool public locked = true;
//!     uint256 public ID = block.timestamp;
//!     uint8 private flattening = 10;
//!     uint8 private denomination = 255;
//!     uint16 private awkwardness = uint16(block.timestamp);
//!     bytes32[3] private data;
//!
//!     constructor(bytes32[3] memory _data) { data = _data; }
//!
//!     function unlock(bytes16 _key) public {
//!         require(_key == bytes16(data[2]));
//!         locked = false;
//!     }
//! }
//!
//! contract Hacker {
//!     function attack(address target, bytes16 key) public { Privacy(target).unlock(key); }
//! }
//! ```
//!
//! Storage is laid out by the same resolver the exploit uses, so the two can
//! only agree if the resolver is right about the declaration. A call that
//! reverts leaves every contract's storage exactly as it was.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::helpers::{call_arg, decode_address, decode_bytes16, encode_call, right_align};
use super::{
    bytes32_arg, selectors, CallOutcome, ContractArtifact, Ledger, TransportError,
    HACKER_CONTRACT, PRIVACY_CONTRACT,
};
use crate::constants::{CONSTRUCTOR_ARG_COUNT, KEY_BYTES, WORD_BYTES};
use crate::layout::{resolve_with, PackingOrder, SlotLayout, SlotPlacement};
use crate::word::Word;

/// Default block timestamp of the simulated chain
pub const DEFAULT_TIMESTAMP: u64 = 1_624_538_436;

/// Counters of every request the ledger served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub deployments: u64,
    pub slot_reads: u64,
    pub calls: u64,
    pub getter_reads: u64,
}

impl LedgerStats {
    /// Total number of requests of any kind.
    pub fn total(&self) -> u64 {
        self.deployments + self.slot_reads + self.calls + self.getter_reads
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContractKind {
    Privacy,
    Hacker,
}

#[derive(Debug, Clone)]
struct Contract {
    kind: ContractKind,
    storage: BTreeMap<U256, B256>,
}

#[derive(Debug, Default)]
struct LedgerState {
    contracts: HashMap<Address, Contract>,
    nonces: HashMap<Address, u64>,
    stats: LedgerStats,
}

impl LedgerState {
    fn next_nonce(&mut self, sender: Address) -> u64 {
        let nonce = self.nonces.entry(sender).or_default();
        let current = *nonce;
        *nonce += 1;
        current
    }
}

/// Why a simulated call reverted
#[derive(Debug)]
struct Revert(&'static str);

/// An in-memory ledger hosting simulated `Privacy` and `Hacker` contracts.
#[derive(Debug)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    layout: SlotLayout,
    timestamp: u64,
}

impl InMemoryLedger {
    /// A ledger that packs storage most-significant-byte first.
    pub fn new() -> Self {
        Self::with_packing_order(PackingOrder::MsbFirst)
    }

    /// A ledger whose contracts pack their storage per `order`.
    pub fn with_packing_order(order: PackingOrder) -> Self {
        let layout = resolve_with(&SlotLayout::privacy_fields(), order)
            .expect("privacy layout is well-formed");
        Self { state: RwLock::new(LedgerState::default()), layout, timestamp: DEFAULT_TIMESTAMP }
    }

    /// Override the block timestamp seen by constructors.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Layout the simulated `Privacy` contract stores its state with.
    pub fn privacy_layout(&self) -> &SlotLayout {
        &self.layout
    }

    /// Requests served so far.
    pub async fn stats(&self) -> LedgerStats {
        self.state.read().await.stats
    }

    fn placement(&self, selector: &str) -> Result<SlotPlacement, Revert> {
        self.layout.placement(selector).ok_or(Revert("field missing from layout"))
    }

    fn privacy_storage(&self, args: &[Bytes]) -> Result<BTreeMap<U256, B256>, String> {
        if args.len() != CONSTRUCTOR_ARG_COUNT {
            return Err(format!(
                "expected {CONSTRUCTOR_ARG_COUNT} constructor arguments, got {}",
                args.len()
            ));
        }

        let timestamp = U256::from(self.timestamp).to_be_bytes::<WORD_BYTES>();
        let mut values: Vec<(String, Vec<u8>)> = vec![
            ("locked".into(), vec![1]),
            ("ID".into(), timestamp.to_vec()),
            ("flattening".into(), vec![10]),
            ("denomination".into(), vec![255]),
            ("awkwardness".into(), timestamp.to_vec()),
        ];
        for (i, arg) in args.iter().enumerate() {
            let word = bytes32_arg(arg).ok_or_else(|| format!("argument {i} exceeds bytes32"))?;
            values.push((format!("data[{i}]"), word.to_vec()));
        }

        let mut storage = BTreeMap::new();
        for (selector, value) in values {
            let placement = self.placement(&selector).map_err(|r| r.0.to_string())?;
            store(&mut storage, placement, &value).map_err(|r| r.0.to_string())?;
        }
        Ok(storage)
    }

    fn execute(
        &self,
        state: &mut LedgerState,
        to: Address,
        calldata: &[u8],
        sender: Address,
    ) -> Result<(), Revert> {
        // Calls to accounts without code succeed and do nothing.
        let Some(kind) = state.contracts.get(&to).map(|c| c.kind) else {
            debug!(target: "slotbreach::ledger", %to, "call to account without code");
            return Ok(());
        };
        let selector: [u8; 4] = calldata
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or(Revert("calldata shorter than a selector"))?;

        match kind {
            ContractKind::Privacy if selector == selectors::unlock() => {
                let arg = call_arg(calldata, 0).ok_or(Revert("missing key argument"))?;
                let key = decode_bytes16(arg);
                let (key_slot, locked_slot) = (self.placement("data[2]")?, self.placement("locked")?);
                let storage = &mut state.contracts.get_mut(&to).ok_or(Revert("no code"))?.storage;
                let secret = load(storage, key_slot);
                if key.as_slice() != &secret[..KEY_BYTES] {
                    return Err(Revert("key mismatch"));
                }
                store(storage, locked_slot, &[0])?;
                debug!(target: "slotbreach::ledger", %to, %sender, "privacy unlocked");
                Ok(())
            }
            ContractKind::Hacker if selector == selectors::attack() => {
                let target = decode_address(B256::from_slice(
                    call_arg(calldata, 0).ok_or(Revert("missing target argument"))?,
                ));
                let key = B256::from_slice(call_arg(calldata, 1).ok_or(Revert("missing key argument"))?);
                let inner = encode_call(selectors::unlock(), &[key]);
                self.execute(state, target, &inner, to)
            }
            _ => Err(Revert("unknown selector")),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `value`'s low-order `placement.width` bytes into the placement.
fn store(storage: &mut BTreeMap<U256, B256>, placement: SlotPlacement, value: &[u8]) -> Result<(), Revert> {
    let width = placement.width.min(value.len());
    let mut field = vec![0u8; placement.width];
    field[placement.width - width..].copy_from_slice(&value[value.len() - width..]);

    let word = Word::from(storage.get(&placement.slot).copied().unwrap_or_default())
        .with_bytes(placement.offset, &field)
        .map_err(|_| Revert("placement outside the slot"))?;
    storage.insert(placement.slot, word.into());
    Ok(())
}

/// Bytes of the placement's window.
fn load(storage: &BTreeMap<U256, B256>, placement: SlotPlacement) -> Vec<u8> {
    let word = storage.get(&placement.slot).copied().unwrap_or_default();
    word[placement.byte_range()].to_vec()
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[Bytes],
        from: Address,
    ) -> Result<Address, TransportError> {
        let deploy_error = |reason: String| TransportError::Deploy {
            contract: artifact.name.clone(),
            reason,
        };
        let contract = match artifact.name.as_str() {
            PRIVACY_CONTRACT => Contract {
                kind: ContractKind::Privacy,
                storage: self.privacy_storage(constructor_args).map_err(deploy_error)?,
            },
            HACKER_CONTRACT if constructor_args.is_empty() => {
                Contract { kind: ContractKind::Hacker, storage: BTreeMap::new() }
            }
            HACKER_CONTRACT => return Err(deploy_error("constructor takes no arguments".into())),
            other => return Err(deploy_error(format!("no simulation for contract `{other}`"))),
        };

        let mut state = self.state.write().await;
        state.stats.deployments += 1;
        let nonce = state.next_nonce(from);
        let address = from.create(nonce);
        state.contracts.insert(address, contract);
        info!(target: "slotbreach::ledger", contract = %artifact.name, %address, deployer = %from, "deployed");
        Ok(address)
    }

    async fn read_slot(&self, address: Address, slot: U256) -> Result<Word, TransportError> {
        let mut state = self.state.write().await;
        state.stats.slot_reads += 1;
        let value = state
            .contracts
            .get(&address)
            .and_then(|c| c.storage.get(&slot).copied())
            .unwrap_or_default();
        debug!(target: "slotbreach::ledger", %address, %slot, %value, "storage read");
        Ok(Word::new(value))
    }

    async fn submit_call(
        &self,
        address: Address,
        calldata: Bytes,
        sender: Address,
    ) -> Result<CallOutcome, TransportError> {
        let mut state = self.state.write().await;
        state.stats.calls += 1;
        let nonce = state.next_nonce(sender);

        let mut preimage = Vec::with_capacity(20 + 8 + 20 + calldata.len());
        preimage.extend_from_slice(sender.as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(address.as_slice());
        preimage.extend_from_slice(&calldata);
        let tx_hash = keccak256(&preimage);

        let snapshot = state.contracts.clone();
        let success = match self.execute(&mut state, address, &calldata, sender) {
            Ok(()) => true,
            Err(Revert(reason)) => {
                state.contracts = snapshot;
                debug!(target: "slotbreach::ledger", %tx_hash, reason, "call reverted");
                false
            }
        };
        Ok(CallOutcome { success, tx_hash })
    }

    async fn read_public_field(&self, address: Address, field: &str) -> Result<B256, TransportError> {
        let mut state = self.state.write().await;
        state.stats.getter_reads += 1;
        let no_getter = || TransportError::NoGetter { address, field: field.to_string() };

        let contract = state.contracts.get(&address).ok_or_else(no_getter)?;
        if contract.kind != ContractKind::Privacy {
            return Err(no_getter());
        }
        let declared = self.layout.field(field).ok_or_else(no_getter)?;
        if !declared.visibility.has_getter() || declared.is_array {
            return Err(no_getter());
        }
        let placement = self.layout.placement(field).ok_or_else(no_getter)?;
        Ok(right_align(&load(&contract.storage, placement)))
    }
}
