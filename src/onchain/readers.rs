use alloy_primitives::{Address, U256};
use std::collections::BTreeMap;

use super::helpers::decode_bool;
use super::{Ledger, TransportError};
use crate::layout::{SlotLayout, SlotPlacement};
use crate::word::{ExtractedValue, Word};

/// One decoded value of a storage dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    /// `name` or `name[i]`
    pub selector: String,
    pub placement: SlotPlacement,
    pub value: ExtractedValue,
}

/// Read a public boolean through its getter.
pub async fn read_flag(ledger: &dyn Ledger, address: Address, field: &str) -> Result<bool, TransportError> {
    ledger.read_public_field(address, field).await.map(decode_bool)
}

/// Read every value of `layout` from `address`, regardless of visibility.
///
/// Each distinct slot is read once per call; nothing is kept between calls.
pub async fn read_all_fields(
    ledger: &dyn Ledger,
    address: Address,
    layout: &SlotLayout,
) -> Result<Vec<StoredValue>, TransportError> {
    let entries = layout.entries();
    let mut words: BTreeMap<U256, Word> = BTreeMap::new();
    for (_, placement) in &entries {
        if !words.contains_key(&placement.slot) {
            let word = ledger.read_slot(address, placement.slot).await?;
            words.insert(placement.slot, word);
        }
    }

    let mut values = Vec::with_capacity(entries.len());
    for (selector, placement) in entries {
        let word = words.get(&placement.slot).copied().unwrap_or_default();
        let value = word
            .slice(placement.byte_range())
            .map_err(|e| TransportError::decode("eth_getStorageAt", e.to_string()))?;
        values.push(StoredValue { selector, placement, value });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onchain::{ContractArtifact, InMemoryLedger, PRIVACY_CONTRACT};
    use alloy_primitives::Bytes;

    #[tokio::test]
    async fn test_read_all_fields_reads_private_values() {
        let ledger = InMemoryLedger::new();
        let owner = Address::repeat_byte(0x11);
        let args: Vec<Bytes> = (1..=3u8).map(|i| Bytes::from(vec![i; 32])).collect();
        let target = ledger
            .deploy(&ContractArtifact::named(PRIVACY_CONTRACT), &args, owner)
            .await
            .unwrap();

        let values = read_all_fields(&ledger, target, ledger.privacy_layout()).await.unwrap();
        let by_name = |name: &str| values.iter().find(|v| v.selector == name).unwrap().value.clone();

        assert_eq!(by_name("locked").as_bytes(), &[1]);
        assert_eq!(by_name("flattening").as_bytes(), &[10]);
        assert_eq!(by_name("denomination").as_bytes(), &[255]);
        assert_eq!(by_name("data[2]").as_bytes(), &[3u8; 32]);

        // slots 0..=5, each read once
        assert_eq!(ledger.stats().await.slot_reads, 6);
        assert!(read_flag(&ledger, target, "locked").await.unwrap());
    }
}
