use alloy_primitives::{Address, B256};
use thiserror::Error;

use crate::onchain::TransportError;

/// Ways an exploit run can fail
#[derive(Debug, Error)]
pub enum AttackError {
    /// The requested field is not part of the layout
    #[error("Unknown field `{0}` in storage layout")]
    UnknownField(String),

    /// The byte range does not fit the field or its slot
    #[error("Byte range {start}..{end} is out of bounds for `{field}` ({width} bytes at slot offset {offset})")]
    RangeOutOfBounds {
        /// Field selector
        field: String,
        /// Requested start, relative to the field
        start: usize,
        /// Requested end (exclusive), relative to the field
        end: usize,
        /// Declared width of the field
        width: usize,
        /// Offset of the field inside its slot
        offset: usize,
    },

    /// The ledger could not be reached or answered nonsense
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The unlock call reverted
    #[error("Unlock transaction against {target} was rejected (tx {tx_hash})")]
    TransactionRejected {
        /// Target contract
        target: Address,
        /// Hash of the reverted transaction (zero if refused before mining)
        tx_hash: B256,
    },

    /// The unlock call succeeded but the guarded flag did not move
    #[error("Unlock transaction {tx_hash} succeeded but `{lock_field}` of {target} is still {value}")]
    AttackIneffective {
        /// Target contract
        target: Address,
        /// Flag that was expected to change
        lock_field: String,
        /// Its unchanged value
        value: bool,
        /// Hash of the accepted transaction
        tx_hash: B256,
    },
}
