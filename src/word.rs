//! Raw storage words and the byte ranges cut out of them.
//!
//! A [`Word`] is addressed by byte offset from its most-significant byte:
//! offset 0 is the first byte of the big-endian value. Extraction slices by
//! offset, never by shifting from the least-significant end.

use alloy_primitives::{Bytes, FixedBytes, B256};
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

use crate::constants::{KEY_BYTES, WORD_BYTES};

/// Requested bytes fall outside the 32-byte word
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Byte range {start}..{end} does not fit in a {WORD_BYTES}-byte word")]
pub struct WordRangeError {
    pub start: usize,
    pub end: usize,
}

/// Contents of one storage slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Word(B256);

impl Word {
    pub const ZERO: Self = Self(B256::ZERO);

    pub const fn new(value: B256) -> Self {
        Self(value)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Copy out `range` (offsets from the most-significant byte).
    pub fn slice(&self, range: Range<usize>) -> Result<ExtractedValue, WordRangeError> {
        if range.start >= range.end || range.end > WORD_BYTES {
            return Err(WordRangeError { start: range.start, end: range.end });
        }
        Ok(ExtractedValue(Bytes::copy_from_slice(&self.0[range])))
    }

    /// A copy of this word with `bytes` written at `offset`.
    pub fn with_bytes(mut self, offset: usize, bytes: &[u8]) -> Result<Self, WordRangeError> {
        let end = offset + bytes.len();
        if bytes.is_empty() || end > WORD_BYTES {
            return Err(WordRangeError { start: offset, end });
        }
        self.0[offset..end].copy_from_slice(bytes);
        Ok(self)
    }
}

impl From<B256> for Word {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<[u8; WORD_BYTES]> for Word {
    fn from(value: [u8; WORD_BYTES]) -> Self {
        Self(B256::from(value))
    }
}

impl From<Word> for B256 {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bytes cut out of a [`Word`], treated as opaque key material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExtractedValue(Bytes);

impl ExtractedValue {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Solidity's explicit `bytes16(x)` conversion: keep the leading bytes,
    /// right-pad shorter values with zeros.
    pub fn to_bytes16(&self) -> FixedBytes<KEY_BYTES> {
        let mut key = FixedBytes::<KEY_BYTES>::ZERO;
        let n = self.0.len().min(KEY_BYTES);
        key[..n].copy_from_slice(&self.0[..n]);
        key
    }
}

impl From<&[u8]> for ExtractedValue {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl fmt::Display for ExtractedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}
