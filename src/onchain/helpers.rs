use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};

use crate::constants::{KEY_BYTES, WORD_BYTES};

/// Decode an address from an ABI word (left-padded with zeros).
pub fn decode_address(value: B256) -> Address {
    Address::from_slice(&value[12..32])
}

/// Decode a u64 from an ABI word.
pub fn decode_u64(value: B256) -> u64 {
    U256::from_be_bytes(value.0).as_limbs()[0]
}

/// Decode a bool from an ABI word.
pub fn decode_bool(value: B256) -> bool {
    value[31] != 0
}

/// Encode a u64 value into an ABI word.
#[cfg(test)]
pub(crate) fn encode_u64(value: u64) -> B256 {
    B256::from(U256::from(value).to_be_bytes::<32>())
}

/// Encode an address into an ABI word (left-padded).
pub fn encode_address(addr: Address) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[12..32].copy_from_slice(addr.as_slice());
    B256::from(bytes)
}

/// Encode a `bytes16` into an ABI word (left-aligned, right-padded).
pub fn encode_bytes16(key: FixedBytes<KEY_BYTES>) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[..KEY_BYTES].copy_from_slice(key.as_slice());
    B256::from(bytes)
}

/// Decode a `bytes16` from an ABI word.
pub fn decode_bytes16(value: &[u8]) -> FixedBytes<KEY_BYTES> {
    FixedBytes::from_slice(&value[..KEY_BYTES])
}

/// Right-align a value's big-endian bytes in an ABI word, the way value types
/// come back from a getter.
pub fn right_align(bytes: &[u8]) -> B256 {
    let mut word = [0u8; 32];
    let n = bytes.len().min(WORD_BYTES);
    word[WORD_BYTES - n..].copy_from_slice(&bytes[bytes.len() - n..]);
    B256::from(word)
}

/// Calldata for a call with static (one-word) arguments.
pub fn encode_call(selector: [u8; 4], args: &[B256]) -> Bytes {
    let mut data = Vec::with_capacity(4 + args.len() * WORD_BYTES);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg.as_slice());
    }
    data.into()
}

/// Creation code followed by constructor arguments, each left-aligned and
/// zero-padded to a whole number of words (`bytes32[N]` is N inline words).
pub fn encode_constructor(bytecode: &[u8], args: &[Bytes]) -> Bytes {
    let mut data = bytecode.to_vec();
    for arg in args {
        data.extend_from_slice(arg);
        let rem = arg.len() % WORD_BYTES;
        if rem != 0 || arg.is_empty() {
            data.resize(data.len() + WORD_BYTES - rem, 0);
        }
    }
    data.into()
}

/// Argument word `index` of `calldata`, if present.
pub fn call_arg(calldata: &[u8], index: usize) -> Option<&[u8]> {
    let start = 4 + index * WORD_BYTES;
    calldata.get(start..start + WORD_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};

    #[test]
    fn test_encode_decode_u64_roundtrip() {
        for val in [0u64, 1, 1_624_538_436, u64::MAX] {
            assert_eq!(decode_u64(encode_u64(val)), val);
        }
    }

    #[test]
    fn test_encode_address_is_left_padded() {
        let addr = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let encoded = encode_address(addr);
        assert_eq!(&encoded[..12], &[0u8; 12]);
        assert_eq!(decode_address(encoded), addr);
    }

    #[test]
    fn test_decode_bool_true_and_false() {
        assert!(!decode_bool(B256::ZERO));
        assert!(decode_bool(encode_u64(1)));
    }

    #[test]
    fn test_bytes16_is_left_aligned() {
        let key = FixedBytes::<16>::repeat_byte(0xab);
        let word = encode_bytes16(key);
        assert_eq!(&word[..16], key.as_slice());
        assert_eq!(&word[16..], &[0u8; 16]);
        assert_eq!(decode_bytes16(word.as_slice()), key);
    }

    #[test]
    fn test_right_align() {
        let word = right_align(&[0x01, 0x02]);
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert_eq!(right_align(&[0xff; 40]), B256::repeat_byte(0xff));
    }

    #[test]
    fn test_encode_call_layout() {
        let data = encode_call([1, 2, 3, 4], &[B256::repeat_byte(7), B256::repeat_byte(9)]);
        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &[1, 2, 3, 4]);
        assert_eq!(call_arg(&data, 1).unwrap(), B256::repeat_byte(9).as_slice());
        assert!(call_arg(&data, 2).is_none());
    }

    #[test]
    fn test_encode_constructor_pads_each_argument() {
        let data = encode_constructor(&[0x60, 0x80], &[bytes!("01"), Bytes::from(vec![2u8; 32])]);
        assert_eq!(data.len(), 2 + 64);
        assert_eq!(data[2], 0x01);
        assert_eq!(&data[3..34], &[0u8; 31]);
        assert_eq!(data[34], 0x02);
    }
}
