/// Size of one storage slot (and one ABI word) in bytes
pub const WORD_BYTES: usize = 32;
/// Width of the `bytes16` key accepted by `unlock(bytes16)`
pub const KEY_BYTES: usize = 16;
/// Public flag that flips once the target is unlocked
pub const DEFAULT_LOCK_FIELD: &str = "locked";
/// Array element holding the secret key
pub const DEFAULT_KEY_FIELD: &str = "data[2]";
/// The key is the high half of `data[2]`
pub const DEFAULT_KEY_START: usize = 0;
/// End (exclusive) of the key window inside `data[2]`
pub const DEFAULT_KEY_END: usize = KEY_BYTES;
/// Number of random `bytes32` values the target's constructor takes
pub const CONSTRUCTOR_ARG_COUNT: usize = 3;
/// Gas attached to state-changing calls when the node does not estimate
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;
/// Default JSON-RPC endpoint of a local dev node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
