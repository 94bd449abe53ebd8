use alloy_primitives::keccak256;

/// Compute the Solidity function selector (first 4 bytes of keccak256(signature)).
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

// Privacy
pub fn unlock() -> [u8; 4] {
    function_selector("unlock(bytes16)")
}

// Hacker
pub fn attack() -> [u8; 4] {
    function_selector("attack(address,bytes16)")
}

/// Selector of the getter solc generates for a public state variable.
pub fn getter(field: &str) -> [u8; 4] {
    function_selector(&format!("{field}()"))
}
