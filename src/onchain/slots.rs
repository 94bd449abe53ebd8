/// Privacy contract storage layout.
///
/// Hand-derived from the contract source; `layout::resolve` must agree.
pub mod privacy_slots {
    use alloy_primitives::U256;

    /// slot 0: locked (bool)
    pub const LOCKED: U256 = U256::from_limbs([0, 0, 0, 0]);
    /// slot 1: ID (uint256)
    pub const ID: U256 = U256::from_limbs([1, 0, 0, 0]);
    /// slot 2: flattening (uint8), denomination (uint8), awkwardness (uint16)
    pub const PACKED: U256 = U256::from_limbs([2, 0, 0, 0]);
    /// slot 3: data[0] (bytes32)
    pub const DATA: U256 = U256::from_limbs([3, 0, 0, 0]);
    /// slot 5: data[2] (bytes32), whose high half is the unlock key
    pub const KEY: U256 = U256::from_limbs([5, 0, 0, 0]);
}
