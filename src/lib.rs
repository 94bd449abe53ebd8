//! # slotbreach - reading "private" contract storage
//!
//! Declaring a Solidity state variable `private` only hides its getter. The
//! value still sits in a storage slot that anyone can read with
//! `eth_getStorageAt`. This crate resolves where each declared field lives,
//! reads it straight out of storage and uses it to pass the contract's own
//! access check.
//!
//! - [`layout`]: slot/offset resolution for a declared field list
//! - [`exploit`]: peek at a field, or extract the key and unlock the target
//! - [`onchain`]: the [`onchain::Ledger`] trait with in-memory and JSON-RPC backends

pub mod cli;
pub mod config;
pub mod constants;
pub mod exploit;
pub mod layout;
pub mod onchain;
pub mod output;
pub mod signer;
pub mod word;
