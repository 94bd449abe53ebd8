//! Account keys
//!
//! Keys for the accounts that sign transactions locally: the deployer of the
//! target and the unprivileged attacker.

pub mod dev;
pub mod errors;
pub mod manager;

pub use errors::SignerError;
pub use manager::SignerManager;
