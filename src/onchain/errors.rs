use alloy_primitives::Address;
use thiserror::Error;

/// Failures talking to the ledger. None of these say anything about whether
/// the contract logic accepted or refused a call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The JSON-RPC request itself failed
    #[error("RPC request `{method}` failed: {message}")]
    Rpc {
        /// JSON-RPC method name
        method: &'static str,
        /// Error reported by the client or node
        message: String,
    },

    /// The request or the receipt wait timed out
    #[error("RPC request `{method}` timed out")]
    Timeout {
        /// JSON-RPC method name
        method: &'static str,
    },

    /// A response could not be interpreted
    #[error("Unexpected response to `{method}`: {message}")]
    Decode {
        /// JSON-RPC method name
        method: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Contract creation failed
    #[error("Deployment of `{contract}` failed: {reason}")]
    Deploy {
        /// Artifact name
        contract: String,
        /// Why
        reason: String,
    },

    /// The contract has no getter for the field (not public, or unknown)
    #[error("Contract {address} exposes no getter for `{field}`")]
    NoGetter {
        /// Contract address
        address: Address,
        /// Requested field
        field: String,
    },

    /// Local transaction signing failed
    #[error("Signing a transaction for {0} failed")]
    Signing(Address),
}

impl TransportError {
    pub(crate) fn decode(method: &'static str, message: impl Into<String>) -> Self {
        Self::Decode { method, message: message.into() }
    }
}
