//! JSON-RPC ledger for a real node.
//!
//! Raw storage reads go through `eth_getStorageAt`, getters through `eth_call`.
//! Transactions are signed locally when the sender's key is loaded into the
//! [`SignerManager`], otherwise they are sent with `eth_sendTransaction` and
//! the node signs with its own unlocked account (anvil, hardhat, ganache).

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256, U64};
use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::helpers::encode_constructor;
use super::types::{CallRequest, TransactionReceipt, TransactionRequest};
use super::{selectors, CallOutcome, ContractArtifact, Ledger, TransportError};
use crate::constants::{DEFAULT_GAS_LIMIT, WORD_BYTES};
use crate::signer::SignerManager;
use crate::word::Word;

/// Transport settings for [`RpcLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    /// Gas attached to every transaction
    pub gas_limit: u64,
    /// Timeout of a single JSON-RPC request
    pub request_timeout: Duration,
    /// Delay between receipt polls
    pub receipt_poll_interval: Duration,
    /// Receipt polls before giving up with a timeout
    pub receipt_attempts: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            request_timeout: Duration::from_secs(30),
            receipt_poll_interval: Duration::from_millis(500),
            receipt_attempts: 60,
        }
    }
}

/// Result of handing a transaction to the node
#[derive(Debug)]
enum Submission {
    /// Accepted into the pool under this hash
    Pending(B256),
    /// Refused up front because execution reverts
    Refused(String),
}

/// A [`Ledger`] backed by an Ethereum JSON-RPC endpoint.
pub struct RpcLedger {
    client: HttpClient,
    signers: Arc<SignerManager>,
    config: RpcConfig,
    /// Held from the `pending` nonce fetch until the node has the transaction
    nonce_lock: Mutex<()>,
}

impl RpcLedger {
    /// Create a client for `url`. No request is made until the first call.
    pub fn connect(
        url: &str,
        signers: Arc<SignerManager>,
        config: RpcConfig,
    ) -> Result<Self, TransportError> {
        let client = HttpClientBuilder::default()
            .request_timeout(config.request_timeout)
            .build(url)
            .map_err(|e| TransportError::Rpc { method: "connect", message: e.to_string() })?;
        Ok(Self { client, signers, config, nonce_lock: Mutex::new(()) })
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: ArrayParams,
    ) -> Result<R, TransportError> {
        self.client
            .request(method, params)
            .await
            .map_err(|e| map_client_error(method, e))
    }

    async fn submit(&self, method: &'static str, params: ArrayParams) -> Result<Submission, TransportError> {
        match self.client.request::<B256, _>(method, params).await {
            Ok(hash) => Ok(Submission::Pending(hash)),
            Err(err) if is_revert(&err) => Ok(Submission::Refused(err.to_string())),
            Err(err) => Err(map_client_error(method, err)),
        }
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Option<Address>,
        data: Bytes,
    ) -> Result<Submission, TransportError> {
        if self.signers.has_signer(&from).await {
            return self.send_signed(from, to.map_or(TxKind::Create, TxKind::Call), data).await;
        }
        let request = TransactionRequest { from, to, data, gas: U64::from(self.config.gas_limit) };
        self.submit("eth_sendTransaction", rpc_params![request]).await
    }

    async fn send_signed(&self, from: Address, to: TxKind, input: Bytes) -> Result<Submission, TransportError> {
        let _guard = self.nonce_lock.lock().await;
        let nonce: U64 = self.request("eth_getTransactionCount", rpc_params![from, "pending"]).await?;
        let gas_price: U256 = self.request("eth_gasPrice", rpc_params![]).await?;
        let chain_id: U64 = self.request("eth_chainId", rpc_params![]).await?;

        let tx = TxLegacy {
            chain_id: Some(chain_id.to::<u64>()),
            nonce: nonce.to::<u64>(),
            gas_price: gas_price.saturating_to::<u128>(),
            gas_limit: self.config.gas_limit,
            to,
            value: U256::ZERO,
            input,
        };
        let signature = self
            .signers
            .sign_hash(&from, tx.signature_hash())
            .await
            .map_err(|_| TransportError::Signing(from))?;
        let raw: Bytes = TxEnvelope::from(tx.into_signed(signature)).encoded_2718().into();
        debug!(target: "slotbreach::rpc", %from, nonce = nonce.to::<u64>(), "sending signed transaction");
        self.submit("eth_sendRawTransaction", rpc_params![raw]).await
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, TransportError> {
        for attempt in 0..self.config.receipt_attempts {
            let receipt: Option<TransactionReceipt> =
                self.request("eth_getTransactionReceipt", rpc_params![hash]).await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }
            debug!(target: "slotbreach::rpc", %hash, attempt, "receipt not available yet");
            tokio::time::sleep(self.config.receipt_poll_interval).await;
        }
        Err(TransportError::Timeout { method: "eth_getTransactionReceipt" })
    }
}

/// Whether the node refused a request because execution reverted.
fn is_revert(err: &ClientError) -> bool {
    matches!(err, ClientError::Call(obj) if obj.message().to_ascii_lowercase().contains("revert"))
}

fn map_client_error(method: &'static str, err: ClientError) -> TransportError {
    match err {
        ClientError::RequestTimeout => TransportError::Timeout { method },
        other => TransportError::Rpc { method, message: other.to_string() },
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[Bytes],
        from: Address,
    ) -> Result<Address, TransportError> {
        let deploy_error = |reason: String| TransportError::Deploy {
            contract: artifact.name.clone(),
            reason,
        };
        if artifact.bytecode.is_empty() {
            return Err(deploy_error("artifact has no bytecode".into()));
        }

        let data = encode_constructor(&artifact.bytecode, constructor_args);
        let hash = match self.send_transaction(from, None, data).await? {
            Submission::Pending(hash) => hash,
            Submission::Refused(reason) => return Err(deploy_error(reason)),
        };
        let receipt = self.wait_for_receipt(hash).await?;
        if !receipt.succeeded() {
            return Err(deploy_error("constructor reverted".into()));
        }
        let address = receipt
            .contract_address
            .ok_or_else(|| deploy_error("receipt has no contract address".into()))?;
        info!(target: "slotbreach::rpc", contract = %artifact.name, %address, "deployed");
        Ok(address)
    }

    async fn read_slot(&self, address: Address, slot: U256) -> Result<Word, TransportError> {
        // Some nodes return unpadded quantities, so decode as a number.
        let value: U256 = self
            .request("eth_getStorageAt", rpc_params![address, slot, "latest"])
            .await?;
        Ok(Word::new(B256::from(value.to_be_bytes::<WORD_BYTES>())))
    }

    async fn submit_call(
        &self,
        address: Address,
        calldata: Bytes,
        sender: Address,
    ) -> Result<CallOutcome, TransportError> {
        let hash = match self.send_transaction(sender, Some(address), calldata).await? {
            Submission::Pending(hash) => hash,
            Submission::Refused(reason) => {
                warn!(target: "slotbreach::rpc", %address, %sender, %reason, "call refused by node");
                return Ok(CallOutcome { success: false, tx_hash: B256::ZERO });
            }
        };
        let receipt = self.wait_for_receipt(hash).await?;
        Ok(CallOutcome { success: receipt.succeeded(), tx_hash: receipt.transaction_hash })
    }

    async fn read_public_field(&self, address: Address, field: &str) -> Result<B256, TransportError> {
        let no_getter = || TransportError::NoGetter { address, field: field.to_string() };
        let call = CallRequest { to: address, data: selectors::getter(field).to_vec().into() };

        let output = match self.client.request::<Bytes, _>("eth_call", rpc_params![call, "latest"]).await {
            Ok(output) => output,
            Err(err) if is_revert(&err) => return Err(no_getter()),
            Err(err) => return Err(map_client_error("eth_call", err)),
        };
        if output.len() < WORD_BYTES {
            return Err(no_getter());
        }
        Ok(B256::from_slice(&output[..WORD_BYTES]))
    }
}
