/*
[INPUT]:  An RPC transport
[OUTPUT]: Typed eth_* query and submission helpers
[POS]:    RPC layer - node method wrappers
[UPDATE]: When adding new eth_* methods or changing polling behavior
*/

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{MagicError, Result};
use crate::rpc::quantity;
use crate::rpc::transport::RpcTransport;
use crate::types::{FeeData, LogEntry, LogFilter, TxReceipt, TxRequest};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// Network connection derived from a raw transport
#[derive(Clone)]
pub struct EthProvider {
    transport: Arc<dyn RpcTransport>,
}

impl EthProvider {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> Arc<dyn RpcTransport> {
        Arc::clone(&self.transport)
    }

    /// Accounts controlled by the transport's signer
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let value = self.transport.request("eth_accounts", json!([])).await?;
        let entries = value
            .as_array()
            .ok_or_else(|| MagicError::InvalidResponse("eth_accounts: not an array".to_string()))?;

        entries
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .and_then(|s| s.parse::<Address>().ok())
                    .ok_or_else(|| {
                        MagicError::InvalidResponse(format!("eth_accounts: bad entry {entry}"))
                    })
            })
            .collect()
    }

    /// Native balance in wei at the latest block
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        let value = self
            .transport
            .request("eth_getBalance", json!([address.to_string(), "latest"]))
            .await?;
        quantity_from(&value)
    }

    /// Gas limit estimate for the given transaction
    pub async fn estimate_gas(&self, tx: &TxRequest) -> Result<U256> {
        let value = self
            .transport
            .request("eth_estimateGas", json!([tx]))
            .await?;
        quantity_from(&value)
    }

    /// Current gas price
    pub async fn gas_price(&self) -> Result<U256> {
        let value = self.transport.request("eth_gasPrice", json!([])).await?;
        quantity_from(&value)
    }

    /// Current fee information. The gas price comes from `eth_gasPrice`;
    /// the priority fee is best-effort and absent on nodes without EIP-1559.
    pub async fn fee_data(&self) -> Result<FeeData> {
        let gas_price = match self.transport.request("eth_gasPrice", json!([])).await {
            Ok(value) => quantity_from(&value).ok(),
            Err(_) => None,
        };

        let max_priority_fee_per_gas = match self
            .transport
            .request("eth_maxPriorityFeePerGas", json!([]))
            .await
        {
            Ok(value) => quantity_from(&value).ok(),
            Err(_) => None,
        };

        Ok(FeeData {
            gas_price,
            max_priority_fee_per_gas,
        })
    }

    /// Read-only contract call at the latest block, returning raw bytes
    pub async fn call(&self, tx: &TxRequest) -> Result<Vec<u8>> {
        let value = self
            .transport
            .request("eth_call", json!([tx, "latest"]))
            .await?;
        bytes_from(&value)
    }

    /// Submit a transaction through the transport's signer; resolves to the
    /// transaction hash
    pub async fn send_transaction(&self, tx: &TxRequest) -> Result<String> {
        let value = self
            .transport
            .request("eth_sendTransaction", json!([tx]))
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MagicError::InvalidResponse("eth_sendTransaction: not a hash".to_string()))
    }

    /// Receipt for a mined transaction, `None` while pending
    pub async fn transaction_receipt(&self, hash: &str) -> Result<Option<TxReceipt>> {
        let value = self
            .transport
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Poll until the transaction is mined (one confirmation)
    pub async fn wait_for_receipt(&self, hash: &str) -> Result<TxReceipt> {
        self.wait_for_receipt_with(hash, RECEIPT_POLL_INTERVAL, RECEIPT_POLL_ATTEMPTS)
            .await
    }

    /// Poll for a receipt with explicit pacing
    pub async fn wait_for_receipt_with(
        &self,
        hash: &str,
        interval: Duration,
        attempts: u32,
    ) -> Result<TxReceipt> {
        for attempt in 0..attempts {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                debug!(hash, attempt, "transaction mined");
                return Ok(receipt);
            }
            tokio::time::sleep(interval).await;
        }
        Err(MagicError::Timeout {
            duration: (interval * attempts).as_secs(),
        })
    }

    /// Past events matching the filter
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let value = self.transport.request("eth_getLogs", json!([filter])).await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn quantity_from(value: &Value) -> Result<U256> {
    let text = value
        .as_str()
        .ok_or_else(|| MagicError::InvalidResponse(format!("expected quantity, got {value}")))?;
    quantity::decode(text)
}

fn bytes_from(value: &Value) -> Result<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| MagicError::InvalidResponse(format!("expected data, got {value}")))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| MagicError::InvalidResponse(format!("bad hex data: {e}")))
}
