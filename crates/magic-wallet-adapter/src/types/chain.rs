/*
[INPUT]:  JSON-RPC wire payloads
[OUTPUT]: Typed transaction, receipt, fee and log structures
[POS]:    Data layer - chain wire types
[UPDATE]: When RPC payload shapes change
*/

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::rpc::quantity;

/// Transaction request as submitted to `eth_sendTransaction` /
/// `eth_estimateGas`. Quantities travel as 0x-prefixed minimal hex.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl TxRequest {
    /// Plain value transfer
    pub fn transfer(from: Address, to: Address, value: U256) -> Self {
        Self {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            value: Some(quantity::encode(value)),
            ..Self::default()
        }
    }

    /// Contract call carrying ABI-encoded calldata
    pub fn call(from: Address, to: Address, calldata: &[u8]) -> Self {
        Self {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            data: Some(format!("0x{}", hex::encode(calldata))),
            ..Self::default()
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas = Some(quantity::encode(gas_limit));
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(quantity::encode(gas_price));
        self
    }

    pub fn with_gas(self, gas_limit: U256, gas_price: U256) -> Self {
        self.with_gas_limit(gas_limit).with_gas_price(gas_price)
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(quantity::encode(value));
        self
    }
}

/// Mined transaction receipt. Quantity fields stay in wire form; accessors
/// decode on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub effective_gas_price: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl TxReceipt {
    /// True when the transaction executed successfully
    pub fn status_ok(&self) -> bool {
        matches!(self.status.as_deref(), Some("0x1"))
    }

    pub fn gas_used(&self) -> Option<U256> {
        quantity::decode(self.gas_used.as_deref()?).ok()
    }

    pub fn effective_gas_price(&self) -> Option<U256> {
        quantity::decode(self.effective_gas_price.as_deref()?).ok()
    }

    /// Fee paid in wei, when the node reported both factors
    pub fn fee_paid(&self) -> Option<U256> {
        Some(self.gas_used()? * self.effective_gas_price()?)
    }
}

/// Current fee information. `gas_price` mirrors `eth_gasPrice`; the priority
/// fee is populated only on networks that answer `eth_maxPriorityFeePerGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeData {
    pub gas_price: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

/// `eth_getLogs` filter. `None` topic positions match anything.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub from_block: String,
    pub to_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub topics: Vec<Option<String>>,
}

impl LogFilter {
    /// Full-range filter for one contract with the given topic positions
    pub fn over_contract(address: Address, topics: Vec<Option<B256>>) -> Self {
        Self {
            from_block: "0x0".to_string(),
            to_block: "latest".to_string(),
            address: Some(address.to_string()),
            topics: topics
                .into_iter()
                .map(|t| t.map(|h| h.to_string()))
                .collect(),
        }
    }
}

/// One emitted event entry as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_tx_request_serializes_camel_case() {
        let from = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let to = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let tx = TxRequest::transfer(from, to, U256::from(1_000_000u64))
            .with_gas(U256::from(21_000u64), U256::from(5u64));

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["gas"], "0x5208");
        assert_eq!(json["gasPrice"], "0x5");
        assert_eq!(json["value"], "0xf4240");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_receipt_status_and_fee() {
        let receipt: TxReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0xabc",
            "status": "0x1",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x2"
        }))
        .unwrap();

        assert!(receipt.status_ok());
        assert_eq!(receipt.fee_paid(), Some(U256::from(42_000u64)));

        let failed: TxReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0xdef",
            "status": "0x0"
        }))
        .unwrap();
        assert!(!failed.status_ok());
        assert_eq!(failed.fee_paid(), None);
    }

    #[test]
    fn test_log_filter_topics() {
        let addr = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let filter = LogFilter::over_contract(addr, vec![Some(B256::ZERO), None]);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["fromBlock"], "0x0");
        assert_eq!(json["toBlock"], "latest");
        assert_eq!(json["topics"][1], serde_json::Value::Null);
    }
}
