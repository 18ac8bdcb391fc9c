/*
[INPUT]:  Configuration values and chain query results
[OUTPUT]: Typed models exposed on the public session surface
[POS]:    Data layer - session-facing model definitions
[UPDATE]: When the public surface grows new result shapes
*/

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::types::chain::LogEntry;
use crate::types::network::Network;

/// Identity provider configuration. `rpc_api_key` is the secondary key some
/// networks interpolate into their RPC endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicConfig {
    pub api_key: String,
    pub network: Network,
    pub rpc_api_key: Option<String>,
}

impl MagicConfig {
    pub fn new(api_key: impl Into<String>, network: Network) -> Self {
        Self {
            api_key: api_key.into(),
            network,
            rpc_api_key: None,
        }
    }

    pub fn with_rpc_api_key(mut self, key: impl Into<String>) -> Self {
        self.rpc_api_key = Some(key.into());
        self
    }
}

/// Network parameters resolved from a [`MagicConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNetwork {
    pub network: Network,
    pub chain_id: u64,
    pub rpc_url: String,
}

impl ResolvedNetwork {
    pub fn resolve(config: &MagicConfig) -> Self {
        Self {
            network: config.network,
            chain_id: config.network.chain_id(),
            rpc_url: config.network.rpc_url(config.rpc_api_key.as_deref()),
        }
    }
}

/// Deployed NFT collection the adapter binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftInfo {
    pub name: String,
    pub address: Address,
}

/// Deployed marketplace the adapter binds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceInfo {
    pub name: String,
    pub address: Address,
}

/// Profile attached to the logged-in identity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub public_address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub wallet_type: Option<String>,
}

/// Native balance of the connected wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthBalance {
    pub address: Address,
    /// Human-readable decimal ether string
    pub balance_eth: String,
}

/// Gas/price/value estimate for a plain transfer, all fixed-point integers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferEstimate {
    pub gas_limit: U256,
    pub gas_price: U256,
    pub value: U256,
}

/// On-chain token details with optionally dereferenced metadata
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NftDetails {
    pub token_id: U256,
    pub owner: Address,
    pub collection_name: String,
    pub collection_symbol: String,
    pub token_uri: String,
    pub metadata: Option<serde_json::Value>,
}

/// Parameters for listing a token on the marketplace.
///
/// `token_sell` defaults to the zero address (sale for native currency);
/// `price` is a decimal ether string converted to wei at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNftProps {
    pub token_sell: Option<Address>,
    pub token_id: U256,
    pub amount: U256,
    pub price: String,
    pub private_buyers: Vec<Address>,
}

/// Optional gas overrides for marketplace writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOverrides {
    pub gas_limit: Option<U256>,
    pub gas_price: Option<U256>,
    pub value: Option<U256>,
}

/// Past activity of the connected address across both contracts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryReport {
    pub received: Vec<LogEntry>,
    pub sent: Vec<LogEntry>,
    pub listed: Vec<LogEntry>,
    pub bought: Vec<LogEntry>,
    pub delisted: Vec<LogEntry>,
}
