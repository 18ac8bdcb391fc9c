/*
[INPUT]:  Network names and optional RPC API key
[OUTPUT]: Chain ids and RPC endpoint URLs
[POS]:    Data layer - supported network table
[UPDATE]: When adding networks or rotating RPC endpoints
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MagicError;

/// Networks the adapter knows how to reach.
///
/// Alchemy-backed endpoints interpolate the secondary API key into the URL;
/// the rest are public gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Polygon,
    PolygonAmoy,
    Ethereum,
    EthereumSepolia,
    Etherlink,
    EtherlinkTestnet,
    Zksync,
    ZksyncSepolia,
    Soneium,
}

impl Network {
    /// Numeric chain identifier
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Polygon => 137,
            Network::PolygonAmoy => 80002,
            Network::EthereumSepolia => 11_155_111,
            Network::Zksync => 324,
            Network::ZksyncSepolia => 300,
            Network::Ethereum => 1,
            Network::Etherlink => 42_793,
            Network::EtherlinkTestnet => 128_123,
            Network::Soneium => 1946,
        }
    }

    /// RPC endpoint URL for this network
    pub fn rpc_url(&self, api_key: Option<&str>) -> String {
        let key = api_key.unwrap_or_default();
        match self {
            Network::Polygon => "https://polygon-rpc.com/".to_string(),
            Network::PolygonAmoy => "https://rpc-amoy.polygon.technology/".to_string(),
            Network::EthereumSepolia => {
                format!("https://eth-sepolia.g.alchemy.com/v2/{key}")
            }
            Network::Ethereum => format!("https://eth-mainnet.g.alchemy.com/v2/{key}"),
            Network::Etherlink => "https://node.mainnet.etherlink.com".to_string(),
            Network::EtherlinkTestnet => "https://node.ghostnet.etherlink.com".to_string(),
            Network::Zksync => "https://mainnet.era.zksync.io".to_string(),
            Network::ZksyncSepolia => {
                "https://zksync-era-sepolia.blockpi.network/v1/rpc/public".to_string()
            }
            Network::Soneium => "https://rpc.minato.soneium.org/".to_string(),
        }
    }

    /// Canonical network name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Polygon => "polygon",
            Network::PolygonAmoy => "polygon-amoy",
            Network::Ethereum => "ethereum",
            Network::EthereumSepolia => "ethereum-sepolia",
            Network::Etherlink => "etherlink",
            Network::EtherlinkTestnet => "etherlink-testnet",
            Network::Zksync => "zksync",
            Network::ZksyncSepolia => "zksync-sepolia",
            Network::Soneium => "soneium",
        }
    }
}

impl FromStr for Network {
    type Err = MagicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polygon" => Ok(Network::Polygon),
            "polygon-amoy" => Ok(Network::PolygonAmoy),
            "ethereum" => Ok(Network::Ethereum),
            "ethereum-sepolia" => Ok(Network::EthereumSepolia),
            "etherlink" => Ok(Network::Etherlink),
            "etherlink-testnet" => Ok(Network::EtherlinkTestnet),
            "zksync" => Ok(Network::Zksync),
            "zksync-sepolia" => Ok(Network::ZksyncSepolia),
            "soneium" => Ok(Network::Soneium),
            _ => Err(MagicError::Config("Network not supported".to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ids() {
        assert_eq!(Network::Ethereum.chain_id(), 1);
        assert_eq!(Network::Polygon.chain_id(), 137);
        assert_eq!(Network::EthereumSepolia.chain_id(), 11_155_111);
        assert_eq!(Network::EtherlinkTestnet.chain_id(), 128_123);
    }

    #[test]
    fn test_rpc_url_key_interpolation() {
        let url = Network::EthereumSepolia.rpc_url(Some("abc123"));
        assert_eq!(url, "https://eth-sepolia.g.alchemy.com/v2/abc123");

        // Public gateways ignore the key
        let url = Network::Polygon.rpc_url(Some("abc123"));
        assert_eq!(url, "https://polygon-rpc.com/");
    }

    #[test]
    fn test_unsupported_network_fails() {
        let err = "dogecoin".parse::<Network>().unwrap_err();
        match err {
            MagicError::Config(msg) => assert_eq!(msg, "Network not supported"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_names() {
        for name in [
            "polygon",
            "polygon-amoy",
            "ethereum",
            "ethereum-sepolia",
            "etherlink",
            "etherlink-testnet",
            "zksync",
            "zksync-sepolia",
            "soneium",
        ] {
            let network: Network = name.parse().unwrap();
            assert_eq!(network.as_str(), name);
        }
    }
}
