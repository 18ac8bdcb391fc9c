/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for magic-wallet-adapter tests

use alloy_primitives::address;
use magic_wallet_adapter::{MagicConfig, MarketplaceInfo, Network, NftInfo, SessionCache};
use serde_json::Value;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock JSON-RPC server for testing
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mount a canned JSON-RPC result for one method
#[allow(dead_code)]
pub async fn mount_rpc_result(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(serde_json::json!({ "method": rpc_method })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result,
        })))
        .mount(server)
        .await;
}

/// Mount a canned JSON-RPC error for one method
#[allow(dead_code)]
pub async fn mount_rpc_error(server: &MockServer, rpc_method: &str, code: i64, message: &str) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(serde_json::json!({ "method": rpc_method })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message },
        })))
        .mount(server)
        .await;
}

/// Test configuration with a placeholder publishable key
pub fn test_config() -> MagicConfig {
    MagicConfig::new("pk_live_TEST", Network::EthereumSepolia)
}

/// Deployed-contract fixtures
pub fn test_contracts() -> (NftInfo, MarketplaceInfo) {
    (
        NftInfo {
            name: "Test Collection".to_string(),
            address: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
        },
        MarketplaceInfo {
            name: "Test Marketplace".to_string(),
            address: address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
        },
    )
}

/// Session cache rooted in a unique temp directory
pub fn temp_cache() -> SessionCache {
    SessionCache::at(
        std::env::temp_dir()
            .join(format!("magic-wallet-tests-{}", uuid::Uuid::new_v4()))
            .join("session.json"),
    )
}

/// Wallet address the mock transports report for `eth_accounts`
pub const TEST_WALLET: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
