/*
[INPUT]:  A connected wallet session
[OUTPUT]: Console walkthrough of balance, transfer pricing and marketplace calls
[POS]:    Examples - chain operations demonstration
[UPDATE]: When wallet operation signatures change
*/

use std::sync::Arc;

use alloy_primitives::U256;
use magic_wallet_adapter::*;

/// Example: Chain operations over a logged-in wallet
///
/// This example demonstrates the wallet surface once a login exists:
/// 1. Derive the chain connection
/// 2. Read the native balance
/// 3. Price a transfer without sending it
/// 4. Query marketplace history
#[tokio::main]
async fn main() {
    println!("=== Magic Wallet Chain Example ===\n");

    // Canned node responses keep the example self-contained; a real
    // deployment routes through the provider's signing transport.
    let transport = StaticRpcTransport::new();
    transport.insert(
        "eth_accounts",
        serde_json::json!(["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"]),
    );
    transport.insert("eth_getBalance", serde_json::json!("0x1bc16d674ec80000"));
    transport.insert("eth_gasPrice", serde_json::json!("0x3b9aca00"));
    transport.insert("eth_estimateGas", serde_json::json!("0x5208"));
    transport.insert("eth_getLogs", serde_json::json!([]));

    let config = MagicConfig::new("pk_live_YOUR_KEY", Network::Polygon);
    let nft = NftInfo {
        name: "Demo Collection".to_string(),
        address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap(),
    };
    let market = MarketplaceInfo {
        name: "Demo Marketplace".to_string(),
        address: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".parse().unwrap(),
    };

    let wallet = MagicWallet::initialize(config, nft, market, move |_| {
        Ok(Arc::new(
            MockMagicProvider::new("123456", "demo-did-token")
                .with_transport(Arc::new(transport))
                .with_logged_in(true),
        ) as Arc<dyn MagicProvider>)
    });
    let chain = wallet.chain();

    let connection = match chain.connect().await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("✗ Connection failed: {}", e);
            return;
        }
    };
    println!("✓ Connected as {}", connection.address());

    match chain.eth_balance().await {
        Ok(balance) => println!("✓ Balance: {} ETH", balance.balance_eth),
        Err(e) => eprintln!("✗ Balance read failed: {}", e),
    }

    match chain
        .estimate_transfer("0x70997970C51812dc3A010C7d01b50e0d17dc79C8", "0.1")
        .await
    {
        Ok(estimate) => println!(
            "✓ Transfer estimate: gas {} at {} wei/gas",
            estimate.gas_limit, estimate.gas_price
        ),
        Err(e) => eprintln!("✗ Estimate failed: {}", e),
    }

    match chain.history().await {
        Ok(report) => println!(
            "✓ History: {} received, {} sent, {} listed",
            report.received.len(),
            report.sent.len(),
            report.listed.len()
        ),
        Err(e) => eprintln!("✗ History failed: {}", e),
    }

    // Listing needs approval and a live marketplace; shown here for shape only
    let props = ListNftProps {
        token_sell: None,
        token_id: U256::from(7u64),
        amount: U256::from(1u64),
        price: "0.5".to_string(),
        private_buyers: vec![],
    };
    println!(
        "\nNote: list with chain.list_nft(props, TxOverrides::default()) once connected to a real node"
    );
    println!("  (would list token {} for {} ETH)", props.token_id, props.price);
}
