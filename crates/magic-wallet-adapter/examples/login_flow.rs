/*
[INPUT]:  An identity provider and an email address
[OUTPUT]: Console walkthrough of the email-OTP login flow
[POS]:    Examples - login flow demonstration
[UPDATE]: When the login surface changes
*/

use std::sync::Arc;

use magic_wallet_adapter::*;

/// Example: Email-OTP login flow
///
/// This example demonstrates the complete login cycle:
/// 1. Assemble the wallet over an identity provider
/// 2. Start an email-OTP login and watch its events
/// 3. Submit the code the user received
/// 4. Inspect the session and log out
#[tokio::main]
async fn main() {
    println!("=== Magic Wallet Login Example ===\n");

    let config = MagicConfig::new("pk_live_YOUR_KEY", Network::EthereumSepolia);
    let nft = NftInfo {
        name: "Demo Collection".to_string(),
        address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap(),
    };
    let market = MarketplaceInfo {
        name: "Demo Marketplace".to_string(),
        address: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".parse().unwrap(),
    };

    // The mock provider stands in for a real Magic integration here; a real
    // deployment implements MagicProvider over the hosted SDK bridge.
    let wallet = MagicWallet::initialize(config, nft, market, |resolved| {
        println!("✓ Provider created for {} (chain id {})", resolved.network, resolved.chain_id);
        Ok(Arc::new(MockMagicProvider::new("123456", "demo-did-token")) as Arc<dyn MagicProvider>)
    });

    let chain = Arc::clone(wallet.chain());
    let login = {
        let chain = Arc::clone(&chain);
        tokio::spawn(async move {
            chain
                .login_magic("user@example.com", |event| match event {
                    LoginEvent::OtpSent => println!("✓ OTP sent, check your inbox"),
                    LoginEvent::InvalidOtp => println!("✗ Wrong code, try again"),
                    LoginEvent::Done(_) => println!("✓ Login settled"),
                    LoginEvent::Error(reason) => eprintln!("✗ Login failed: {}", reason),
                    other => println!("  event: {:?}", other),
                })
                .await
        })
    };

    // Give the provider a moment to dispatch the code, then submit it.
    // A real application reads this from user input.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    match chain.verify_otp_magic("123456").await {
        VerifySubmission::Accepted => println!("✓ Code submitted"),
        VerifySubmission::Rejected { reason, .. } => {
            eprintln!("✗ Code rejected locally: {:?}", reason);
            return;
        }
    }

    match login.await.expect("login task") {
        Some(token) => println!("✓ Logged in, token: {}...", &token[..token.len().min(16)]),
        None => {
            eprintln!("✗ Login did not produce a token");
            return;
        }
    }

    if let Some(metadata) = wallet.identity().user_metadata().await {
        println!("  email on file: {:?}", metadata.email);
    }

    chain.logout_magic().await;
    println!("✓ Logged out, status: {:?}", wallet.identity().login_status());
}
