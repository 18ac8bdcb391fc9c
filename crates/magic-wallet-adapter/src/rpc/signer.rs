/*
[INPUT]:  A network connection and the wallet address it controls
[OUTPUT]: Transaction submission on behalf of the logged-in identity
[POS]:    RPC layer - provider-backed signing handle
[UPDATE]: When transaction submission semantics change
*/

use alloy_primitives::{Address, U256};
use tracing::info;

use crate::error::Result;
use crate::rpc::provider::EthProvider;
use crate::types::{TxReceipt, TxRequest};

/// Signing handle for the logged-in identity's wallet.
///
/// No key material lives here: the identity provider signs off-device, so
/// submission is `eth_sendTransaction` through the provider's transport
/// with `from` pinned to the wallet address.
#[derive(Clone)]
pub struct EthSigner {
    provider: EthProvider,
    address: Address,
}

impl EthSigner {
    pub fn new(provider: EthProvider, address: Address) -> Self {
        Self { provider, address }
    }

    /// Wallet address this signer submits from
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &EthProvider {
        &self.provider
    }

    /// Native balance of the signer's wallet in wei
    pub async fn balance(&self) -> Result<U256> {
        self.provider.get_balance(self.address).await
    }

    /// Submit a transaction from this wallet; resolves to the hash
    pub async fn send_transaction(&self, mut tx: TxRequest) -> Result<String> {
        tx.from = Some(self.address.to_string());
        let hash = self.provider.send_transaction(&tx).await?;
        info!(hash = %hash, from = %self.address, "transaction submitted");
        Ok(hash)
    }

    /// Submit and wait for one confirmation
    pub async fn send_and_confirm(&self, tx: TxRequest) -> Result<TxReceipt> {
        let hash = self.send_transaction(tx).await?;
        self.provider.wait_for_receipt(&hash).await
    }
}
