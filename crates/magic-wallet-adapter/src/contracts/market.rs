/*
[INPUT]:  Marketplace address, signer and listing parameters
[OUTPUT]: Listing writes and marketplace event filters
[POS]:    Contract layer - marketplace binding
[UPDATE]: When the marketplace ABI changes
*/

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolEvent, sol};
use tracing::debug;

use crate::contracts::nft::address_topic;
use crate::error::Result;
use crate::rpc::EthSigner;
use crate::types::{LogFilter, TxOverrides, TxReceipt, TxRequest};

sol! {
    function listToken(
        address nft,
        address tokenSell,
        uint256 tokenId,
        uint256 amount,
        uint256 price,
        address[] privateBuyer
    ) external;

    event TokenListed(address indexed nft, uint256 indexed tokenId, address indexed seller, uint256 amount, uint256 price);
    event TokenSold(address indexed nft, uint256 indexed tokenId, address indexed buyer, uint256 amount, uint256 price);
    event ListingDeleted(address indexed nft, uint256 indexed tokenId);
}

/// Binding for the fixed marketplace contract
#[derive(Clone)]
pub struct MarketContract {
    address: Address,
    signer: EthSigner,
}

impl MarketContract {
    pub fn new(address: Address, signer: EthSigner) -> Self {
        Self { address, signer }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// List a token for sale. `price` is already in wei; `token_sell` is the
    /// currency contract, zero address for the native coin.
    pub async fn list_token(
        &self,
        nft: Address,
        token_sell: Address,
        token_id: U256,
        amount: U256,
        price: U256,
        private_buyers: Vec<Address>,
        overrides: TxOverrides,
    ) -> Result<TxReceipt> {
        let calldata = listTokenCall {
            nft,
            tokenSell: token_sell,
            tokenId: token_id,
            amount,
            price,
            privateBuyer: private_buyers,
        }
        .abi_encode();

        debug!(
            nft = %nft,
            token_id = %token_id,
            price = %price,
            "listing token on marketplace"
        );

        let mut tx = TxRequest::call(self.signer.address(), self.address, &calldata);
        if let Some(gas_limit) = overrides.gas_limit {
            tx = tx.with_gas_limit(gas_limit);
        }
        if let Some(gas_price) = overrides.gas_price {
            tx = tx.with_gas_price(gas_price);
        }
        if let Some(value) = overrides.value {
            tx = tx.with_value(value);
        }

        self.signer.send_and_confirm(tx).await
    }

    /// Filter over `TokenListed` events for one seller
    pub fn listed_filter(&self, seller: Address) -> LogFilter {
        LogFilter::over_contract(
            self.address,
            vec![
                Some(TokenListed::SIGNATURE_HASH),
                None,
                None,
                Some(address_topic(seller)),
            ],
        )
    }

    /// Filter over `TokenSold` events for one buyer
    pub fn sold_filter(&self, buyer: Address) -> LogFilter {
        LogFilter::over_contract(
            self.address,
            vec![
                Some(TokenSold::SIGNATURE_HASH),
                None,
                None,
                Some(address_topic(buyer)),
            ],
        )
    }

    /// Filter over every `ListingDeleted` event
    pub fn delisted_filter(&self) -> LogFilter {
        LogFilter::over_contract(self.address, vec![Some(ListingDeleted::SIGNATURE_HASH)])
    }
}
