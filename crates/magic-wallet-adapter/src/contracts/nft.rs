/*
[INPUT]:  NFT collection address and signer
[OUTPUT]: Typed ERC-721 reads, approval writes and transfer filters
[POS]:    Contract layer - NFT collection binding
[UPDATE]: When the collection ABI changes
*/

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, sol};

use crate::error::Result;
use crate::rpc::EthSigner;
use crate::types::{LogFilter, TxReceipt, TxRequest};

sol! {
    function ownerOf(uint256 tokenId) external view returns (address);
    function tokenURI(uint256 tokenId) external view returns (string);
    function name() external view returns (string);
    function symbol() external view returns (string);
    function isApprovedForAll(address owner, address operator) external view returns (bool);
    function setApprovalForAll(address operator, bool approved) external;

    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
}

/// Binding for the fixed NFT collection contract
#[derive(Clone)]
pub struct NftContract {
    address: Address,
    signer: EthSigner,
}

impl NftContract {
    pub fn new(address: Address, signer: EthSigner) -> Self {
        Self { address, signer }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn view(&self, calldata: Vec<u8>) -> Result<Vec<u8>> {
        let tx = TxRequest::call(self.signer.address(), self.address, &calldata);
        self.signer.provider().call(&tx).await
    }

    /// Current owner of a token
    pub async fn owner_of(&self, token_id: U256) -> Result<Address> {
        let data = self.view(ownerOfCall { tokenId: token_id }.abi_encode()).await?;
        Ok(ownerOfCall::abi_decode_returns(&data)?)
    }

    /// Metadata URI of a token
    pub async fn token_uri(&self, token_id: U256) -> Result<String> {
        let data = self.view(tokenURICall { tokenId: token_id }.abi_encode()).await?;
        Ok(tokenURICall::abi_decode_returns(&data)?)
    }

    /// Collection name
    pub async fn name(&self) -> Result<String> {
        let data = self.view(nameCall {}.abi_encode()).await?;
        Ok(nameCall::abi_decode_returns(&data)?)
    }

    /// Collection symbol
    pub async fn symbol(&self) -> Result<String> {
        let data = self.view(symbolCall {}.abi_encode()).await?;
        Ok(symbolCall::abi_decode_returns(&data)?)
    }

    /// Whether `operator` may move every token owned by `owner`
    pub async fn is_approved_for_all(&self, owner: Address, operator: Address) -> Result<bool> {
        let calldata = isApprovedForAllCall { owner, operator }.abi_encode();
        let data = self.view(calldata).await?;
        Ok(isApprovedForAllCall::abi_decode_returns(&data)?)
    }

    /// Grant or revoke collection-wide approval for `operator`
    pub async fn set_approval_for_all(
        &self,
        operator: Address,
        approved: bool,
    ) -> Result<TxReceipt> {
        let calldata = setApprovalForAllCall { operator, approved }.abi_encode();
        let tx = TxRequest::call(self.signer.address(), self.address, &calldata);
        self.signer.send_and_confirm(tx).await
    }

    /// Filter over `Transfer` events; `None` positions match any address
    pub fn transfer_filter(&self, from: Option<Address>, to: Option<Address>) -> LogFilter {
        LogFilter::over_contract(
            self.address,
            vec![
                Some(Transfer::SIGNATURE_HASH),
                from.map(address_topic),
                to.map(address_topic),
            ],
        )
    }
}

pub(crate) fn address_topic(address: Address) -> B256 {
    address.into_word()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_of_selector() {
        // keccak256("ownerOf(uint256)")[..4] == 0x6352211e
        let calldata = ownerOfCall { tokenId: U256::from(1u64) }.abi_encode();
        assert_eq!(&calldata[..4], &[0x63, 0x52, 0x21, 0x1e]);
        assert_eq!(calldata.len(), 4 + 32);
    }

    #[test]
    fn test_transfer_topic_positions() {
        let nft: Address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            .parse()
            .unwrap();
        let me: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            .parse()
            .unwrap();
        let signer = EthSigner::new(
            crate::rpc::EthProvider::new(std::sync::Arc::new(
                crate::provider::StaticRpcTransport::new(),
            )),
            me,
        );
        let contract = NftContract::new(nft, signer);

        let received = contract.transfer_filter(None, Some(me));
        assert_eq!(received.topics.len(), 3);
        assert_eq!(
            received.topics[0].as_deref(),
            Some(Transfer::SIGNATURE_HASH.to_string().as_str())
        );
        assert!(received.topics[1].is_none());
        assert!(received.topics[2].as_deref().unwrap().ends_with(
            "f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        ));
    }
}
