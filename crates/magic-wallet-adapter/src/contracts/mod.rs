/*
[INPUT]:  Contract addresses and a signing handle
[OUTPUT]: Typed bindings for the two deployed contracts
[POS]:    Contract layer - ABI-bound call surface
[UPDATE]: When contract ABIs change
*/

pub mod market;
pub mod nft;

pub use market::MarketContract;
pub use nft::NftContract;
