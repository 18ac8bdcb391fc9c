/*
[INPUT]:  JSON-RPC transports and hex quantity strings
[OUTPUT]: Typed chain access (provider, signer, quantity codec)
[POS]:    RPC layer - node communication
[UPDATE]: When adding RPC methods or changing transport behavior
*/

pub mod provider;
pub mod signer;
pub mod transport;

pub use provider::EthProvider;
pub use signer::EthSigner;
pub use transport::{HttpRpcTransport, RpcTransport};

/// Hex quantity codec for JSON-RPC (`0x0`, `0x5208`, never zero-padded).
pub mod quantity {
    use alloy_primitives::U256;

    use crate::error::{MagicError, Result};

    pub fn encode(value: U256) -> String {
        if value.is_zero() {
            return "0x0".to_string();
        }
        let bytes = value.to_be_bytes::<32>();
        let full = hex::encode(bytes);
        format!("0x{}", full.trim_start_matches('0'))
    }

    pub fn decode(text: &str) -> Result<U256> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }
        U256::from_str_radix(digits, 16)
            .map_err(|e| MagicError::InvalidResponse(format!("bad quantity {text:?}: {e}")))
    }

}
