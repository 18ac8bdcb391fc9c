/*
[INPUT]:  Base64-encoded DID session tokens
[OUTPUT]: Decoded claim payloads
[POS]:    Provider layer - session token inspection
[UPDATE]: When the provider changes its token envelope
*/

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::error::{MagicError, Result};

/// Claim half of a DID token.
///
/// The token is a base64-encoded JSON tuple `[proof, claim]` where the claim
/// itself is a JSON string. Only the claim is of interest here; the proof is
/// verified server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DidClaim {
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub ext: i64,
    /// Issuer DID (`did:ethr:0x...`)
    pub iss: String,
    /// Subject identifier
    pub sub: String,
    /// Audience (client id)
    pub aud: String,
    /// Not-before, unix seconds
    pub nbf: i64,
    /// Token id
    pub tid: String,
    /// Optional attachment
    #[serde(default)]
    pub add: Option<String>,
}

impl DidClaim {
    /// Wallet address extracted from an `did:ethr` issuer, if present
    pub fn issuer_address(&self) -> Option<&str> {
        self.iss.rsplit(':').next().filter(|s| s.starts_with("0x"))
    }
}

/// Decode the claim out of a DID session token.
pub fn decode_did_claim(token: &str) -> Result<DidClaim> {
    let token = token.trim();
    let bytes = STANDARD
        .decode(token)
        .or_else(|_| URL_SAFE.decode(token))
        .or_else(|_| URL_SAFE_NO_PAD.decode(token))
        .map_err(|e| MagicError::InvalidResponse(format!("DID token is not valid base64: {e}")))?;

    let (_proof, claim_json): (String, String) = serde_json::from_slice(&bytes)
        .map_err(|e| MagicError::InvalidResponse(format!("DID token envelope malformed: {e}")))?;

    let claim: DidClaim = serde_json::from_str(&claim_json)
        .map_err(|e| MagicError::InvalidResponse(format!("DID claim malformed: {e}")))?;

    Ok(claim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(claim: &serde_json::Value) -> String {
        let claim_json = serde_json::to_string(claim).unwrap();
        let envelope = serde_json::to_vec(&("0xproof".to_string(), claim_json)).unwrap();
        STANDARD.encode(envelope)
    }

    #[test]
    fn test_decode_did_claim() {
        let token = make_token(&serde_json::json!({
            "iat": 1_700_000_000,
            "ext": 1_700_000_900,
            "iss": "did:ethr:0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "sub": "subject-id",
            "aud": "client-id",
            "nbf": 1_700_000_000,
            "tid": "token-id"
        }));

        let claim = decode_did_claim(&token).unwrap();
        assert_eq!(claim.ext - claim.iat, 900);
        assert_eq!(
            claim.issuer_address(),
            Some("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_did_claim("not base64 at all!!!").is_err());

        let not_a_tuple = STANDARD.encode(b"{\"iat\": 1}");
        assert!(decode_did_claim(&not_a_tuple).is_err());
    }
}
