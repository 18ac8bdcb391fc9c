/*
[INPUT]:  Error sources (HTTP, JSON-RPC, serialization, validation, provider)
[OUTPUT]: Structured error types with context
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the Magic wallet adapter
#[derive(Error, Debug)]
pub enum MagicError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON-RPC node returned an error response
    #[error("RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// ABI encode/decode failed
    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    /// Configuration error (unsupported network, missing key, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identity handle was never created
    #[error("Magic not initialized")]
    NotInitialized,

    /// Chain-mutating call issued without an active signer
    #[error("No signer available. Please login first.")]
    NoSigner,

    /// Recipient address failed syntactic validation
    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    /// Amount is not a finite positive decimal
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Unit name is not in the denomination table
    #[error("Wrong Unit")]
    WrongUnit,

    /// Response shape did not match expectations
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Identity provider call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Gave up waiting on the chain
    #[error("Timed out after {duration}s")]
    Timeout { duration: u64 },
}

impl MagicError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MagicError::Http(_)
                | MagicError::Rpc { .. }
                | MagicError::Timeout { .. }
                | MagicError::InvalidResponse(_)
        )
    }

    /// Check if the error is a caller precondition failure, rejected before
    /// any network traffic
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MagicError::NotInitialized
                | MagicError::NoSigner
                | MagicError::InvalidAddress(_)
                | MagicError::InvalidAmount(_)
                | MagicError::WrongUnit
                | MagicError::Config(_)
        )
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, MagicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let rpc_err = MagicError::Rpc {
            code: -32000,
            message: "header not found".to_string(),
        };
        assert!(rpc_err.is_retryable());
        assert!(!MagicError::NoSigner.is_retryable());
    }

    #[test]
    fn test_error_precondition() {
        assert!(MagicError::NoSigner.is_precondition());
        assert!(MagicError::WrongUnit.is_precondition());
        assert!(MagicError::InvalidAddress("not-an-address".to_string()).is_precondition());
        assert!(!MagicError::Timeout { duration: 120 }.is_precondition());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(MagicError::NotInitialized.to_string(), "Magic not initialized");
        assert_eq!(
            MagicError::NoSigner.to_string(),
            "No signer available. Please login first."
        );
        assert_eq!(MagicError::WrongUnit.to_string(), "Wrong Unit");
    }
}
