/*
[INPUT]:  RPC endpoint URL and timeout configuration
[OUTPUT]: JSON-RPC request/response exchange
[POS]:    RPC layer - transport implementation
[UPDATE]: When adding connection options or changing envelope handling
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{MagicError, Result};

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Raw JSON-RPC transport.
///
/// Implemented over HTTP here; identity providers supply their own
/// transport that relays signing-capable methods to the provider backend.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Issue one JSON-RPC call and return its `result` member
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC 2.0 transport with incrementing request ids
#[derive(Debug)]
pub struct HttpRpcTransport {
    http_client: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl HttpRpcTransport {
    /// Create a transport with default configuration
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, TransportConfig::default())
    }

    /// Create a transport with custom timeouts
    pub fn with_config(endpoint: &str, config: TransportConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: Url::parse(endpoint)?,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "rpc request");
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let envelope: RpcEnvelope = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(MagicError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| MagicError::InvalidResponse("missing result member".to_string()))
    }
}
