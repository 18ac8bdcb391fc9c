/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Magic wallet adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod contracts;
pub mod error;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod types;

// Re-export error types
pub use error::{MagicError, Result};

// Re-export the provider seam
pub use provider::{
    DidClaim,
    FlowController,
    LoginFlow,
    MagicProvider,
    MockMagicProvider,
    StaticRpcTransport,
    decode_did_claim,
};

// Re-export the RPC layer
pub use rpc::{EthProvider, EthSigner, HttpRpcTransport, RpcTransport};

// Re-export session state machines
pub use session::{
    CachedSession,
    ChainConnection,
    ChainSession,
    IdentitySession,
    MagicWallet,
    SessionCache,
    StatusPoll,
};

// Re-export contract bindings
pub use contracts::{MarketContract, NftContract};

// Re-export all types
pub use types::*;
