/*
[INPUT]:  Schema definitions and serde requirements
[OUTPUT]: Typed models, enums and outcome vocabularies
[POS]:    Data layer - type definitions for the public surface
[UPDATE]: When schemas change or new types are added
*/

pub mod chain;
pub mod events;
pub mod models;
pub mod network;
pub mod units;

pub use chain::{FeeData, LogEntry, LogFilter, TxReceipt, TxRequest};
pub use events::{
    CancelOutcome,
    FlowCommand,
    LoginEvent,
    LoginStatus,
    VerifyRejectReason,
    VerifySubmission,
};
pub use models::{
    EthBalance,
    HistoryReport,
    ListNftProps,
    MagicConfig,
    MarketplaceInfo,
    NftDetails,
    NftInfo,
    ResolvedNetwork,
    TransferEstimate,
    TxOverrides,
    UserMetadata,
};
pub use network::Network;
pub use units::{EthUnit, convert_balance};
