/*
[INPUT]:  Provider handles, chain transports and persisted hints
[OUTPUT]: Owned session state machines and the wallet facade
[POS]:    Session layer - adapter state and public operation surface
[UPDATE]: When session composition changes
*/

pub mod cache;
pub mod chain;
pub mod identity;
pub mod wallet;

pub use cache::{CachedSession, SessionCache};
pub use chain::{ChainConnection, ChainSession};
pub use identity::IdentitySession;
pub use wallet::{MagicWallet, StatusPoll};
