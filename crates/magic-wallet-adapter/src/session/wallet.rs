/*
[INPUT]:  Configuration, contract info and a provider constructor
[OUTPUT]: Assembled wallet facade with optional status polling
[POS]:    Session layer - top-level entry point
[UPDATE]: When the assembly or polling surface changes
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;
use crate::provider::MagicProvider;
use crate::session::cache::SessionCache;
use crate::session::chain::ChainSession;
use crate::session::identity::IdentitySession;
use crate::types::{LoginStatus, MagicConfig, MarketplaceInfo, NftInfo, ResolvedNetwork};

/// Assembled wallet: one identity session and one chain session over it.
///
/// The provider constructor runs once during assembly; a failing
/// constructor or missing API key yields a wallet that answers everything
/// in logged-out mode instead of failing construction.
pub struct MagicWallet {
    identity: Arc<IdentitySession>,
    chain: Arc<ChainSession>,
}

impl MagicWallet {
    pub fn initialize<F>(
        config: MagicConfig,
        nft: NftInfo,
        market: MarketplaceInfo,
        make_provider: F,
    ) -> Self
    where
        F: FnOnce(&ResolvedNetwork) -> Result<Arc<dyn MagicProvider>>,
    {
        Self::initialize_with_cache(config, nft, market, SessionCache::new(), make_provider)
    }

    pub fn initialize_with_cache<F>(
        config: MagicConfig,
        nft: NftInfo,
        market: MarketplaceInfo,
        cache: SessionCache,
        make_provider: F,
    ) -> Self
    where
        F: FnOnce(&ResolvedNetwork) -> Result<Arc<dyn MagicProvider>>,
    {
        let identity = Arc::new(IdentitySession::new());
        identity.initialize(config, make_provider);
        let chain = Arc::new(ChainSession::with_cache(
            Arc::clone(&identity),
            nft,
            market,
            cache,
        ));
        Self { identity, chain }
    }

    pub fn identity(&self) -> &Arc<IdentitySession> {
        &self.identity
    }

    pub fn chain(&self) -> &Arc<ChainSession> {
        &self.chain
    }

    /// Spawn a background task refreshing the login status on an interval.
    /// Dropping the returned handle stops the task.
    pub fn spawn_status_poll(&self, interval: Duration) -> StatusPoll {
        let chain = Arc::clone(&self.chain);
        let status = self.identity.watch_status();

        let handle = tokio::spawn(async move {
            loop {
                chain.refresh_login().await;
                tokio::time::sleep(interval).await;
            }
        });
        debug!(interval_secs = interval.as_secs(), "status poll started");

        StatusPoll { status, handle }
    }
}

/// Handle to a running status poll. Aborts the task on drop.
pub struct StatusPoll {
    status: watch::Receiver<LoginStatus>,
    handle: JoinHandle<()>,
}

impl StatusPoll {
    /// Most recently derived login status
    pub fn status(&self) -> LoginStatus {
        *self.status.borrow()
    }

    /// Wait for the next status transition
    pub async fn changed(&mut self) -> Option<LoginStatus> {
        self.status.changed().await.ok()?;
        Some(*self.status.borrow_and_update())
    }
}

impl Drop for StatusPoll {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
