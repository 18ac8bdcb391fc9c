/*
[INPUT]:  Identity session, deployed contract addresses and chain queries
[OUTPUT]: Wallet-scoped chain operations with derived connection state
[POS]:    Session layer - chain state machine over the logged-in wallet
[UPDATE]: When wallet operations or lockout policy change
*/

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_primitives::utils::{ParseUnits, parse_units};
use tracing::{debug, info, warn};

use crate::contracts::{MarketContract, NftContract};
use crate::error::{MagicError, Result};
use crate::rpc::{EthProvider, EthSigner};
use crate::session::cache::SessionCache;
use crate::session::identity::IdentitySession;
use crate::types::{
    CancelOutcome,
    EthBalance,
    EthUnit,
    HistoryReport,
    ListNftProps,
    LoginEvent,
    LoginStatus,
    MarketplaceInfo,
    NftDetails,
    NftInfo,
    TransferEstimate,
    TxOverrides,
    TxReceipt,
    TxRequest,
    VerifyRejectReason,
    VerifySubmission,
    convert_balance,
};

const OTP_LENGTH: usize = 6;
const MAX_OTP_ATTEMPTS: u32 = 3;
const FALLBACK_TRANSFER_GAS: u64 = 21_000;
const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
const METADATA_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything derived from one logged-in wallet: the signing handle and the
/// two contract bindings built on it. Published as a unit so readers never
/// observe a signer from one login paired with contracts from another.
pub struct ChainConnection {
    pub signer: EthSigner,
    pub nft: NftContract,
    pub market: MarketContract,
}

impl ChainConnection {
    /// Wallet address this connection acts as
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

/// Chain-facing session over the logged-in identity.
///
/// Wraps the login flow with OTP pacing (in-flight flags, attempt lockout)
/// and exposes wallet operations that require a derived [`ChainConnection`].
/// Operations issued while logged out fail with [`MagicError::NoSigner`].
pub struct ChainSession {
    identity: Arc<IdentitySession>,
    cache: SessionCache,
    http: reqwest::Client,
    connection: RwLock<Option<Arc<ChainConnection>>>,
    nft: NftInfo,
    market: MarketplaceInfo,
    sending_otp: AtomicBool,
    verifying_otp: AtomicBool,
    otp_attempts: AtomicU32,
    verify_seq: AtomicU64,
    login_seq: AtomicU64,
}

impl ChainSession {
    pub fn new(identity: Arc<IdentitySession>, nft: NftInfo, market: MarketplaceInfo) -> Self {
        Self::with_cache(identity, nft, market, SessionCache::new())
    }

    pub fn with_cache(
        identity: Arc<IdentitySession>,
        nft: NftInfo,
        market: MarketplaceInfo,
        cache: SessionCache,
    ) -> Self {
        Self {
            identity,
            cache,
            http: reqwest::Client::new(),
            connection: RwLock::new(None),
            nft,
            market,
            sending_otp: AtomicBool::new(false),
            verifying_otp: AtomicBool::new(false),
            otp_attempts: AtomicU32::new(0),
            verify_seq: AtomicU64::new(0),
            login_seq: AtomicU64::new(0),
        }
    }

    pub fn identity(&self) -> &Arc<IdentitySession> {
        &self.identity
    }

    pub fn nft_info(&self) -> &NftInfo {
        &self.nft
    }

    pub fn marketplace_info(&self) -> &MarketplaceInfo {
        &self.market
    }

    /// Whether an OTP dispatch is in flight
    pub fn is_sending_otp(&self) -> bool {
        self.sending_otp.load(Ordering::SeqCst)
    }

    /// Whether a submitted code is awaiting the provider's verdict
    pub fn is_verifying_otp(&self) -> bool {
        self.verifying_otp.load(Ordering::SeqCst)
    }

    /// Codes submitted against the current flow
    pub fn otp_attempts(&self) -> u32 {
        self.otp_attempts.load(Ordering::SeqCst)
    }

    /// Reopen the attempt budget, e.g. after the user requested a new code
    pub fn reset_otp_count(&self) {
        self.otp_attempts.store(0, Ordering::SeqCst);
    }

    // ---- login -----------------------------------------------------------

    /// Run one email-OTP login to completion, maintaining the in-flight
    /// flags and attempt counter around the identity session's flow.
    ///
    /// On success the session cache is refreshed and a [`ChainConnection`]
    /// is derived; a failed derivation degrades to "logged in, not
    /// connected" rather than unwinding the login.
    pub async fn login_magic<F>(&self, email: &str, mut on_event: F) -> Option<String>
    where
        F: FnMut(&LoginEvent) + Send,
    {
        let login_id = self.login_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.sending_otp.store(true, Ordering::SeqCst);
        self.otp_attempts.store(0, Ordering::SeqCst);

        let token = self
            .identity
            .login_with_email_otp(email, |event| {
                match event {
                    LoginEvent::OtpSent => {
                        self.sending_otp.store(false, Ordering::SeqCst);
                        self.otp_attempts.store(0, Ordering::SeqCst);
                    }
                    LoginEvent::InvalidOtp | LoginEvent::ExpiredOtp => {
                        self.verifying_otp.store(false, Ordering::SeqCst);
                    }
                    LoginEvent::Throttled => {
                        self.sending_otp.store(false, Ordering::SeqCst);
                        self.verifying_otp.store(false, Ordering::SeqCst);
                    }
                    LoginEvent::Done(_) | LoginEvent::Error(_) => {
                        self.sending_otp.store(false, Ordering::SeqCst);
                        self.verifying_otp.store(false, Ordering::SeqCst);
                        self.otp_attempts.store(0, Ordering::SeqCst);
                    }
                    _ => {}
                }
                on_event(event);
            })
            .await;

        // guaranteed flag reset, but only for the login that still owns
        // them: a superseded login's late resolution must not clobber the
        // flags of the one that replaced it
        if self.login_seq.load(Ordering::SeqCst) == login_id {
            self.sending_otp.store(false, Ordering::SeqCst);
            self.verifying_otp.store(false, Ordering::SeqCst);
        }

        if let Some(token) = &token {
            self.cache.remember_login(Some(token));
            if let Err(e) = self.connect().await {
                warn!(error = %e, "wallet connection unavailable after login");
            }
        }
        token
    }

    /// Submit an OTP against the pending flow.
    ///
    /// Local gatekeeping happens before the provider sees anything: empty
    /// and wrong-length codes are rejected outright, and once the attempt
    /// budget is spent codes come back `Locked` without reaching the
    /// provider. The flow itself stays open; [`Self::reset_otp_count`]
    /// reopens the budget.
    pub async fn verify_otp_magic(&self, code: &str) -> VerifySubmission {
        let code = code.trim();
        if code.is_empty() {
            return VerifySubmission::rejected(VerifyRejectReason::EmptyOtp);
        }
        if code.len() != OTP_LENGTH {
            return VerifySubmission::rejected(VerifyRejectReason::InvalidLength);
        }

        let attempt = self.otp_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt >= MAX_OTP_ATTEMPTS {
            warn!(attempt, "OTP attempt budget spent");
            // hold the counter at the threshold so a reset reopens cleanly
            self.otp_attempts.store(MAX_OTP_ATTEMPTS, Ordering::SeqCst);
            return VerifySubmission::rejected(VerifyRejectReason::Locked);
        }

        self.verifying_otp.store(true, Ordering::SeqCst);
        let call_id = self.verify_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let outcome = self.identity.verify_otp(code).await;
        debug!(attempt, accepted = outcome.is_accepted(), "OTP submitted");

        // a rejected submission settles immediately; an accepted one stays
        // in-flight until the flow reports back. Skip the flag when a newer
        // submission has already superseded this one.
        if !outcome.is_accepted() && self.verify_seq.load(Ordering::SeqCst) == call_id {
            self.verifying_otp.store(false, Ordering::SeqCst);
        }
        outcome
    }

    /// Abandon the pending verification and reset the in-flight flags
    pub async fn cancel_verify_magic(&self) -> CancelOutcome {
        let outcome = self.identity.cancel_verify().await;
        self.sending_otp.store(false, Ordering::SeqCst);
        self.verifying_otp.store(false, Ordering::SeqCst);
        self.otp_attempts.store(0, Ordering::SeqCst);
        outcome
    }

    /// Login check backed by the cached hint.
    ///
    /// A derived `LoggedIn`/`LoggedOut` status answers directly. Before the
    /// first liveness check the cache hint answers optimistically without a
    /// provider round trip; [`Self::refresh_login`] forces the real check.
    pub async fn is_logged_magic(&self) -> bool {
        match self.identity.login_status() {
            LoginStatus::LoggedIn => true,
            LoginStatus::LoggedOut => false,
            LoginStatus::Unknown => {
                if self.cache.hint_logged_in() {
                    return true;
                }
                self.identity.check_logged_in().await
            }
        }
    }

    /// Liveness check against the provider, syncing cache and connection
    pub async fn refresh_login(&self) -> bool {
        let live = self.identity.check_logged_in().await;
        if live {
            if !self.cache.hint_logged_in() {
                let token = self.cache.load().and_then(|session| session.token);
                self.cache.remember_login(token.as_deref());
            }
            if self.connection().is_none() {
                if let Err(e) = self.connect().await {
                    warn!(error = %e, "wallet connection unavailable on refresh");
                }
            }
        } else {
            self.cache.clear();
            self.disconnect();
        }
        live
    }

    /// Log out, clear the cache and drop the derived connection
    pub async fn logout_magic(&self) {
        self.identity.logout().await;
        self.cache.clear();
        self.disconnect();
        self.sending_otp.store(false, Ordering::SeqCst);
        self.verifying_otp.store(false, Ordering::SeqCst);
        self.otp_attempts.store(0, Ordering::SeqCst);
    }

    // ---- connection ------------------------------------------------------

    /// Derive a [`ChainConnection`] from the logged-in identity and publish
    /// it. The signer and both contract bindings are built first and
    /// swapped in under one write, never piecemeal.
    pub async fn connect(&self) -> Result<Arc<ChainConnection>> {
        let provider = self.identity.handle().ok_or(MagicError::NotInitialized)?;

        let eth = EthProvider::new(provider.rpc_transport());
        let accounts = eth.accounts().await?;
        let address = accounts.first().copied().ok_or(MagicError::NoSigner)?;
        let signer = EthSigner::new(eth, address);

        let connection = Arc::new(ChainConnection {
            nft: NftContract::new(self.nft.address, signer.clone()),
            market: MarketContract::new(self.market.address, signer.clone()),
            signer,
        });

        info!(address = %address, "wallet connected");
        *self.connection.write().unwrap() = Some(Arc::clone(&connection));
        Ok(connection)
    }

    /// Drop the derived connection, if any
    pub fn disconnect(&self) {
        if self.connection.write().unwrap().take().is_some() {
            debug!("wallet disconnected");
        }
    }

    /// Current derived connection
    pub fn connection(&self) -> Option<Arc<ChainConnection>> {
        self.connection.read().unwrap().clone()
    }

    fn require_connection(&self) -> Result<Arc<ChainConnection>> {
        self.connection().ok_or(MagicError::NoSigner)
    }

    // ---- wallet operations ----------------------------------------------

    /// Native balance of the connected wallet as a decimal ether string
    pub async fn eth_balance(&self) -> Result<EthBalance> {
        let conn = self.require_connection()?;
        let wei = conn.signer.balance().await?;
        Ok(EthBalance {
            address: conn.address(),
            balance_eth: convert_balance(&wei.to_string(), EthUnit::Wei, EthUnit::Ether)?,
        })
    }

    /// Price out a plain transfer without sending it.
    ///
    /// The recipient and amount are validated before any network traffic;
    /// a node that refuses to estimate gets the standard transfer gas limit
    /// as a fallback.
    pub async fn estimate_transfer(&self, to: &str, amount_eth: &str) -> Result<TransferEstimate> {
        let conn = self.require_connection()?;
        let to = parse_recipient(to)?;
        let value = parse_eth_amount(amount_eth)?;

        let tx = TxRequest::transfer(conn.address(), to, value);
        let fee = conn.signer.provider().fee_data().await?;
        let gas_price = match fee.gas_price {
            Some(price) => price,
            None => conn.signer.provider().gas_price().await?,
        };
        let gas_limit = match conn.signer.provider().estimate_gas(&tx).await {
            Ok(gas) => gas,
            Err(e) => {
                warn!(error = %e, "gas estimation failed, falling back to transfer default");
                U256::from(FALLBACK_TRANSFER_GAS)
            }
        };

        Ok(TransferEstimate {
            gas_limit,
            gas_price,
            value,
        })
    }

    /// Send native currency and wait for one confirmation. A mined-but-
    /// reverted transaction still resolves with its receipt; callers check
    /// [`TxReceipt::status_ok`].
    pub async fn transfer_eth(&self, to: &str, amount_eth: &str) -> Result<TxReceipt> {
        let conn = self.require_connection()?;
        let recipient = parse_recipient(to)?;
        let estimate = self.estimate_transfer(to, amount_eth).await?;

        let tx = TxRequest::transfer(conn.address(), recipient, estimate.value)
            .with_gas(estimate.gas_limit, estimate.gas_price);
        let receipt = conn.signer.send_and_confirm(tx).await?;

        if receipt.status_ok() {
            info!(hash = %receipt.transaction_hash, to = %recipient, "transfer confirmed");
        } else {
            warn!(hash = %receipt.transaction_hash, "transfer mined but reverted");
        }
        Ok(receipt)
    }

    // ---- NFT and marketplace --------------------------------------------

    /// On-chain details of one token, optionally dereferencing its metadata
    /// URI. Metadata fetch failures degrade to `None`, never to an error.
    pub async fn nft_details(&self, token_id: U256, fetch_metadata: bool) -> Result<NftDetails> {
        let conn = self.require_connection()?;

        let owner = conn.nft.owner_of(token_id).await?;
        let collection_name = conn.nft.name().await?;
        let collection_symbol = conn.nft.symbol().await?;
        let token_uri = conn.nft.token_uri(token_id).await?;

        let metadata = if fetch_metadata {
            self.fetch_token_metadata(&token_uri).await
        } else {
            None
        };

        Ok(NftDetails {
            token_id,
            owner,
            collection_name,
            collection_symbol,
            token_uri,
            metadata,
        })
    }

    /// Make sure the marketplace may move the wallet's tokens, granting
    /// collection-wide approval when it is missing. Resolves to whether an
    /// approval transaction was sent.
    pub async fn ensure_marketplace_approval(&self) -> Result<bool> {
        let conn = self.require_connection()?;

        if conn
            .nft
            .is_approved_for_all(conn.address(), self.market.address)
            .await?
        {
            return Ok(false);
        }

        info!(operator = %self.market.address, "granting marketplace approval");
        let receipt = conn.nft.set_approval_for_all(self.market.address, true).await?;
        if !receipt.status_ok() {
            return Err(MagicError::InvalidResponse(
                "approval transaction reverted".to_string(),
            ));
        }
        Ok(true)
    }

    /// List a token on the marketplace, granting approval first when
    /// needed. `price` is a decimal ether string.
    pub async fn list_nft(&self, props: ListNftProps, overrides: TxOverrides) -> Result<TxReceipt> {
        let conn = self.require_connection()?;
        let price_wei = parse_eth_amount(&props.price)?;

        self.ensure_marketplace_approval().await?;

        conn.market
            .list_token(
                self.nft.address,
                props.token_sell.unwrap_or(Address::ZERO),
                props.token_id,
                props.amount,
                price_wei,
                props.private_buyers,
                overrides,
            )
            .await
    }

    /// Past activity of the connected wallet across both contracts
    pub async fn history(&self) -> Result<HistoryReport> {
        let conn = self.require_connection()?;
        let me = conn.address();
        let provider = conn.signer.provider();

        let received = provider.get_logs(&conn.nft.transfer_filter(None, Some(me))).await?;
        let sent = provider.get_logs(&conn.nft.transfer_filter(Some(me), None)).await?;
        let listed = provider.get_logs(&conn.market.listed_filter(me)).await?;
        let bought = provider.get_logs(&conn.market.sold_filter(me)).await?;
        let delisted = provider.get_logs(&conn.market.delisted_filter()).await?;

        Ok(HistoryReport {
            received,
            sent,
            listed,
            bought,
            delisted,
        })
    }

    async fn fetch_token_metadata(&self, uri: &str) -> Option<serde_json::Value> {
        let url = rewrite_ipfs(uri);
        let response = self
            .http
            .get(&url)
            .timeout(METADATA_FETCH_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) => match response.error_for_status() {
                Ok(response) => match response.json().await {
                    Ok(metadata) => Some(metadata),
                    Err(e) => {
                        warn!(url = %url, error = %e, "token metadata not valid JSON");
                        None
                    }
                },
                Err(e) => {
                    warn!(url = %url, error = %e, "token metadata fetch rejected");
                    None
                }
            },
            Err(e) => {
                warn!(url = %url, error = %e, "token metadata fetch failed");
                None
            }
        }
    }
}

/// Rewrite `ipfs://` URIs through a public HTTP gateway
fn rewrite_ipfs(uri: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(path) => format!("{IPFS_GATEWAY}{}", path.trim_start_matches('/')),
        None => uri.to_string(),
    }
}

fn parse_recipient(to: &str) -> Result<Address> {
    to.trim()
        .parse::<Address>()
        .map_err(|_| MagicError::InvalidAddress(to.to_string()))
}

/// Parse a decimal ether string into wei, rejecting non-positive amounts
/// and amounts with sub-wei precision
fn parse_eth_amount(amount: &str) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(MagicError::InvalidAmount("empty amount".to_string()));
    }
    if let Some((_, frac)) = trimmed.split_once('.') {
        if frac.len() > EthUnit::Ether.decimals() as usize {
            return Err(MagicError::InvalidAmount(format!(
                "{trimmed}: more than {} fractional digits",
                EthUnit::Ether.decimals()
            )));
        }
    }

    let parsed = parse_units(trimmed, EthUnit::Ether.decimals())
        .map_err(|e| MagicError::InvalidAmount(format!("{trimmed}: {e}")))?;

    let wei = match parsed {
        ParseUnits::U256(v) => v,
        ParseUnits::I256(v) if !v.is_negative() => v.unsigned_abs(),
        ParseUnits::I256(_) => {
            return Err(MagicError::InvalidAmount(format!(
                "{trimmed}: amount must be positive"
            )));
        }
    };

    if wei.is_zero() {
        return Err(MagicError::InvalidAmount(format!(
            "{trimmed}: amount must be positive"
        )));
    }
    Ok(wei)
}
