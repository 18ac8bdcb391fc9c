/*
[INPUT]:  Identity provider handle and login flow events
[OUTPUT]: Login status plus one login/verify/cancel cycle at a time
[POS]:    Session layer - identity state machine
[UPDATE]: When the flow protocol or status derivation changes
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::error::Result;
use crate::provider::{DidClaim, MagicProvider, decode_did_claim};
use crate::types::{
    CancelOutcome,
    FlowCommand,
    LoginEvent,
    LoginStatus,
    MagicConfig,
    ResolvedNetwork,
    UserMetadata,
    VerifyRejectReason,
    VerifySubmission,
};

struct ActiveFlow {
    id: u64,
    commands: mpsc::UnboundedSender<FlowCommand>,
}

/// Single source of truth for "is there a logged-in identity".
///
/// Owns the provider handle (first-writer-wins) and at most one login flow.
/// A login started while another is pending replaces it; the superseded
/// flow is fenced off by its flow id, so late events from it can no longer
/// touch shared state.
pub struct IdentitySession {
    handle: RwLock<Option<Arc<dyn MagicProvider>>>,
    resolved: RwLock<Option<ResolvedNetwork>>,
    status_tx: watch::Sender<LoginStatus>,
    flow: Mutex<Option<ActiveFlow>>,
    flow_seq: AtomicU64,
}

impl IdentitySession {
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(LoginStatus::Unknown);
        Self {
            handle: RwLock::new(None),
            resolved: RwLock::new(None),
            status_tx,
            flow: Mutex::new(None),
            flow_seq: AtomicU64::new(0),
        }
    }

    /// Create the identity handle once. Later calls are no-ops returning the
    /// existing handle, whatever their parameters. A missing API key or a
    /// failing provider constructor degrades to `None` (logged-out mode)
    /// rather than failing the caller.
    pub fn initialize<F>(&self, config: MagicConfig, make_provider: F) -> Option<Arc<dyn MagicProvider>>
    where
        F: FnOnce(&ResolvedNetwork) -> Result<Arc<dyn MagicProvider>>,
    {
        {
            let existing = self.handle.read().unwrap();
            if existing.is_some() {
                return existing.clone();
            }
        }

        if config.api_key.trim().is_empty() {
            warn!("Magic init warning: API key not provided");
            return None;
        }

        let resolved = ResolvedNetwork::resolve(&config);
        let provider = match make_provider(&resolved) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(error = %e, network = %resolved.network, "Magic init warning");
                return None;
            }
        };

        let mut slot = self.handle.write().unwrap();
        // lost the race to another initializer: first writer wins
        if slot.is_none() {
            *slot = Some(Arc::clone(&provider));
            *self.resolved.write().unwrap() = Some(resolved);
        }
        slot.clone()
    }

    /// Current identity handle, if initialization succeeded
    pub fn handle(&self) -> Option<Arc<dyn MagicProvider>> {
        self.handle.read().unwrap().clone()
    }

    /// Network parameters the handle was created for
    pub fn resolved_network(&self) -> Option<ResolvedNetwork> {
        self.resolved.read().unwrap().clone()
    }

    /// Current derived login status
    pub fn login_status(&self) -> LoginStatus {
        *self.status_tx.borrow()
    }

    /// Watch login-status transitions
    pub fn watch_status(&self) -> watch::Receiver<LoginStatus> {
        self.status_tx.subscribe()
    }

    /// Whether a login flow is currently pending
    pub fn has_active_flow(&self) -> bool {
        self.flow.lock().unwrap().is_some()
    }

    /// Liveness check against the provider. Fail-safe: provider errors
    /// resolve to `false` and a `LoggedOut` status, never to a propagated
    /// error or a lingering `Unknown`.
    pub async fn check_logged_in(&self) -> bool {
        let Some(provider) = self.handle() else {
            self.set_status(LoginStatus::LoggedOut);
            return false;
        };

        match provider.is_logged_in().await {
            Ok(logged) => {
                self.set_status(if logged {
                    LoginStatus::LoggedIn
                } else {
                    LoginStatus::LoggedOut
                });
                logged
            }
            Err(e) => {
                warn!(error = %e, "isLoggedIn check failed");
                self.set_status(LoginStatus::LoggedOut);
                false
            }
        }
    }

    /// Run one email-OTP login flow to completion.
    ///
    /// Resolves to the issued token on success, `None` otherwise; failures
    /// surface through the `Error` event rather than a return-path error.
    /// Starting a new login while one is pending replaces it silently.
    pub async fn login_with_email_otp<F>(&self, email: &str, mut on_event: F) -> Option<String>
    where
        F: FnMut(&LoginEvent) + Send,
    {
        let Some(provider) = self.handle() else {
            warn!("login requested before initialization");
            on_event(&LoginEvent::Error("Magic not initialized".to_string()));
            return None;
        };

        if email.trim().is_empty() {
            on_event(&LoginEvent::Error("email must not be empty".to_string()));
            return None;
        }

        let mut flow = match provider.login_with_email_otp(email).await {
            Ok(flow) => flow,
            Err(e) => {
                warn!(error = %e, "login error");
                on_event(&LoginEvent::Error(e.to_string()));
                return None;
            }
        };

        let flow_id = self.flow_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            // overwrite, never queue: the flow slot is half-duplex
            let mut slot = self.flow.lock().unwrap();
            *slot = Some(ActiveFlow {
                id: flow_id,
                commands: flow.command_sender(),
            });
        }
        debug!(flow_id, "login flow started");

        let mut token: Option<String> = None;
        let mut aborted: Option<String> = None;

        loop {
            let Some(event) = flow.next_event().await else {
                aborted = Some("login flow closed unexpectedly".to_string());
                break;
            };

            if !self.current_flow_id().is_some_and(|id| id == flow_id) {
                debug!(flow_id, "ignoring events from a superseded flow");
                return None;
            }

            let terminal = event.is_terminal();
            if let LoginEvent::Done(result) = &event {
                token = result.clone();
            }
            on_event(&event);
            if terminal {
                break;
            }
        }

        // guaranteed cleanup: release the flow slot if it is still ours
        let still_current = self.clear_flow_if(flow_id);

        if let Some(reason) = aborted {
            warn!(flow_id, reason = %reason, "login error");
            if still_current {
                on_event(&LoginEvent::Error(reason));
            }
            return None;
        }

        if !still_current {
            return None;
        }

        if token.is_some() {
            self.set_status(LoginStatus::LoggedIn);
        }
        token
    }

    /// Route a code into the pending flow. Expected failures come back as
    /// structured rejections; this never errors.
    pub async fn verify_otp(&self, code: &str) -> VerifySubmission {
        if code.trim().is_empty() {
            return VerifySubmission::rejected(VerifyRejectReason::EmptyOtp);
        }

        let sender = {
            let slot = self.flow.lock().unwrap();
            slot.as_ref().map(|flow| flow.commands.clone())
        };
        let Some(sender) = sender else {
            warn!("verifyOTP error: must send OTP first");
            return VerifySubmission::rejected(VerifyRejectReason::NoFlow);
        };

        match sender.send(FlowCommand::VerifyOtp(code.to_string())) {
            Ok(()) => VerifySubmission::Accepted,
            Err(e) => VerifySubmission::Rejected {
                reason: VerifyRejectReason::EmitFailed,
                detail: Some(e.to_string()),
            },
        }
    }

    /// Route a cancellation into the pending flow. A missing flow is a
    /// normal outcome, not an error.
    pub async fn cancel_verify(&self) -> CancelOutcome {
        let sender = {
            let slot = self.flow.lock().unwrap();
            slot.as_ref().map(|flow| flow.commands.clone())
        };
        let Some(sender) = sender else {
            return CancelOutcome::NoFlow;
        };

        match sender.send(FlowCommand::Cancel) {
            Ok(()) => CancelOutcome::Cancelled,
            Err(e) => CancelOutcome::Failed(e.to_string()),
        }
    }

    /// Provider logout. No handle means no-op; provider errors are
    /// swallowed. The status is `LoggedOut` afterwards either way.
    pub async fn logout(&self) {
        let Some(provider) = self.handle() else {
            return;
        };
        if let Err(e) = provider.logout().await {
            warn!(error = %e, "logout error");
        }
        self.set_status(LoginStatus::LoggedOut);
    }

    /// Signed session token, `None` on missing handle or provider failure
    pub async fn user_id_token(&self) -> Option<String> {
        let provider = self.handle()?;
        provider.id_token().await.ok()
    }

    /// Decoded claim of the current session token
    pub async fn user_id_claim(&self) -> Option<DidClaim> {
        let token = self.user_id_token().await?;
        match decode_did_claim(&token) {
            Ok(claim) => Some(claim),
            Err(e) => {
                warn!(error = %e, "session token claim undecodable");
                None
            }
        }
    }

    /// Profile of the logged-in identity, `None` on failure
    pub async fn user_metadata(&self) -> Option<UserMetadata> {
        let provider = self.handle()?;
        match provider.user_metadata().await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(error = %e, "getUserMetadata error");
                None
            }
        }
    }

    fn set_status(&self, status: LoginStatus) {
        self.status_tx.send_replace(status);
    }

    fn current_flow_id(&self) -> Option<u64> {
        self.flow.lock().unwrap().as_ref().map(|flow| flow.id)
    }

    fn clear_flow_if(&self, id: u64) -> bool {
        let mut slot = self.flow.lock().unwrap();
        if slot.as_ref().is_some_and(|flow| flow.id == id) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

impl Default for IdentitySession {
    fn default() -> Self {
        Self::new()
    }
}
