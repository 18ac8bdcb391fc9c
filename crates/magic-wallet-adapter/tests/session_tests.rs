/*
[INPUT]:  Mock identity provider flows
[OUTPUT]: Test results for login, verification and session lifecycle
[POS]:    Integration tests - session layer
[UPDATE]: When login flow or lockout semantics change
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use common::{TEST_WALLET, temp_cache, test_config, test_contracts};
use magic_wallet_adapter::{
    CancelOutcome,
    ChainSession,
    FlowCommand,
    IdentitySession,
    LoginEvent,
    LoginFlow,
    LoginStatus,
    MagicError,
    MagicProvider,
    MockMagicProvider,
    Result,
    RpcTransport,
    StaticRpcTransport,
    UserMetadata,
    VerifyRejectReason,
    VerifySubmission,
};
use tokio::sync::mpsc;

fn chain_over_provider(provider: Arc<dyn MagicProvider>) -> Arc<ChainSession> {
    let identity = Arc::new(IdentitySession::new());
    identity.initialize(test_config(), |_| Ok(provider));
    let (nft, market) = test_contracts();
    Arc::new(ChainSession::with_cache(identity, nft, market, temp_cache()))
}

fn chain_over(provider: Arc<MockMagicProvider>) -> Arc<ChainSession> {
    chain_over_provider(provider)
}

fn provider_with_accounts(expected_otp: &str, token: &str) -> Arc<MockMagicProvider> {
    let transport = StaticRpcTransport::new();
    transport.insert("eth_accounts", serde_json::json!([TEST_WALLET]));
    Arc::new(MockMagicProvider::new(expected_otp, token).with_transport(Arc::new(transport)))
}

/// Spawn a login and return (join handle, event stream)
fn start_login(
    chain: &Arc<ChainSession>,
) -> (
    tokio::task::JoinHandle<Option<String>>,
    mpsc::UnboundedReceiver<LoginEvent>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let chain = Arc::clone(chain);
    let handle = tokio::spawn(async move {
        chain
            .login_magic("user@example.com", move |event| {
                let _ = tx.send(event.clone());
            })
            .await
    });
    (handle, rx)
}

#[tokio::test]
async fn test_login_and_verify_happy_path() {
    let provider = provider_with_accounts("123456", "did-token");
    let chain = chain_over(Arc::clone(&provider));

    let (login, mut events) = start_login(&chain);
    assert_eq!(events.recv().await, Some(LoginEvent::OtpSent));
    assert!(!chain.is_sending_otp());

    let outcome = chain.verify_otp_magic("123456").await;
    assert!(outcome.is_accepted());

    assert_eq!(
        events.recv().await,
        Some(LoginEvent::IdTokenCreated("did-token".to_string()))
    );
    assert_eq!(
        events.recv().await,
        Some(LoginEvent::Done(Some("did-token".to_string())))
    );

    let token = login.await.unwrap();
    assert_eq!(token.as_deref(), Some("did-token"));
    assert_eq!(chain.identity().login_status(), LoginStatus::LoggedIn);
    assert!(!chain.is_verifying_otp());

    // connection derived from the provider transport's account
    let connection = chain.connection().expect("connection after login");
    assert_eq!(
        connection.address().to_string().to_lowercase(),
        TEST_WALLET.to_lowercase()
    );
}

#[tokio::test]
async fn test_wrong_code_keeps_flow_open() {
    let provider = provider_with_accounts("123456", "did-token");
    let chain = chain_over(Arc::clone(&provider));

    let (login, mut events) = start_login(&chain);
    assert_eq!(events.recv().await, Some(LoginEvent::OtpSent));

    assert!(chain.verify_otp_magic("999999").await.is_accepted());
    assert_eq!(events.recv().await, Some(LoginEvent::InvalidOtp));
    assert_eq!(chain.otp_attempts(), 1);
    assert!(!chain.is_verifying_otp());

    assert!(chain.verify_otp_magic("123456").await.is_accepted());
    assert_eq!(
        events.recv().await,
        Some(LoginEvent::IdTokenCreated("did-token".to_string()))
    );
    assert_eq!(
        events.recv().await,
        Some(LoginEvent::Done(Some("did-token".to_string())))
    );
    assert_eq!(login.await.unwrap().as_deref(), Some("did-token"));
}

#[tokio::test]
async fn test_lockout_after_attempt_budget() {
    let provider = provider_with_accounts("123456", "did-token");
    let chain = chain_over(Arc::clone(&provider));

    let (login, mut events) = start_login(&chain);
    assert_eq!(events.recv().await, Some(LoginEvent::OtpSent));

    for _ in 0..2 {
        assert!(chain.verify_otp_magic("111111").await.is_accepted());
        assert_eq!(events.recv().await, Some(LoginEvent::InvalidOtp));
    }

    // budget spent: the third submission is rejected locally, flow stays open
    assert_eq!(
        chain.verify_otp_magic("111111").await,
        VerifySubmission::rejected(VerifyRejectReason::Locked)
    );
    assert_eq!(chain.otp_attempts(), 3);

    // even the right code stays local while locked
    assert_eq!(
        chain.verify_otp_magic("123456").await,
        VerifySubmission::rejected(VerifyRejectReason::Locked)
    );
    let commands = provider.recorded_commands();
    assert_eq!(commands.len(), 2);
    assert!(!commands.contains(&FlowCommand::Cancel));

    // resetting the budget reopens the same flow
    chain.reset_otp_count();
    assert!(chain.verify_otp_magic("123456").await.is_accepted());
    assert_eq!(
        events.recv().await,
        Some(LoginEvent::IdTokenCreated("did-token".to_string()))
    );
    assert_eq!(
        events.recv().await,
        Some(LoginEvent::Done(Some("did-token".to_string())))
    );
    assert_eq!(login.await.unwrap().as_deref(), Some("did-token"));
    assert_eq!(chain.identity().login_status(), LoginStatus::LoggedIn);
}

#[tokio::test]
async fn test_malformed_codes_never_reach_provider() {
    let provider = provider_with_accounts("123456", "did-token");
    let chain = chain_over(Arc::clone(&provider));

    let (login, mut events) = start_login(&chain);
    assert_eq!(events.recv().await, Some(LoginEvent::OtpSent));

    assert_eq!(
        chain.verify_otp_magic("").await,
        VerifySubmission::rejected(VerifyRejectReason::EmptyOtp)
    );
    assert_eq!(
        chain.verify_otp_magic("123").await,
        VerifySubmission::rejected(VerifyRejectReason::InvalidLength)
    );
    assert_eq!(
        chain.verify_otp_magic("1234567").await,
        VerifySubmission::rejected(VerifyRejectReason::InvalidLength)
    );

    // local rejections count no attempts and send nothing
    assert_eq!(chain.otp_attempts(), 0);
    assert!(provider.recorded_commands().is_empty());

    assert_eq!(chain.cancel_verify_magic().await, CancelOutcome::Cancelled);
    assert_eq!(events.recv().await, Some(LoginEvent::ClosedByUser));
    assert_eq!(events.recv().await, Some(LoginEvent::Done(None)));
    assert_eq!(login.await.unwrap(), None);
}

#[tokio::test]
async fn test_superseded_flow_cannot_complete_login() {
    let provider = provider_with_accounts("123456", "token-b");
    let chain = chain_over(Arc::clone(&provider));

    let (first, mut first_events) = start_login(&chain);
    assert_eq!(first_events.recv().await, Some(LoginEvent::OtpSent));

    // second login replaces the first flow
    let (second, mut second_events) = start_login(&chain);
    assert_eq!(second_events.recv().await, Some(LoginEvent::OtpSent));

    assert!(chain.verify_otp_magic("123456").await.is_accepted());
    assert_eq!(
        second_events.recv().await,
        Some(LoginEvent::IdTokenCreated("token-b".to_string()))
    );
    assert_eq!(
        second_events.recv().await,
        Some(LoginEvent::Done(Some("token-b".to_string())))
    );
    assert_eq!(second.await.unwrap().as_deref(), Some("token-b"));
    assert_eq!(chain.identity().login_status(), LoginStatus::LoggedIn);

    // the abandoned first flow saw nothing further and stays unresolved
    assert!(
        tokio::time::timeout(Duration::from_millis(50), first_events.recv())
            .await
            .is_err()
    );
    assert!(!first.is_finished());
    first.abort();
}

#[tokio::test]
async fn test_throttled_login_resolves_without_token() {
    let provider = Arc::new(MockMagicProvider::new("123456", "did-token").with_throttling());
    let chain = chain_over(provider);

    let (login, mut events) = start_login(&chain);
    assert_eq!(events.recv().await, Some(LoginEvent::Throttled));
    assert_eq!(
        events.recv().await,
        Some(LoginEvent::Error("login throttled".to_string()))
    );

    assert_eq!(login.await.unwrap(), None);
    assert!(!chain.is_sending_otp());
    assert!(chain.connection().is_none());
}

#[tokio::test]
async fn test_failing_flow_creation_surfaces_error_event() {
    let provider = Arc::new(MockMagicProvider::new("123456", "did-token").with_failing_login());
    let chain = chain_over(provider);

    let (login, mut events) = start_login(&chain);
    assert!(matches!(events.recv().await, Some(LoginEvent::Error(_))));
    assert_eq!(login.await.unwrap(), None);
    assert!(!chain.is_sending_otp());
}

#[tokio::test]
async fn test_logout_round_trip() {
    let provider = provider_with_accounts("123456", "did-token");
    let chain = chain_over(Arc::clone(&provider));

    let (login, mut events) = start_login(&chain);
    assert_eq!(events.recv().await, Some(LoginEvent::OtpSent));
    assert!(chain.verify_otp_magic("123456").await.is_accepted());
    while let Some(event) = events.recv().await {
        if event.is_terminal() {
            break;
        }
    }
    login.await.unwrap();

    assert!(chain.is_logged_magic().await);
    assert!(chain.connection().is_some());

    chain.logout_magic().await;
    assert_eq!(chain.identity().login_status(), LoginStatus::LoggedOut);
    assert!(chain.connection().is_none());
    assert!(!chain.is_logged_magic().await);
    assert_eq!(chain.otp_attempts(), 0);
}

/// Provider whose flow answers every verification with a throttle notice
/// but keeps the flow open.
struct SoftThrottleProvider;

#[async_trait]
impl MagicProvider for SoftThrottleProvider {
    async fn is_logged_in(&self) -> Result<bool> {
        Ok(false)
    }

    async fn logout(&self) -> Result<()> {
        Ok(())
    }

    async fn user_metadata(&self) -> Result<UserMetadata> {
        Err(MagicError::Provider("no active session".to_string()))
    }

    async fn id_token(&self) -> Result<String> {
        Err(MagicError::Provider("no active session".to_string()))
    }

    async fn login_with_email_otp(&self, _email: &str) -> Result<LoginFlow> {
        let (flow, mut controller) = LoginFlow::pair();
        tokio::spawn(async move {
            controller.emit(LoginEvent::OtpSent);
            while let Some(command) = controller.next_command().await {
                match command {
                    FlowCommand::VerifyOtp(_) => {
                        controller.emit(LoginEvent::Throttled);
                    }
                    FlowCommand::Cancel => {
                        controller.emit(LoginEvent::ClosedByUser);
                        controller.emit(LoginEvent::Done(None));
                        return;
                    }
                }
            }
        });
        Ok(flow)
    }

    fn rpc_transport(&self) -> Arc<dyn RpcTransport> {
        Arc::new(StaticRpcTransport::new())
    }
}

#[tokio::test]
async fn test_throttled_verify_releases_flags_and_keeps_flow() {
    let chain = chain_over_provider(Arc::new(SoftThrottleProvider));

    let (login, mut events) = start_login(&chain);
    assert_eq!(events.recv().await, Some(LoginEvent::OtpSent));

    assert!(chain.verify_otp_magic("123456").await.is_accepted());
    assert_eq!(events.recv().await, Some(LoginEvent::Throttled));

    // a throttle notice is not terminal, but it must release both flags
    assert!(!chain.is_sending_otp());
    assert!(!chain.is_verifying_otp());

    // the flow survived and can still be cancelled
    assert_eq!(chain.cancel_verify_magic().await, CancelOutcome::Cancelled);
    assert_eq!(events.recv().await, Some(LoginEvent::ClosedByUser));
    assert_eq!(events.recv().await, Some(LoginEvent::Done(None)));
    assert_eq!(login.await.unwrap(), None);
    assert_eq!(chain.otp_attempts(), 0);
}

/// Provider whose first flow settles late with a token; later flows stay
/// silent and just hold their channel open.
struct LateResolvingProvider {
    calls: AtomicU32,
}

#[async_trait]
impl MagicProvider for LateResolvingProvider {
    async fn is_logged_in(&self) -> Result<bool> {
        Ok(false)
    }

    async fn logout(&self) -> Result<()> {
        Ok(())
    }

    async fn user_metadata(&self) -> Result<UserMetadata> {
        Err(MagicError::Provider("no active session".to_string()))
    }

    async fn id_token(&self) -> Result<String> {
        Err(MagicError::Provider("no active session".to_string()))
    }

    async fn login_with_email_otp(&self, _email: &str) -> Result<LoginFlow> {
        let (flow, mut controller) = LoginFlow::pair();
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::spawn(async move {
                controller.emit(LoginEvent::OtpSent);
                tokio::time::sleep(Duration::from_millis(60)).await;
                controller.emit(LoginEvent::Done(Some("token-a".to_string())));
            });
        } else {
            tokio::spawn(async move {
                // swallow commands forever so the flow never settles
                while controller.next_command().await.is_some() {}
            });
        }
        Ok(flow)
    }

    fn rpc_transport(&self) -> Arc<dyn RpcTransport> {
        Arc::new(StaticRpcTransport::new())
    }
}

#[tokio::test]
async fn test_stale_login_resolution_leaves_current_flags_alone() {
    let chain = chain_over_provider(Arc::new(LateResolvingProvider {
        calls: AtomicU32::new(0),
    }));

    let (first, mut first_events) = start_login(&chain);
    assert_eq!(first_events.recv().await, Some(LoginEvent::OtpSent));
    assert!(!chain.is_sending_otp());

    // second login supersedes the first and is still waiting for its OTP
    let (second, _second_events) = start_login(&chain);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(chain.is_sending_otp());

    // the superseded login settles without a token and must not touch
    // the flags owned by the newer login
    assert_eq!(first.await.unwrap(), None);
    assert!(chain.is_sending_otp());

    second.abort();
}

#[tokio::test]
async fn test_cache_hint_answers_before_first_liveness_check() {
    // a provider whose liveness check would fail if it were consulted
    let provider = Arc::new(MockMagicProvider::new("123456", "did-token").with_failing_liveness());
    let identity = Arc::new(IdentitySession::new());
    identity.initialize(test_config(), |_| {
        Ok(Arc::clone(&provider) as Arc<dyn MagicProvider>)
    });

    let cache = temp_cache();
    cache.remember_login(Some("did-token"));

    let (nft, market) = test_contracts();
    let chain = ChainSession::with_cache(identity, nft, market, cache);

    assert_eq!(chain.identity().login_status(), LoginStatus::Unknown);
    assert!(chain.is_logged_magic().await);

    // the forced check overrules the hint and clears it
    assert!(!chain.refresh_login().await);
    assert!(!chain.is_logged_magic().await);
}
