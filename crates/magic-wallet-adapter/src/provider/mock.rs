/*
[INPUT]:  Scripted OTP expectations and canned RPC responses
[OUTPUT]: In-process identity provider and transport for tests/examples
[POS]:    Provider layer - test doubles
[UPDATE]: When the provider trait or flow protocol changes
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{MagicError, Result};
use crate::provider::{LoginFlow, MagicProvider};
use crate::rpc::RpcTransport;
use crate::types::{FlowCommand, LoginEvent, UserMetadata};

/// In-process identity provider double.
///
/// Drives a real [`LoginFlow`] channel pair from a background task: emits
/// `OtpSent`, answers `VerifyOtp` commands against the expected code, and
/// settles with a token on match. Commands routed into flows are recorded
/// so tests can assert what did (or did not) reach the provider.
pub struct MockMagicProvider {
    expected_otp: String,
    token: String,
    email: String,
    logged_in: Arc<AtomicBool>,
    fail_liveness: bool,
    fail_login: bool,
    throttle: bool,
    commands: Arc<Mutex<Vec<FlowCommand>>>,
    transport: Arc<dyn RpcTransport>,
}

impl MockMagicProvider {
    pub fn new(expected_otp: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            expected_otp: expected_otp.into(),
            token: token.into(),
            email: String::new(),
            logged_in: Arc::new(AtomicBool::new(false)),
            fail_liveness: false,
            fail_login: false,
            throttle: false,
            commands: Arc::new(Mutex::new(Vec::new())),
            transport: Arc::new(StaticRpcTransport::new()),
        }
    }

    /// Replace the embedded RPC transport
    pub fn with_transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Start in the logged-in state
    pub fn with_logged_in(self, logged_in: bool) -> Self {
        self.logged_in.store(logged_in, Ordering::SeqCst);
        self
    }

    /// Make liveness checks fail
    pub fn with_failing_liveness(mut self) -> Self {
        self.fail_liveness = true;
        self
    }

    /// Make flow creation fail outright
    pub fn with_failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    /// Throttle every login attempt
    pub fn with_throttling(mut self) -> Self {
        self.throttle = true;
        self
    }

    /// Commands that reached the provider, across all flows
    pub fn recorded_commands(&self) -> Vec<FlowCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl MagicProvider for MockMagicProvider {
    async fn is_logged_in(&self) -> Result<bool> {
        if self.fail_liveness {
            return Err(MagicError::Provider("liveness check unavailable".to_string()));
        }
        Ok(self.logged_in.load(Ordering::SeqCst))
    }

    async fn logout(&self) -> Result<()> {
        if self.fail_liveness {
            return Err(MagicError::Provider("logout unavailable".to_string()));
        }
        self.logged_in.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn user_metadata(&self) -> Result<UserMetadata> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Err(MagicError::Provider("no active session".to_string()));
        }
        Ok(UserMetadata {
            email: Some(self.email.clone()),
            ..UserMetadata::default()
        })
    }

    async fn id_token(&self) -> Result<String> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Err(MagicError::Provider("no active session".to_string()));
        }
        Ok(self.token.clone())
    }

    async fn login_with_email_otp(&self, email: &str) -> Result<LoginFlow> {
        if self.fail_login {
            return Err(MagicError::Provider("login rejected".to_string()));
        }

        let (flow, mut controller) = LoginFlow::pair();
        let expected = self.expected_otp.clone();
        let token = self.token.clone();
        let logged_in = Arc::clone(&self.logged_in);
        let commands = Arc::clone(&self.commands);
        let throttle = self.throttle;
        let email = email.to_string();

        tokio::spawn(async move {
            if throttle {
                controller.emit(LoginEvent::Throttled);
                controller.emit(LoginEvent::Error("login throttled".to_string()));
                return;
            }

            debug!(email = %email, "mock provider dispatched OTP");
            controller.emit(LoginEvent::OtpSent);

            while let Some(command) = controller.next_command().await {
                commands.lock().unwrap().push(command.clone());
                match command {
                    FlowCommand::VerifyOtp(code) if code == expected => {
                        logged_in.store(true, Ordering::SeqCst);
                        controller.emit(LoginEvent::IdTokenCreated(token.clone()));
                        controller.emit(LoginEvent::Done(Some(token)));
                        return;
                    }
                    FlowCommand::VerifyOtp(_) => {
                        controller.emit(LoginEvent::InvalidOtp);
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
        Arc::clone(&self.transport)
    }
}

/// RPC transport answering from a fixed method table.
pub struct StaticRpcTransport {
    responses: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl StaticRpcTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Register the canned response for a method
    pub fn insert(&self, method: impl Into<String>, response: Value) {
        self.responses.lock().unwrap().insert(method.into(), response);
    }

    /// Method names requested so far, in order
    pub fn requested_methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    /// Full requests (method, params) so far, in order
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for StaticRpcTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcTransport for StaticRpcTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        self.responses
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .ok_or_else(|| MagicError::Rpc {
                code: -32601,
                message: format!("method {method} not scripted"),
            })
    }
}
