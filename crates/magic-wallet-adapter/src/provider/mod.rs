/*
[INPUT]:  Hosted identity provider capabilities
[OUTPUT]: Provider trait and typed login flow handles
[POS]:    Provider layer - consumed identity collaborator surface
[UPDATE]: When the provider capability set or flow protocol changes
*/

pub mod did;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::rpc::RpcTransport;
use crate::types::{FlowCommand, LoginEvent, UserMetadata};

pub use did::{DidClaim, decode_did_claim};
pub use mock::{MockMagicProvider, StaticRpcTransport};

/// Hosted passwordless-identity provider.
///
/// The trait mirrors what the adapter consumes: login liveness, profile and
/// token reads, logout, one email-OTP flow at a time, and the raw RPC
/// transport embedded in the provider handle (the provider signs chain
/// transactions off-device, so the transport is also the signing path).
#[async_trait]
pub trait MagicProvider: Send + Sync {
    /// Query whether a session is currently live
    async fn is_logged_in(&self) -> Result<bool>;

    /// Terminate the current session
    async fn logout(&self) -> Result<()>;

    /// Profile of the logged-in identity
    async fn user_metadata(&self) -> Result<UserMetadata>;

    /// Signed session token for the logged-in identity
    async fn id_token(&self) -> Result<String>;

    /// Start an email-OTP login flow
    async fn login_with_email_otp(&self, email: &str) -> Result<LoginFlow>;

    /// RPC transport embedded in the provider handle
    fn rpc_transport(&self) -> Arc<dyn RpcTransport>;
}

/// Caller-side handle to one in-progress login flow.
///
/// Events arrive on an unbounded channel and commands travel back the same
/// way; the flow settles when a terminal event arrives or the provider
/// drops its end.
pub struct LoginFlow {
    events: mpsc::UnboundedReceiver<LoginEvent>,
    commands: mpsc::UnboundedSender<FlowCommand>,
}

impl LoginFlow {
    /// Build the caller/provider channel pair. The [`FlowController`] is
    /// kept by the provider implementation driving the flow.
    pub fn pair() -> (LoginFlow, FlowController) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        (
            LoginFlow {
                events: event_rx,
                commands: command_tx,
            },
            FlowController {
                events: event_tx,
                commands: command_rx,
            },
        )
    }

    /// Next lifecycle event; `None` once the provider side is gone
    pub async fn next_event(&mut self) -> Option<LoginEvent> {
        self.events.recv().await
    }

    /// Sender used to route verify/cancel commands into the flow
    pub fn command_sender(&self) -> mpsc::UnboundedSender<FlowCommand> {
        self.commands.clone()
    }
}

/// Provider-side half of a login flow
pub struct FlowController {
    events: mpsc::UnboundedSender<LoginEvent>,
    commands: mpsc::UnboundedReceiver<FlowCommand>,
}

impl FlowController {
    /// Emit a lifecycle event toward the caller. Returns false once the
    /// caller has dropped the flow.
    pub fn emit(&self, event: LoginEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Next command routed into the flow
    pub async fn next_command(&mut self) -> Option<FlowCommand> {
        self.commands.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flow_pair_round_trip() {
        let (mut flow, mut controller) = LoginFlow::pair();

        assert!(controller.emit(LoginEvent::OtpSent));
        assert_eq!(flow.next_event().await, Some(LoginEvent::OtpSent));

        let sender = flow.command_sender();
        sender.send(FlowCommand::VerifyOtp("123456".to_string())).unwrap();
        assert_eq!(
            controller.next_command().await,
            Some(FlowCommand::VerifyOtp("123456".to_string()))
        );
    }

    #[tokio::test]
    async fn test_flow_settles_when_provider_drops() {
        let (mut flow, controller) = LoginFlow::pair();
        drop(controller);
        assert_eq!(flow.next_event().await, None);
    }
}
