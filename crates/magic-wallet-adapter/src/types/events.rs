/*
[INPUT]:  Identity provider lifecycle notifications
[OUTPUT]: Closed-set typed events and structured operation outcomes
[POS]:    Data layer - login flow event and outcome vocabulary
[UPDATE]: When the provider event set or outcome contract changes
*/

use serde::{Deserialize, Serialize};

/// Derived login state, `Unknown` until the first liveness check resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoginStatus {
    Unknown,
    LoggedIn,
    LoggedOut,
}

/// Lifecycle events emitted by one login flow.
///
/// `Done` and `Error` are terminal; everything else may repeat while the
/// flow is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvent {
    /// The one-time code was dispatched to the email address
    OtpSent,
    /// Submitted code was wrong; the flow stays open
    InvalidOtp,
    /// Submitted code expired; the flow stays open
    ExpiredOtp,
    /// Provider throttled the login attempt
    Throttled,
    /// Session token minted ahead of flow resolution
    IdTokenCreated(String),
    /// User dismissed the provider UI
    ClosedByUser,
    /// Flow resolved; `Some(token)` on success, `None` on empty result
    Done(Option<String>),
    /// Flow failed with a provider-reported reason
    Error(String),
}

impl LoginEvent {
    /// Terminal events settle the flow
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginEvent::Done(_) | LoginEvent::Error(_))
    }
}

/// Commands a caller can route into a pending flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowCommand {
    /// Submit a code for verification
    VerifyOtp(String),
    /// Abandon the pending verification
    Cancel,
}

/// Structured result of a verify submission. Expected failures are data,
/// not errors; callers never need try/catch for routine rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifySubmission {
    /// Code was forwarded to the provider
    Accepted,
    /// Code was rejected locally before reaching the provider
    Rejected {
        reason: VerifyRejectReason,
        detail: Option<String>,
    },
}

impl VerifySubmission {
    pub fn rejected(reason: VerifyRejectReason) -> Self {
        VerifySubmission::Rejected {
            reason,
            detail: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, VerifySubmission::Accepted)
    }
}

/// Why a verify submission was rejected without contacting the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyRejectReason {
    EmptyOtp,
    InvalidLength,
    NoFlow,
    Locked,
    EmitFailed,
    UnknownError,
}

/// Structured result of a cancellation request. A missing flow is a normal
/// condition here, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// No flow in progress; nothing to cancel
    NoFlow,
    /// Cancellation routed to the provider
    Cancelled,
    /// The flow exists but the cancellation could not be delivered
    Failed(String),
}

impl CancelOutcome {
    /// Status string as exposed to consumers
    pub fn status(&self) -> &'static str {
        match self {
            CancelOutcome::NoFlow => "no_flow",
            CancelOutcome::Cancelled => "success",
            CancelOutcome::Failed(_) => "error",
        }
    }

    /// Reason string, populated for the no-flow case
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            CancelOutcome::NoFlow => Some("not_initialized"),
            _ => None,
        }
    }
}
