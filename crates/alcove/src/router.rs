//! Routes host channel messages into the session.
//!
//! The channel is the host's push surface: anything able to post a
//! message into the webview can reach it, which is why every message
//! goes through the same two gates before it can touch session state:
//!
//!   1. origin allow-list (when configured): cheap, runs first, and a
//!      filtered message is never even token-inspected
//!   2. token verification: the only path by which a message becomes
//!      a session event
//!
//! The split below mirrors the session crate: [`classify`] is the pure
//! decision function, [`EventRouter::run`] is the loop that applies its
//! verdicts.

use std::sync::Arc;

use alcove_bridge::MessageChannel;
use alcove_protocol::{ChannelMessage, EventPayload};
use alcove_session::{SessionError, SessionHandle};
use alcove_token::TokenVerifier;

/// What a channel message means for the session, decided before any
/// session state is touched.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RouteAction {
    /// Nothing for the session: filtered origin, no token, or a verified
    /// event the channel has no handler for.
    Ignore,
    /// A verified disconnect.
    Disconnect,
    /// The message carried a token that failed verification.
    Violation { message: String },
}

/// Decide what to do with one channel message.
///
/// Gate order matters: a message from an unlisted origin is dropped
/// before its token is looked at, so a filtered sender cannot even
/// trigger a violation.
pub(crate) fn classify(
    verifier: &TokenVerifier,
    allowed_origins: &[String],
    message: ChannelMessage,
) -> RouteAction {
    if !origin_allowed(allowed_origins, message.origin.as_deref()) {
        tracing::debug!(origin = ?message.origin, "message from unlisted origin ignored");
        return RouteAction::Ignore;
    }

    let Some(token) = message.jwt else {
        tracing::debug!("channel message without token ignored");
        return RouteAction::Ignore;
    };

    match verifier.verify(&token) {
        Ok(payload) => match payload.into_event() {
            EventPayload::Disconnected => {
                tracing::info!("verified disconnect received on channel");
                RouteAction::Disconnect
            }
            other => {
                // Profile and avatar only arrive via bridge requests;
                // a verified copy on the channel has no handler.
                tracing::debug!(kind = other.kind(), "verified channel event has no handler");
                RouteAction::Ignore
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "channel message failed verification");
            RouteAction::Violation {
                message: err.to_string(),
            }
        }
    }
}

/// `true` if a message with this origin may be routed. An empty
/// allow-list admits everything, including messages with no origin.
fn origin_allowed(allowed: &[String], origin: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match origin {
        Some(origin) => allowed.iter().any(|a| a == origin),
        None => false,
    }
}

/// The task that drains the host channel into the session.
///
/// One router runs per mounted page. It stops when the channel closes
/// (host tore down its side) or when the session controller shuts down.
pub struct EventRouter<C: MessageChannel> {
    channel: C,
    verifier: Arc<TokenVerifier>,
    session: SessionHandle,
    allowed_origins: Vec<String>,
}

impl<C: MessageChannel> EventRouter<C> {
    pub fn new(
        channel: C,
        verifier: Arc<TokenVerifier>,
        session: SessionHandle,
        allowed_origins: Vec<String>,
    ) -> Self {
        Self {
            channel,
            verifier,
            session,
            allowed_origins,
        }
    }

    /// Drain messages until the channel or the session closes.
    pub async fn run(mut self) {
        tracing::debug!("event router started");

        while let Some(message) = self.channel.recv().await {
            let action = classify(&self.verifier, &self.allowed_origins, message);
            let result = match action {
                RouteAction::Ignore => Ok(()),
                RouteAction::Disconnect => self.session.disconnected().await,
                RouteAction::Violation { message } => {
                    self.session.channel_violation(message).await
                }
            };
            if matches!(result, Err(SessionError::Closed)) {
                tracing::debug!("session closed, event router stopping");
                return;
            }
        }

        tracing::debug!("host channel closed, event router stopping");
    }
}

// =========================================================================
// Tests
// =========================================================================
