//! `AlcovePage`: mounting, loading, and tearing down a profile page.
//!
//! Mounting wires four pieces together:
//!
//! ```text
//!   bridge.profile_details() ──verify──┐
//!   bridge.avatar()          ──verify──┤
//!                                      ├──► session controller ──► snapshots
//!   host channel ──► EventRouter ──────┘
//! ```
//!
//! The two loads and the router run as independent tasks. None of them
//! ever writes session state directly; they send events, and the
//! controller is the single writer. A load that resolves after the page
//! is gone finds the controller closed and drops its result, which is
//! the whole teardown story for in-flight work.

use std::sync::Arc;

use alcove_bridge::{BridgeError, HostBridge, MessageChannel};
use alcove_protocol::{BrowserDetails, EventPayload};
use alcove_session::{SessionHandle, SessionSnapshot, SessionState, spawn_session};
use alcove_token::TokenVerifier;
use tokio::task::JoinHandle;

use crate::AlcoveError;
use crate::router::EventRouter;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for mounting an [`AlcovePage`].
///
/// # Example
///
/// ```rust,ignore
/// use alcove::prelude::*;
///
/// let page = AlcovePageBuilder::new(TokenVerifier::hs256(secret))
///     .allow_origin("https://pages.host.example")
///     .mount(bridge, channel);
/// ```
pub struct AlcovePageBuilder {
    verifier: TokenVerifier,
    allowed_origins: Vec<String>,
}

impl AlcovePageBuilder {
    /// Creates a builder around the verifier every token must pass.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier,
            allowed_origins: Vec::new(),
        }
    }

    /// Adds an origin to the channel allow-list.
    ///
    /// With no origins listed, messages from any origin are routed.
    /// With one or more listed, a message must carry a listed origin or
    /// it is dropped before its token is even inspected.
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Mounts the page inside a host.
    ///
    /// Spawns the session controller, the channel router, and the
    /// profile and avatar loads. The returned page is immediately
    /// observable; the session starts in `AwaitingProfile` and moves
    /// when the loads resolve.
    pub fn mount<B, C>(self, bridge: B, channel: C) -> AlcovePage<B>
    where
        B: HostBridge,
        C: MessageChannel,
    {
        let verifier = Arc::new(self.verifier);
        let bridge = Arc::new(bridge);
        let session = spawn_session(true);

        let router = EventRouter::new(
            channel,
            Arc::clone(&verifier),
            session.clone(),
            self.allowed_origins,
        );
        let router_task = tokio::spawn(router.run());

        tokio::spawn(load_profile(
            Arc::clone(&bridge),
            Arc::clone(&verifier),
            session.clone(),
        ));
        tokio::spawn(load_avatar(
            Arc::clone(&bridge),
            Arc::clone(&verifier),
            session.clone(),
        ));

        tracing::info!("page mounted inside host");
        AlcovePage {
            bridge: Some(bridge),
            session,
            router: Some(router_task),
        }
    }

    /// Mounts the page with no host capability present.
    ///
    /// Nothing is loaded and no router runs; the session starts in
    /// `NoHost` and stays there. This is the standalone-browser path.
    pub fn mount_without_host<B: HostBridge>(self) -> AlcovePage<B> {
        tracing::info!("no host capability, mounting without host");
        AlcovePage {
            bridge: None,
            session: spawn_session(false),
            router: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// A mounted profile page.
///
/// Holds the session handle, the host bridge (when one was present at
/// mount), and the router task. Dropping the page aborts the router and
/// asks the controller to stop; [`close`](Self::close) additionally
/// tells the host to dismiss the webview.
pub struct AlcovePage<B: HostBridge> {
    bridge: Option<Arc<B>>,
    session: SessionHandle,
    router: Option<JoinHandle<()>>,
}

impl<B: HostBridge> AlcovePage<B> {
    /// Creates a builder.
    pub fn builder(verifier: TokenVerifier) -> AlcovePageBuilder {
        AlcovePageBuilder::new(verifier)
    }

    /// A session handle for observing state changes.
    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    /// The latest session snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// The latest lifecycle state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Host surface details, when a host is present.
    pub fn browser_details(&self) -> Option<BrowserDetails> {
        self.bridge.as_ref().map(|b| b.browser_details())
    }

    /// Asks the host to grant a permission. `Ok(true)` means granted.
    ///
    /// Fails with [`BridgeError::HostGone`] when the page was mounted
    /// without a host.
    pub async fn request_permission(&self, permission: &str) -> Result<bool, AlcoveError> {
        let bridge = self.bridge.as_ref().ok_or(BridgeError::HostGone)?;
        Ok(bridge.request_permission(permission).await?)
    }

    /// Closes the page: stops the session controller and, when a host
    /// is present, asks it to dismiss the webview.
    pub async fn close(&self) -> Result<(), AlcoveError> {
        // A controller that already stopped is fine here.
        let _ = self.session.shutdown().await;
        if let Some(bridge) = &self.bridge {
            bridge.close().await?;
        }
        Ok(())
    }
}

impl<B: HostBridge> Drop for AlcovePage<B> {
    fn drop(&mut self) {
        if let Some(router) = self.router.take() {
            router.abort();
        }
        self.session.try_shutdown();
    }
}

// ---------------------------------------------------------------------------
// Startup loads
// ---------------------------------------------------------------------------

/// Fetch and verify the profile token.
///
/// The profile is the page's reason to exist, so every failure here is
/// reported to the session and surfaces as the error state.
async fn load_profile<B: HostBridge>(
    bridge: Arc<B>,
    verifier: Arc<TokenVerifier>,
    session: SessionHandle,
) {
    let token = match bridge.profile_details().await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(error = %err, "host rejected profile request");
            report_profile_failure(&session, err.to_string()).await;
            return;
        }
    };

    match verifier.verify(&token) {
        Ok(payload) => match payload.into_event() {
            EventPayload::Profile(profile) => {
                if session.profile_loaded(profile).await.is_err() {
                    tracing::debug!("profile resolved after teardown, dropped");
                }
            }
            other => {
                tracing::error!(kind = other.kind(), "profile endpoint returned wrong event kind");
                report_profile_failure(
                    &session,
                    format!("unexpected {:?} event from profile request", other.kind()),
                )
                .await;
            }
        },
        Err(err) => {
            tracing::error!(error = %err, "profile token failed verification");
            report_profile_failure(&session, err.to_string()).await;
        }
    }
}

async fn report_profile_failure(session: &SessionHandle, message: String) {
    if session.profile_failed(message).await.is_err() {
        tracing::debug!("profile failure resolved after teardown, dropped");
    }
}

/// Fetch and verify the avatar token.
///
/// The avatar is decoration. A host with no avatar, a rejected request,
/// or a token that fails verification all leave the page exactly as it
/// was; nothing here can put the session into the error state.
async fn load_avatar<B: HostBridge>(
    bridge: Arc<B>,
    verifier: Arc<TokenVerifier>,
    session: SessionHandle,
) {
    let token = match bridge.avatar().await {
        Ok(Some(token)) => token,
        Ok(None) => {
            tracing::debug!("no avatar configured");
            return;
        }
        Err(err) => {
            tracing::warn!(error = %err, "host rejected avatar request");
            return;
        }
    };

    match verifier.verify(&token) {
        Ok(payload) => match payload.into_event() {
            EventPayload::Avatar(avatar) => {
                if session.avatar_loaded(avatar).await.is_err() {
                    tracing::debug!("avatar resolved after teardown, dropped");
                }
            }
            other => {
                tracing::warn!(kind = other.kind(), "avatar endpoint returned wrong event kind");
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "avatar token failed verification");
        }
    }
}
