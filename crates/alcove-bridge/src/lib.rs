//! Host-capability abstraction for Alcove.
//!
//! The embedding application injects two capabilities into the page: the
//! [`HostBridge`] (request/response calls such as "hand me the profile
//! token") and the [`MessageChannel`] (a stream of cross-context
//! messages). Both are traits here, so the page core runs identically
//! against the real host, an in-process mock, or a test script.
//!
//! Bridge absence is a legitimate state, not an error. A page opened in an
//! ordinary browser simply has no capability object, and the session layer
//! falls back to onboarding. Nothing in this crate models "unavailable";
//! you either hold an implementation or you don't.
//!
//! Every token-bearing value these traits produce is untrusted
//! ([`SignedToken`]) until the token layer verifies it; the traits cannot
//! hand out decoded payloads by construction.

mod error;

pub use error::BridgeError;

use std::future::Future;

use alcove_protocol::{BrowserDetails, ChannelMessage, SignedToken};

/// The capability object the host injects into the page.
///
/// # Trait bounds
///
/// - `Send + Sync`: one bridge is shared by concurrent tasks (profile
///   and avatar load in parallel).
/// - `'static`: the bridge lives as long as the page.
///
/// Async methods are declared in the desugared `impl Future + Send` form
/// because their futures are awaited inside spawned tasks; implementors
/// just write `async fn`.
pub trait HostBridge: Send + Sync + 'static {
    /// Fetch the signed profile token.
    ///
    /// # Errors
    /// [`BridgeError`] when the host rejects the call. The caller decides
    /// severity: a failed profile fetch is a session error, a failed
    /// avatar fetch is not.
    fn profile_details(
        &self,
    ) -> impl Future<Output = Result<SignedToken, BridgeError>> + Send;

    /// Fetch the signed avatar token.
    ///
    /// `Ok(None)` means "no avatar configured", which is an answer, not a
    /// failure.
    fn avatar(
        &self,
    ) -> impl Future<Output = Result<Option<SignedToken>, BridgeError>> + Send;

    /// What the host reports about itself.
    ///
    /// Synchronous and descriptive only; never part of a trust decision.
    fn browser_details(&self) -> BrowserDetails;

    /// Ask the host to grant a permission.
    ///
    /// `Ok(false)` is a denial, not an error.
    fn request_permission(
        &self,
        permission: &str,
    ) -> impl Future<Output = Result<bool, BridgeError>> + Send;

    /// Ask the host to end the hosted session and dismiss the page.
    fn close(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

/// The host's asynchronous message channel.
///
/// Messages arrive in whatever order the host produces them; nothing is
/// promised about their timing relative to in-flight bridge calls. The
/// channel is consumed by exactly one router task, hence `&mut self` and
/// no `Sync` bound.
pub trait MessageChannel: Send + 'static {
    /// Receive the next message.
    ///
    /// Returns `None` once the channel has closed for good; the router
    /// treats that as teardown.
    fn recv(&mut self) -> impl Future<Output = Option<ChannelMessage>> + Send;
}

// =========================================================================
// Tests
// =========================================================================
