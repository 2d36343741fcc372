//! Unified error type for the Alcove runtime.

use alcove_bridge::BridgeError;
use alcove_protocol::ProtocolError;
use alcove_session::SessionError;
use alcove_token::TokenError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `alcove` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum AlcoveError {
    /// A wire-level error (malformed channel message or event data).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A token verification error (signature, temporal claims, shape).
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A host bridge error (rejected call, host gone).
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A session error (controller shut down).
    #[error(transparent)]
    Session(#[from] SessionError),
}
