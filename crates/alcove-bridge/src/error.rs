/// Errors raised by host bridge calls.
///
/// Bridge *absence* is deliberately not a variant: a page opened outside
/// the host never constructs bridge calls at all, and "no host" is a
/// session state, not a failure.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The host rejected the call.
    #[error("host rejected {call}: {reason}")]
    Rejected {
        /// The bridge method that failed.
        call: &'static str,
        /// Host-provided reason, if any.
        reason: String,
    },

    /// The host went away mid-call (webview torn down, app killed).
    #[error("host is gone")]
    HostGone,
}
