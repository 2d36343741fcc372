//! Session errors.

use thiserror::Error;

/// Errors from interacting with the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The controller task has shut down and can no longer accept events
    /// or publish snapshots.
    ///
    /// This is the teardown guard for in-flight work: a profile or
    /// avatar load that resolves after unmount gets this error from
    /// [`SessionHandle::apply`](crate::SessionHandle::apply) and simply
    /// drops its result.
    #[error("session controller has shut down")]
    Closed,
}
