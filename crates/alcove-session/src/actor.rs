//! The session controller: a single task that owns the [`Session`].
//!
//! Concurrency discipline in one sentence: loader tasks and the message
//! router SEND [`SessionEvent`]s, the controller task APPLIES them, and
//! everyone else WATCHES snapshots. No lock ever guards session state
//! because only one task can reach it.
//!
//! The handle side uses two channels with different shapes on purpose:
//!
//! - an `mpsc` for events, because every event matters and order matters
//! - a `watch` for snapshots, because observers only ever want the
//!   latest state, not the history of how it got there

use tokio::sync::{mpsc, watch};

use crate::error::SessionError;
use crate::session::{Session, SessionEvent, SessionSnapshot, SessionState};

/// Queue depth for the event channel. Events are tiny and the controller
/// applies them in microseconds; this only has to absorb a burst from
/// the two loader tasks and the router racing at startup.
const EVENT_QUEUE_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// SessionActor
// ---------------------------------------------------------------------------

/// The task that owns a [`Session`] and is its only writer.
struct SessionActor {
    session: Session,
    events: mpsc::Receiver<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionActor {
    /// Run until shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::debug!(state = %self.session.state(), "session controller started");

        while let Some(event) = self.events.recv().await {
            if matches!(event, SessionEvent::Shutdown) {
                tracing::debug!("session controller shutting down");
                break;
            }
            if self.session.apply(event) {
                // Publish only on observable change, so `changed()` on the
                // watch side wakes exactly once per real transition.
                // Send fails only when no receiver is left, which is fine.
                let _ = self.snapshots.send(self.session.snapshot());
            }
        }

        tracing::debug!(state = %self.session.state(), "session controller stopped");
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// A cheap-to-clone handle to the session controller.
///
/// Cloning hands the same session to another task; all clones feed the
/// one controller and observe the one snapshot stream. When the last
/// handle drops, the event channel closes and the controller exits.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Send one event to the controller.
    ///
    /// Fails with [`SessionError::Closed`] once the controller has shut
    /// down. For in-flight loads that resolve after unmount, that error
    /// is the guard: the result has nowhere to land, so the caller drops
    /// it.
    pub async fn apply(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.events
            .send(event)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// The startup profile load verified successfully.
    pub async fn profile_loaded(
        &self,
        profile: alcove_protocol::UserProfile,
    ) -> Result<(), SessionError> {
        self.apply(SessionEvent::ProfileLoaded(profile)).await
    }

    /// The startup profile load failed.
    pub async fn profile_failed(
        &self,
        message: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.apply(SessionEvent::ProfileFailed {
            message: message.into(),
        })
        .await
    }

    /// An avatar token verified successfully.
    pub async fn avatar_loaded(
        &self,
        payload: alcove_protocol::AvatarPayload,
    ) -> Result<(), SessionError> {
        self.apply(SessionEvent::AvatarLoaded(payload)).await
    }

    /// A channel message failed verification.
    pub async fn channel_violation(
        &self,
        message: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.apply(SessionEvent::ChannelViolation {
            message: message.into(),
        })
        .await
    }

    /// A verified disconnect arrived.
    pub async fn disconnected(&self) -> Result<(), SessionError> {
        self.apply(SessionEvent::Disconnected).await
    }

    /// Ask the controller to stop.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.apply(SessionEvent::Shutdown).await
    }

    /// Best-effort shutdown for contexts that cannot await, like `Drop`.
    /// If the queue is full or already closed the controller is either
    /// about to see other senders drop or is already gone.
    pub fn try_shutdown(&self) {
        let _ = self.events.try_send(SessionEvent::Shutdown);
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// The latest published lifecycle state.
    pub fn state(&self) -> SessionState {
        self.snapshots.borrow().state.clone()
    }

    /// Wait until the next snapshot is published.
    ///
    /// Fails with [`SessionError::Closed`] once the controller has
    /// stopped and no further snapshot can ever arrive.
    pub async fn changed(&mut self) -> Result<(), SessionError> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Whether the controller has shut down.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Resolves once the controller has shut down and will accept no
    /// further events.
    pub async fn closed(&self) {
        self.events.closed().await;
    }
}

/// Spawn a session controller and return its handle.
///
/// `inside_host` is whether a bridge capability was present at mount;
/// it decides between starting in `AwaitingProfile` and `NoHost`.
pub fn spawn_session(inside_host: bool) -> SessionHandle {
    let session = Session::new(inside_host);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

    let actor = SessionActor {
        session,
        events: event_rx,
        snapshots: snapshot_tx,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        events: event_tx,
        snapshots: snapshot_rx,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alcove_protocol::{AvatarPayload, Did, UserProfile};

    fn profile() -> UserProfile {
        UserProfile {
            did: Did::from("did:x:1"),
            name: "Ada".into(),
            socials: None,
        }
    }

    fn avatar() -> AvatarPayload {
        AvatarPayload {
            did: Did::from("did:x:1"),
            avatar: "data:image/png;base64,AAAA".into(),
        }
    }

    #[tokio::test]
    async fn test_spawn_without_host_starts_in_no_host() {
        let handle = spawn_session(false);
        let snap = handle.snapshot();
        assert_eq!(snap.state, SessionState::NoHost);
        assert!(!snap.inside_host);
    }

    #[tokio::test]
    async fn test_profile_loaded_publishes_ready_snapshot() {
        let mut handle = spawn_session(true);
        assert_eq!(handle.state(), SessionState::AwaitingProfile);

        handle.profile_loaded(profile()).await.unwrap();
        handle.changed().await.unwrap();

        let snap = handle.snapshot();
        assert_eq!(snap.state, SessionState::Ready);
        assert_eq!(snap.profile.unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_buffered_avatar_lands_with_profile_snapshot() {
        let mut handle = spawn_session(true);

        // Avatar first: no publish. Profile second: one publish carrying
        // both. `changed()` resolving with the avatar present proves the
        // buffer was applied before the snapshot went out.
        handle.avatar_loaded(avatar()).await.unwrap();
        handle.profile_loaded(profile()).await.unwrap();
        handle.changed().await.unwrap();

        let snap = handle.snapshot();
        assert_eq!(snap.state, SessionState::Ready);
        assert!(snap.avatar.is_some());
    }

    #[tokio::test]
    async fn test_apply_after_shutdown_is_closed() {
        let handle = spawn_session(true);
        handle.shutdown().await.unwrap();

        // The channel closes when the controller's loop breaks; wait for
        // that rather than sleeping.
        handle.closed().await;
        assert!(handle.is_closed());

        let err = handle.profile_loaded(profile()).await.unwrap_err();
        assert!(matches!(err, SessionError::Closed));
    }

    #[tokio::test]
    async fn test_changed_after_shutdown_is_closed() {
        let mut handle = spawn_session(true);
        handle.shutdown().await.unwrap();
        handle.closed().await;

        let err = handle.changed().await.unwrap_err();
        assert!(matches!(err, SessionError::Closed));
    }

    #[tokio::test]
    async fn test_clones_feed_the_same_session() {
        let writer = spawn_session(true);
        let mut observer = writer.clone();

        writer.profile_loaded(profile()).await.unwrap();
        observer.changed().await.unwrap();
        assert_eq!(observer.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_disconnect_publishes_cleared_snapshot() {
        let mut handle = spawn_session(true);
        handle.profile_loaded(profile()).await.unwrap();
        handle.changed().await.unwrap();

        handle.disconnected().await.unwrap();
        handle.changed().await.unwrap();

        let snap = handle.snapshot();
        assert_eq!(snap.state, SessionState::Disconnected);
        assert!(snap.profile.is_none());
        assert!(!snap.inside_host);
    }
}
