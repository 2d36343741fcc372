//! Session types: the state machine behind the profile page.
//!
//! A "session" is the page's record of its relationship with the host:
//! - WHETHER a host is present at all (`NoHost` vs everything else)
//! - WHAT the page knows (profile, avatar)
//! - WHERE in the lifecycle it stands (waiting, ready, failed, ended)
//!
//! Everything in this module is synchronous and pure, with no channels
//! or clocks in sight. The async half lives in the actor (`actor.rs`),
//! which owns exactly one [`Session`] and feeds it events. Keeping the
//! machine pure is what makes every transition testable with plain
//! `#[test]` functions.

use serde::{Deserialize, Serialize};

use alcove_protocol::{AvatarPayload, UserProfile};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of the page's session.
///
/// ```text
///             host detected
///   NoHost ──────────────────→ AwaitingProfile ──(profile verified)──→ Ready
///     │                              │                                   │
///     │ no host: onboarding,         │ profile load failed               │
///     │ terminal until reload        ▼                                   │
///     │                            Error ←──(channel trust violation)────┘
///     │                              │
///     │     verified disconnect (from AwaitingProfile, Ready, or Error)
///     └── equivalent presentation ── Disconnected
/// ```
///
/// - **NoHost**: no bridge capability was present at mount. The page
///   shows onboarding; nothing further happens without a reload.
/// - **AwaitingProfile**: a host is present and the profile load is in
///   flight. There is no timeout; a hung bridge call parks the session
///   here indefinitely, a known gap.
/// - **Ready**: a verified profile is on display.
/// - **Error**: the profile could not be established, or a message on the
///   channel failed verification. The only way out is a verified
///   disconnect or a full reload; there is no automatic retry.
/// - **Disconnected**: the host ended the session. Profile and avatar are
///   cleared and the presentation is equivalent to having no host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    NoHost,
    AwaitingProfile,
    Ready,
    Error {
        /// Human-readable summary, safe to render. Detail stays in logs.
        message: String,
    },
    Disconnected,
}

impl SessionState {
    /// Returns `true` while the startup profile load may still resolve.
    pub fn is_awaiting_profile(&self) -> bool {
        matches!(self, Self::AwaitingProfile)
    }

    /// Returns `true` if a verified avatar would be accepted (directly or
    /// buffered) in this state.
    pub fn accepts_avatar(&self) -> bool {
        matches!(
            self,
            Self::AwaitingProfile | Self::Ready | Self::Error { .. }
        )
    }

    /// Returns `true` once the session has ended for good.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoHost => write!(f, "NoHost"),
            Self::AwaitingProfile => write!(f, "AwaitingProfile"),
            Self::Ready => write!(f, "Ready"),
            Self::Error { message } => write!(f, "Error({message})"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Everything that can happen to a session.
///
/// Loader tasks and the message router never touch session fields; they
/// describe what happened with one of these and the controller applies
/// it. That funnel is the single-writer guarantee.
#[derive(Debug)]
pub enum SessionEvent {
    /// The startup profile load verified successfully.
    ProfileLoaded(UserProfile),

    /// The startup profile load failed, by bridge rejection or a token
    /// that did not verify. Carries the renderable summary only.
    ProfileFailed { message: String },

    /// An avatar token verified successfully.
    AvatarLoaded(AvatarPayload),

    /// A message on the host channel carried a token that failed
    /// verification. Harder than an avatar failure: an unverifiable
    /// message on an open channel is a trust violation, not noise.
    ChannelViolation { message: String },

    /// A verified disconnect event arrived.
    Disconnected,

    /// Stop the controller. Sent on unmount and by explicit close.
    Shutdown,
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// The observable view of a session, published after every change.
///
/// This is what the presentation layer renders from. It never contains
/// data that skipped verification: the only writer is the controller,
/// and the controller only accepts typed events built from verified
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current lifecycle state.
    pub state: SessionState,
    /// The verified profile, when one is established.
    pub profile: Option<UserProfile>,
    /// Inline avatar image data, when a matching avatar verified.
    pub avatar: Option<String>,
    /// Whether the page believes it is running inside the host. Starts
    /// true when a bridge was present at mount; cleared on disconnect.
    pub inside_host: bool,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The state machine itself. One exists per page, owned by the controller
/// task; nothing else ever mutates it.
///
/// Transition methods return `true` when the observable snapshot changed,
/// which is the controller's cue to publish. Events that arrive in a
/// state where they do not apply (a late avatar after disconnect, a
/// second error) are logged and dropped rather than treated as failures:
/// with in-flight loads racing an open channel, "too late, ignore" is a
/// normal outcome.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    inside_host: bool,
    profile: Option<UserProfile>,
    avatar: Option<AvatarPayload>,
    /// An avatar that verified before the profile did. Held until the
    /// profile lands, then cross-checked and either promoted or dropped.
    pending_avatar: Option<AvatarPayload>,
}

impl Session {
    /// A fresh session. `inside_host` is the one fact known at mount:
    /// whether the bridge capability exists.
    pub fn new(inside_host: bool) -> Self {
        let state = if inside_host {
            SessionState::AwaitingProfile
        } else {
            SessionState::NoHost
        };
        Self {
            state,
            inside_host,
            profile: None,
            avatar: None,
            pending_avatar: None,
        }
    }

    /// Apply one event. Returns `true` if the snapshot changed.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::ProfileLoaded(profile) => self.profile_loaded(profile),
            SessionEvent::ProfileFailed { message } => self.profile_failed(message),
            SessionEvent::AvatarLoaded(payload) => self.avatar_loaded(payload),
            SessionEvent::ChannelViolation { message } => {
                self.channel_violation(message)
            }
            SessionEvent::Disconnected => self.disconnected(),
            // The actor stops its loop on Shutdown before applying it;
            // reaching here is a no-op.
            SessionEvent::Shutdown => false,
        }
    }

    /// A verified profile arrived.
    ///
    /// From `AwaitingProfile` this is the transition to `Ready`. A
    /// profile arriving while already `Ready` replaces the old one
    /// wholesale; an avatar that no longer matches the new DID is
    /// dropped rather than shown against the wrong identity.
    fn profile_loaded(&mut self, profile: UserProfile) -> bool {
        match self.state {
            SessionState::AwaitingProfile => {
                tracing::info!(did = %profile.did, "profile verified, session ready");
                self.profile = Some(profile);
                self.state = SessionState::Ready;
                self.adopt_pending_avatar();
                true
            }
            SessionState::Ready => {
                tracing::info!(did = %profile.did, "profile replaced");
                if let Some(avatar) = &self.avatar {
                    if avatar.did != profile.did {
                        tracing::warn!(
                            avatar_did = %avatar.did,
                            profile_did = %profile.did,
                            "avatar no longer matches profile, dropping"
                        );
                        self.avatar = None;
                    }
                }
                self.profile = Some(profile);
                self.adopt_pending_avatar();
                true
            }
            ref state => {
                tracing::debug!(%state, "profile result ignored in this state");
                false
            }
        }
    }

    /// The startup profile load failed. Only meaningful while the load
    /// could still be pending.
    fn profile_failed(&mut self, message: String) -> bool {
        match self.state {
            SessionState::AwaitingProfile => {
                tracing::error!(%message, "profile load failed");
                self.state = SessionState::Error { message };
                true
            }
            ref state => {
                tracing::debug!(%state, %message, "profile failure ignored in this state");
                false
            }
        }
    }

    /// A verified avatar arrived.
    ///
    /// Never drives a state transition. Before the profile exists the
    /// avatar is buffered; afterwards it must carry the profile's DID or
    /// it is refused, since an avatar minted for someone else is not
    /// cosmetic.
    fn avatar_loaded(&mut self, payload: AvatarPayload) -> bool {
        if !self.state.accepts_avatar() {
            tracing::debug!(state = %self.state, "avatar ignored in this state");
            return false;
        }
        match &self.profile {
            None => {
                tracing::debug!(did = %payload.did, "avatar verified before profile, holding");
                self.pending_avatar = Some(payload);
                false
            }
            Some(profile) if profile.did == payload.did => {
                tracing::info!(did = %payload.did, "avatar verified");
                self.avatar = Some(payload);
                true
            }
            Some(profile) => {
                tracing::warn!(
                    avatar_did = %payload.did,
                    profile_did = %profile.did,
                    "avatar DID does not match profile, rejecting"
                );
                false
            }
        }
    }

    /// A channel message failed verification.
    ///
    /// Surfaces as a session error from `AwaitingProfile` or `Ready`.
    /// Profile and avatar stay as last known good; only a verified
    /// disconnect clears them. The first error wins; later ones are
    /// logged but do not rewrite the message on screen.
    fn channel_violation(&mut self, message: String) -> bool {
        match self.state {
            SessionState::AwaitingProfile | SessionState::Ready => {
                tracing::error!(%message, "unverifiable message on host channel");
                self.state = SessionState::Error { message };
                true
            }
            SessionState::Error { .. } => {
                tracing::warn!(%message, "further channel violation while already in error");
                false
            }
            ref state => {
                tracing::debug!(%state, "channel violation ignored in this state");
                false
            }
        }
    }

    /// A verified disconnect arrived. Clears everything and leaves the
    /// page in the host-absent-equivalent presentation.
    fn disconnected(&mut self) -> bool {
        match self.state {
            SessionState::AwaitingProfile
            | SessionState::Ready
            | SessionState::Error { .. } => {
                tracing::info!("host disconnected, clearing session");
                self.profile = None;
                self.avatar = None;
                self.pending_avatar = None;
                self.inside_host = false;
                self.state = SessionState::Disconnected;
                true
            }
            ref state => {
                tracing::debug!(%state, "disconnect ignored in this state");
                false
            }
        }
    }

    /// Promote a buffered avatar once the profile exists, dropping it if
    /// the DIDs disagree.
    fn adopt_pending_avatar(&mut self) {
        let Some(pending) = self.pending_avatar.take() else {
            return;
        };
        let Some(profile) = &self.profile else {
            self.pending_avatar = Some(pending);
            return;
        };
        if pending.did == profile.did {
            tracing::info!(did = %pending.did, "buffered avatar adopted");
            self.avatar = Some(pending);
        } else {
            tracing::warn!(
                avatar_did = %pending.did,
                profile_did = %profile.did,
                "buffered avatar DID does not match profile, dropping"
            );
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The verified profile, when established.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// The accepted avatar's image data, when one verified.
    pub fn avatar_data(&self) -> Option<&str> {
        self.avatar.as_ref().map(|a| a.avatar.as_str())
    }

    /// Whether the page currently believes it runs inside the host.
    pub fn is_inside_host(&self) -> bool {
        self.inside_host
    }

    /// The observable view of this session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            profile: self.profile.clone(),
            avatar: self.avatar.as_ref().map(|a| a.avatar.clone()),
            inside_host: self.inside_host,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
