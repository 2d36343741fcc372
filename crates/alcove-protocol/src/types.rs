//! Core payload types for Alcove's host boundary.
//!
//! Everything the host application hands the page eventually decodes into
//! one of the structures in this module. They are the shared vocabulary of
//! the bridge, the token layer, and the session layer.
//!
//! None of these types imply trust. Holding a [`UserProfile`] says nothing
//! about where it came from. Only the token layer is allowed to turn host
//! bytes into these values, and it does so after verification.

// Serde gives us the two traits every wire type needs:
//   - `Serialize`:   "I can be turned into JSON"
//   - `Deserialize`: "I can be built from JSON"
// The derive macros generate both from the struct definition.
use serde::{Deserialize, Serialize};

// `fmt` for Display (human-readable printing) and a custom Debug.
use std::fmt;

use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A decentralized identifier: the stable key for a user across payloads.
///
/// This is a "newtype wrapper": a plain `String` inside a named struct.
/// The wrapper costs nothing at runtime but buys two things:
///
/// 1. **Type safety**: an avatar's `Did` can be compared against a
///    profile's `Did`, but neither can be confused with an arbitrary
///    string such as a display name.
/// 2. **Intent**: `fn belongs_to(did: &Did)` reads better than
///    `fn belongs_to(s: &str)`.
///
/// `#[serde(transparent)]` keeps the JSON representation a plain string:
/// `Did("did:x:1")` serializes as `"did:x:1"`, not `{"0": "did:x:1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(pub String);

impl Did {
    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Display prints the raw identifier, so
/// `tracing::info!("profile loaded for {did}")` logs it as-is.
impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Did {
    fn from(s: &str) -> Self {
        Did(s.to_owned())
    }
}

impl From<String> for Did {
    fn from(s: String) -> Self {
        Did(s)
    }
}

// ---------------------------------------------------------------------------
// Signed tokens
// ---------------------------------------------------------------------------

/// An unverified compact token, exactly as the host produced it.
///
/// The string has the usual three-segment `header.claims.signature` shape,
/// but this type promises nothing about it: it may be garbage, expired, or
/// signed by the wrong key. It exists so signatures can say "this is host
/// input, treat it as untrusted" instead of passing bare strings around.
/// Verification is idempotent; the same token may be checked any number of
/// times (retries, tests).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(pub String);

impl SignedToken {
    /// Borrow the compact representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tokens are credentials. Debug prints the length, never the contents,
/// so a `{:?}` in a log line cannot leak a usable token.
impl fmt::Debug for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignedToken({} bytes)", self.0.len())
    }
}

impl From<&str> for SignedToken {
    fn from(s: &str) -> Self {
        SignedToken(s.to_owned())
    }
}

impl From<String> for SignedToken {
    fn from(s: String) -> Self {
        SignedToken(s)
    }
}

// ---------------------------------------------------------------------------
// Profile payloads
// ---------------------------------------------------------------------------

/// One social handle attached to a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialHandle {
    /// Platform name, e.g. `"mastodon"`. Free-form; chosen by the host.
    pub platform: String,
    /// The user's handle on that platform.
    pub handle: String,
}

/// The profile carried by a verified `"profile"` event.
///
/// Replaced wholesale on every successful profile load; the session layer
/// never patches individual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable unique key for the user. Avatar payloads must carry the same
    /// DID (see [`AvatarPayload`]).
    pub did: Did,
    /// Display name.
    pub name: String,
    /// Social handles in the order the host listed them. Absent and empty
    /// both mean "no socials"; hosts emit either.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socials: Option<Vec<SocialHandle>>,
}

/// The avatar carried by a verified `"avatar"` event.
///
/// Avatars have a lifecycle of their own: one may arrive before the
/// profile, after it, or never. The `did` ties the image back to the user
/// it was minted for, which is what lets the session layer refuse an
/// avatar belonging to someone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarPayload {
    /// Must match the DID of the profile being displayed.
    pub did: Did,
    /// Inline image data (typically a data URL or base64 blob). Opaque
    /// here; the presentation layer decides how to render it.
    pub avatar: String,
}

// ---------------------------------------------------------------------------
// Host descriptors
// ---------------------------------------------------------------------------

/// The mobile platform the host application runs on.
///
/// `#[serde(rename_all = "lowercase")]` matches the wire values `"ios"`
/// and `"android"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => f.write_str("ios"),
            Platform::Android => f.write_str("android"),
        }
    }
}

/// What the host reports about itself.
///
/// Descriptive only; nothing in here participates in a trust decision.
/// `#[serde(rename_all = "camelCase")]` matches the host's field naming
/// (`supportedPermissions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserDetails {
    /// Host application name.
    pub name: String,
    /// Host application version string.
    pub version: String,
    /// Platform the host runs on.
    pub platform: Platform,
    /// Permission names the host is willing to be asked for, e.g.
    /// `"camera"`. Order is not meaningful.
    pub supported_permissions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Channel messages
// ---------------------------------------------------------------------------

/// A raw cross-context message as delivered to the page.
///
/// The message channel is shared with arbitrary page scripts, so most
/// traffic has nothing to do with us. The rule: a message is relevant if
/// and only if it carries a `jwt` field; everything else is someone else's.
/// Unknown fields are ignored (serde's default), which is exactly the
/// tolerance a shared channel needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// The signed token, when present. Its verified claims decide what the
    /// message means; the surrounding message carries no meaning of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<SignedToken>,
    /// Origin of the sending context, when the channel reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ChannelMessage {
    /// Parse a message from its JSON text.
    ///
    /// Any JSON object parses; a message without a `jwt` field simply comes
    /// back with `jwt: None` and will be ignored downstream.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

// =========================================================================
// Tests
// =========================================================================
