//! Payload vocabulary for Alcove's host boundary.
//!
//! This crate defines everything that crosses between the host application
//! and the page:
//!
//! - **Payload types** ([`UserProfile`], [`AvatarPayload`], [`Did`]): what
//!   verified events decode into.
//! - **Event union** ([`EventPayload`]): the tagged decoding of a token's
//!   claims, fail-closed for kinds we know, tolerant of kinds we don't.
//! - **Host descriptors** ([`BrowserDetails`], [`Platform`]) and the raw
//!   [`ChannelMessage`] envelope.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! This layer knows shapes, not trust. It never looks at a signature; the
//! token layer verifies first and only then asks this crate to decode:
//!
//! ```text
//! host (untrusted strings) → token layer (verify) → EventPayload → session
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod error;
mod event;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

// Everything is re-exported at the crate root so users write
// `use alcove_protocol::UserProfile` rather than reaching into submodules.

pub use error::ProtocolError;
pub use event::{EventPayload, KIND_AVATAR, KIND_DISCONNECTED, KIND_PROFILE};
pub use types::{
    AvatarPayload, BrowserDetails, ChannelMessage, Did, Platform, SignedToken,
    SocialHandle, UserProfile,
};
