//! # Alcove
//!
//! Verified profile page runtime for host-embedded webviews.
//!
//! Alcove is the trust core of a profile page that runs inside a mobile
//! host's webview. The host hands the page signed tokens over a bridge
//! and a message channel; Alcove verifies every token, drives a session
//! state machine from the verified events, and publishes snapshots for
//! the presentation layer to render. Nothing unverified ever reaches
//! session state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alcove::prelude::*;
//!
//! // Implement HostBridge and MessageChannel for your webview
//! // bindings, then:
//! // let page = AlcovePageBuilder::new(TokenVerifier::hs256(secret))
//! //     .allow_origin("https://pages.host.example")
//! //     .mount(bridge, channel);
//! // let mut session = page.session();
//! // session.changed().await?;
//! ```

mod error;
mod page;
mod router;

pub use error::AlcoveError;
pub use page::{AlcovePage, AlcovePageBuilder};
pub use router::EventRouter;

/// The working set for embedding a page: the page itself plus the types
/// that cross its API from the sub-crates.
pub mod prelude {
    pub use alcove_bridge::{BridgeError, HostBridge, MessageChannel};
    pub use alcove_protocol::{
        AvatarPayload, BrowserDetails, ChannelMessage, Did, EventPayload, Platform, SignedToken,
        SocialHandle, UserProfile,
    };
    pub use alcove_session::{SessionError, SessionHandle, SessionSnapshot, SessionState};
    pub use alcove_token::{TokenError, TokenVerifier, VerifiedPayload};

    pub use crate::error::AlcoveError;
    pub use crate::page::{AlcovePage, AlcovePageBuilder};
    pub use crate::router::EventRouter;
}
