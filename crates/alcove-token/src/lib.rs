//! Signed-token verification for Alcove.
//!
//! Everything the host sends (profile tokens, avatar tokens, channel
//! events) is a compact signed token, and this crate is the single gate
//! it must pass:
//!
//! - **[`TokenVerifier`]**: pinned-algorithm verification against
//!   pre-provisioned key material, signature before claims, fail closed.
//! - **[`VerifiedPayload`]**: the witness type proving a token passed;
//!   only the verifier can construct one.
//! - **[`TokenError`]**: one variant per way a token can fail.
//!
//! # Architecture
//!
//! ```text
//! SignedToken (untrusted) → TokenVerifier::verify → VerifiedPayload (trusted)
//! ```
//!
//! The crate is deterministic and side-effect-free: no clocks besides the
//! temporal-claim check, no I/O, no shared mutable state. That is what
//! makes the trust boundary independently testable.

mod error;
mod payload;
mod verifier;

pub use error::TokenError;
pub use payload::VerifiedPayload;
pub use verifier::{DEFAULT_LEEWAY_SECS, TokenVerifier};
