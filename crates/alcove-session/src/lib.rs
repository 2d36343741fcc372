//! Session state for the profile page: who the page is showing, how it
//! got there, and the single-writer controller that keeps those answers
//! consistent under concurrency.
//!
//! The crate splits along the sync/async line:
//!
//! - [`Session`] ([`session`]) is the pure state machine. Every
//!   transition rule lives here and is tested with plain unit tests.
//! - [`SessionHandle`] / [`spawn_session`] ([`actor`]) wrap the machine
//!   in a tokio task. The task is the session's only writer; loaders and
//!   the message router send [`SessionEvent`]s in and watch
//!   [`SessionSnapshot`]s come out.
//!
//! Nothing in this crate verifies anything. By the time an event reaches
//! a session, its payload has already passed token verification; this
//! crate's job is to make sure verified facts are applied in a sane
//! order even when three tasks race to report them.

mod actor;
mod error;
mod session;

pub use actor::{SessionHandle, spawn_session};
pub use error::SessionError;
pub use session::{Session, SessionEvent, SessionSnapshot, SessionState};
