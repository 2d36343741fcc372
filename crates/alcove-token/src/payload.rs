//! The verified-payload witness type.
//!
//! [`VerifiedPayload`] has no public constructor. The only way to obtain
//! one is through [`TokenVerifier::verify`](crate::TokenVerifier::verify),
//! which makes "this data passed signature and claim validation" a fact
//! the type system enforces rather than a convention callers must
//! remember. Code that receives a `VerifiedPayload` never needs to ask
//! where it came from.

use alcove_protocol::EventPayload;

/// The result of successfully verifying a signed token.
///
/// Immutable after construction. Carries the decoded event plus the
/// temporal claims the token declared, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    event: EventPayload,
    issued_at: Option<u64>,
    expires_at: Option<u64>,
}

impl VerifiedPayload {
    /// Constructor is crate-private: only the verifier builds these.
    pub(crate) fn new(
        event: EventPayload,
        issued_at: Option<u64>,
        expires_at: Option<u64>,
    ) -> Self {
        Self {
            event,
            issued_at,
            expires_at,
        }
    }

    /// The event discriminator, as it appeared in the claims.
    pub fn kind(&self) -> &str {
        self.event.kind()
    }

    /// Borrow the decoded event.
    pub fn event(&self) -> &EventPayload {
        &self.event
    }

    /// Consume the payload and take the decoded event.
    pub fn into_event(self) -> EventPayload {
        self.event
    }

    /// The `iat` claim in seconds since the epoch, when the token had one.
    pub fn issued_at(&self) -> Option<u64> {
        self.issued_at
    }

    /// The `exp` claim in seconds since the epoch, when the token had one.
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_expose_what_was_constructed() {
        let payload = VerifiedPayload::new(
            EventPayload::Disconnected,
            Some(1_700_000_000),
            Some(1_700_000_600),
        );
        assert_eq!(payload.kind(), "disconnected");
        assert_eq!(payload.event(), &EventPayload::Disconnected);
        assert_eq!(payload.issued_at(), Some(1_700_000_000));
        assert_eq!(payload.expires_at(), Some(1_700_000_600));
        assert_eq!(payload.into_event(), EventPayload::Disconnected);
    }

    #[test]
    fn test_temporal_claims_are_optional() {
        let payload = VerifiedPayload::new(EventPayload::Disconnected, None, None);
        assert!(payload.issued_at().is_none());
        assert!(payload.expires_at().is_none());
    }
}
