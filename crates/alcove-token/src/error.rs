//! Error types for token verification.
//!
//! Every way a host token can fail to earn trust is a variant here. The
//! distinction matters to callers: a profile-load failure surfaces to the
//! session, an avatar failure is only logged, and a failure on the message
//! channel is treated as a trust violation, but all of them start life as
//! a `TokenError`.

/// Errors raised while verifying a signed token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The string is not a structurally valid compact token: wrong number
    /// of segments, or segments that do not decode.
    #[error("malformed token")]
    Malformed,

    /// The signature does not validate against the trusted key, or the
    /// header names an algorithm other than the pinned one. Both cases are
    /// reported identically so a probing sender learns nothing about which
    /// check tripped.
    #[error("token signature verification failed")]
    BadSignature,

    /// The `exp` claim is in the past, beyond the configured leeway.
    #[error("token expired")]
    Expired,

    /// The `nbf` claim is in the future, beyond the configured leeway.
    #[error("token not valid yet")]
    NotYetValid,

    /// Signature and temporal checks passed, but the claims do not decode
    /// into the expected shape: missing `type`, non-JSON claims, or a
    /// known event kind whose data fails its schema.
    #[error("malformed claims: {detail}")]
    MalformedClaims { detail: String },

    /// The trusted key material itself could not be loaded. Raised by
    /// verifier constructors, never by `verify`.
    #[error("invalid verification key: {detail}")]
    InvalidKey { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Display strings end up in session error messages shown to users,
    // so they must stay summaries: no key material, no raw claims.
    #[test]
    fn test_display_messages_are_short_summaries() {
        assert_eq!(TokenError::Malformed.to_string(), "malformed token");
        assert_eq!(
            TokenError::BadSignature.to_string(),
            "token signature verification failed"
        );
        assert_eq!(TokenError::Expired.to_string(), "token expired");
        assert_eq!(TokenError::NotYetValid.to_string(), "token not valid yet");
    }

    #[test]
    fn test_malformed_claims_carries_detail() {
        let err = TokenError::MalformedClaims {
            detail: "missing field `did`".into(),
        };
        assert!(err.to_string().contains("missing field `did`"));
    }
}
