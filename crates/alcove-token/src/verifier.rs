//! Token verification: the page's single trust boundary.
//!
//! Every byte the host hands us, bridge call results and channel messages
//! alike, arrives as an unverified [`SignedToken`] and passes through
//! [`TokenVerifier::verify`] before anything downstream may look at it.
//! There is deliberately no other door.
//!
//! Verification is two-stage:
//!
//! 1. **Cryptographic**: signature first, then temporal claims. A token
//!    that is mis-signed (or signed under the wrong algorithm) is rejected
//!    before any claim is inspected: fail closed, not fail open.
//! 2. **Semantic**: the verified claims decode into the typed
//!    [`EventPayload`] union, fail-closed for known event kinds.
//!
//! Stage 2 never runs on bytes that did not survive stage 1.
//!
//! The verifier is a pure function of `(token, trusted key material)`: it
//! holds no mutable state and caches nothing, so the same token verifies
//! identically as often as callers like.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use alcove_protocol::{EventPayload, SignedToken};

use crate::TokenError;
use crate::payload::VerifiedPayload;

/// Default clock-skew leeway, in seconds, applied to `exp` and `nbf`.
///
/// Host and page run on the same device, so drift is small; the leeway
/// only papers over scheduling delay between minting and verifying.
pub const DEFAULT_LEEWAY_SECS: u64 = 5;

/// The claim shape every host token shares.
///
/// `type` discriminates the event, `data` is the kind-specific payload
/// (absent for data-free events like disconnect), and `iat`/`exp` are the
/// standard temporal claims. Deserialized only from claims whose signature
/// already checked out.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    iat: Option<u64>,
    #[serde(default)]
    exp: Option<u64>,
}

/// Verifies host tokens against pre-provisioned key material.
///
/// The algorithm is pinned at construction: a verifier built with
/// [`hs256`](TokenVerifier::hs256) rejects tokens whose header names
/// anything else, including `none`. There is no negotiation.
///
/// ```
/// use alcove_protocol::SignedToken;
/// use alcove_token::TokenVerifier;
///
/// let verifier = TokenVerifier::hs256(b"shared-secret");
/// let err = verifier.verify(&SignedToken::from("not.a.token")).unwrap_err();
/// println!("rejected: {err}");
/// ```
pub struct TokenVerifier {
    algorithm: Algorithm,
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// A verifier trusting an HMAC-SHA256 shared secret.
    pub fn hs256(secret: &[u8]) -> Self {
        Self::with_key(Algorithm::HS256, DecodingKey::from_secret(secret))
    }

    /// A verifier trusting an Ed25519 public key in PEM form.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidKey`] when the PEM does not contain a usable
    /// Ed25519 public key.
    pub fn eddsa_pem(public_key_pem: &[u8]) -> Result<Self, TokenError> {
        let key = DecodingKey::from_ed_pem(public_key_pem).map_err(|err| {
            TokenError::InvalidKey {
                detail: err.to_string(),
            }
        })?;
        Ok(Self::with_key(Algorithm::EdDSA, key))
    }

    fn with_key(algorithm: Algorithm, key: DecodingKey) -> Self {
        let mut validation = Validation::new(algorithm);
        // Temporal claims are enforced when present but none is required:
        // the default validation insists on `exp`, which host event tokens
        // do not always carry.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = DEFAULT_LEEWAY_SECS;
        // No audience claim in this contract.
        validation.validate_aud = false;
        Self {
            algorithm,
            key,
            validation,
        }
    }

    /// Override the clock-skew leeway (seconds) applied to `exp`/`nbf`.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    /// Verify a token and decode its claims.
    ///
    /// Checks, in order:
    ///
    /// 1. Structure and signature against the pinned algorithm and key
    /// 2. `exp` / `nbf`, when present, within the configured leeway
    /// 3. Claim shape: `type` plus a `data` matching that kind's schema
    ///
    /// Pure and idempotent; no caching, no side effects.
    ///
    /// # Errors
    ///
    /// See [`TokenError`]: one variant per way a token can fail, in the
    /// same order as the checks above.
    pub fn verify(&self, token: &SignedToken) -> Result<VerifiedPayload, TokenError> {
        // Stage 1: jsonwebtoken verifies the signature over the raw
        // compact form before it decodes or validates a single claim.
        let decoded =
            jsonwebtoken::decode::<RawClaims>(token.as_str(), &self.key, &self.validation)
                .map_err(map_decode_error)?;

        // Stage 2: semantic decode, on verified bytes only.
        let RawClaims {
            kind,
            data,
            iat,
            exp,
        } = decoded.claims;
        let event = EventPayload::decode(&kind, data).map_err(|err| {
            TokenError::MalformedClaims {
                detail: err.to_string(),
            }
        })?;

        Ok(VerifiedPayload::new(event, iat, exp))
    }
}

/// Collapse jsonwebtoken's error kinds into the page's taxonomy.
fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::Crypto(_) => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        // The claims section decoded but did not fit `RawClaims`.
        ErrorKind::Json(source) => TokenError::MalformedClaims {
            detail: source.to_string(),
        },
        ErrorKind::MissingRequiredClaim(claim) => TokenError::MalformedClaims {
            detail: format!("missing claim {claim:?}"),
        },
        // Wrong segment count, undecodable base64, and everything else
        // structural.
        _ => TokenError::Malformed,
    }
}

/// Key material never appears in debug output.
impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.validation.leeway)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alcove_protocol::Did;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"test-verification-secret";

    fn verifier() -> TokenVerifier {
        TokenVerifier::hs256(SECRET)
    }

    /// Mint a token with the trusted secret.
    fn mint(claims: &serde_json::Value) -> SignedToken {
        mint_with(SECRET, Algorithm::HS256, claims)
    }

    /// Mint a token with arbitrary key material and algorithm.
    fn mint_with(
        secret: &[u8],
        algorithm: Algorithm,
        claims: &serde_json::Value,
    ) -> SignedToken {
        let token = jsonwebtoken::encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        SignedToken(token)
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    /// Flip the first character of the claims segment.
    fn tamper(token: &SignedToken) -> SignedToken {
        let mut parts: Vec<String> =
            token.as_str().split('.').map(str::to_owned).collect();
        assert_eq!(parts.len(), 3, "compact token must have three segments");
        let first = parts[1].chars().next().unwrap();
        let replacement = if first == 'A' { 'B' } else { 'A' };
        parts[1] = format!("{replacement}{}", &parts[1][1..]);
        assert_ne!(first, replacement);
        SignedToken(parts.join("."))
    }

    fn profile_claims() -> serde_json::Value {
        json!({
            "type": "profile",
            "data": {
                "did": "did:x:1",
                "name": "Ada",
                "socials": [{"platform": "mastodon", "handle": "@ada"}]
            },
            "iat": unix_now(),
            "exp": unix_now() + 600
        })
    }

    // =====================================================================
    // Happy path
    // =====================================================================

    #[test]
    fn test_verify_round_trips_profile_claims() {
        let payload = verifier().verify(&mint(&profile_claims())).unwrap();

        assert_eq!(payload.kind(), "profile");
        match payload.event() {
            EventPayload::Profile(profile) => {
                assert_eq!(profile.did, Did::from("did:x:1"));
                assert_eq!(profile.name, "Ada");
                assert_eq!(profile.socials.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected Profile, got {other:?}"),
        }
        assert!(payload.issued_at().is_some());
        assert!(payload.expires_at().is_some());
    }

    #[test]
    fn test_verify_token_without_temporal_claims() {
        // `exp` is optional; a data-free disconnect token is the common case.
        let payload = verifier()
            .verify(&mint(&json!({"type": "disconnected"})))
            .unwrap();
        assert_eq!(payload.event(), &EventPayload::Disconnected);
        assert!(payload.issued_at().is_none());
        assert!(payload.expires_at().is_none());
    }

    #[test]
    fn test_verify_is_idempotent() {
        let token = mint(&profile_claims());
        let v = verifier();
        let first = v.verify(&token).unwrap();
        let second = v.verify(&token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_verify_unknown_kind_is_not_an_error() {
        let payload = verifier()
            .verify(&mint(&json!({"type": "reconnected", "data": {"since": 0}})))
            .unwrap();
        assert_eq!(payload.kind(), "reconnected");
        assert!(matches!(payload.event(), EventPayload::Unknown { .. }));
    }

    // =====================================================================
    // Signature failures: must reject before claims are looked at
    // =====================================================================

    #[test]
    fn test_verify_rejects_token_signed_with_wrong_key() {
        let token =
            mint_with(b"some-other-secret", Algorithm::HS256, &profile_claims());
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::BadSignature));
    }

    #[test]
    fn test_verify_rejects_tampered_claims_segment() {
        // The signature covers the full payload: one flipped character in
        // the claims segment must fail, even though the signature itself
        // is untouched.
        let token = tamper(&mint(&profile_claims()));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::BadSignature));
    }

    #[test]
    fn test_verify_rejects_unexpected_algorithm() {
        // Same key family, different algorithm in the header. Pinning
        // means this is a signature failure, not a negotiation.
        let token = mint_with(SECRET, Algorithm::HS384, &profile_claims());
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::BadSignature));
    }

    #[test]
    fn test_verify_rejects_expired_even_with_valid_signature() {
        let token = mint(&json!({
            "type": "profile",
            "data": {"did": "did:x:1", "name": "Ada"},
            "exp": unix_now() - 600
        }));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_verify_rejects_not_yet_valid() {
        let token = mint(&json!({
            "type": "profile",
            "data": {"did": "did:x:1", "name": "Ada"},
            "nbf": unix_now() + 600
        }));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::NotYetValid));
    }

    #[test]
    fn test_verify_tolerates_small_clock_skew() {
        // Two seconds past expiry is inside the default five-second leeway.
        let token = mint(&json!({
            "type": "disconnected",
            "exp": unix_now() - 2
        }));
        assert!(verifier().verify(&token).is_ok());
    }

    #[test]
    fn test_with_leeway_zero_disables_tolerance() {
        let token = mint(&json!({
            "type": "disconnected",
            "exp": unix_now() - 2
        }));
        let err = verifier().with_leeway(0).verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    // =====================================================================
    // Structural failures
    // =====================================================================

    #[test]
    fn test_verify_rejects_garbage() {
        let err = verifier()
            .verify(&SignedToken::from("not a token at all"))
            .unwrap_err();
        assert!(matches!(err, TokenError::Malformed));
    }

    #[test]
    fn test_verify_rejects_wrong_segment_count() {
        let err = verifier().verify(&SignedToken::from("a.b")).unwrap_err();
        assert!(matches!(err, TokenError::Malformed));
    }

    #[test]
    fn test_verify_rejects_empty_string() {
        let err = verifier().verify(&SignedToken::from("")).unwrap_err();
        assert!(matches!(err, TokenError::Malformed));
    }

    // =====================================================================
    // Claim-shape failures: signature fine, contents not
    // =====================================================================

    #[test]
    fn test_verify_rejects_claims_without_type() {
        let token = mint(&json!({"data": {"did": "did:x:1", "name": "Ada"}}));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::MalformedClaims { .. }));
    }

    #[test]
    fn test_verify_rejects_known_kind_with_bad_data_shape() {
        // Fail closed: a signed "profile" whose data misses the schema is
        // rejected, never returned half-typed.
        let token = mint(&json!({
            "type": "profile",
            "data": {"name": "Ada"}
        }));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::MalformedClaims { .. }));
    }

    // =====================================================================
    // Key material
    // =====================================================================

    #[test]
    fn test_eddsa_rejects_garbage_pem() {
        let err = TokenVerifier::eddsa_pem(b"not a pem").unwrap_err();
        assert!(matches!(err, TokenError::InvalidKey { .. }));
    }

    #[test]
    fn test_debug_never_prints_key_material() {
        let debug = format!("{:?}", verifier());
        assert!(debug.contains("HS256"));
        assert!(!debug.contains("test-verification-secret"));
    }
}
