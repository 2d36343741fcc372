//! The event union: what a verified token's claims can mean.
//!
//! Every host token carries a `type` discriminator string and a `data`
//! value whose shape depends on the discriminator. This module turns that
//! pair into a typed [`EventPayload`]: failing closed for kinds we know,
//! and degrading to [`EventPayload::Unknown`] for kinds we don't, so a
//! deployed page keeps working when the host starts emitting new events.

use serde_json::Value;

use crate::error::ProtocolError;
use crate::types::{AvatarPayload, UserProfile};

/// Wire discriminator for profile events.
pub const KIND_PROFILE: &str = "profile";
/// Wire discriminator for avatar events.
pub const KIND_AVATAR: &str = "avatar";
/// Wire discriminator for disconnect events.
pub const KIND_DISCONNECTED: &str = "disconnected";

/// A decoded host event.
///
/// Not a serde-derived tagged enum on purpose: derived tagging rejects
/// discriminators it has no variant for, and an unrecognized kind must
/// decode (to [`Unknown`](EventPayload::Unknown)) rather than error.
/// [`EventPayload::decode`] does the dispatch by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    /// A full profile for the current user.
    Profile(UserProfile),
    /// An avatar image for the current user.
    Avatar(AvatarPayload),
    /// The host ended the session. Carries no data; only the
    /// discriminator matters.
    Disconnected,
    /// An event kind this build does not understand. Expected to be
    /// skipped by routing, never treated as an error.
    Unknown {
        /// The discriminator as received.
        kind: String,
    },
}

impl EventPayload {
    /// Decode an event's `data` according to its `kind`.
    ///
    /// Known kinds validate `data` against their schema and fail closed:
    /// a `"profile"` whose data is missing `did` is an
    /// [`InvalidShape`](ProtocolError::InvalidShape) error, never a
    /// half-typed value.
    pub fn decode(kind: &str, data: Value) -> Result<Self, ProtocolError> {
        match kind {
            KIND_PROFILE => serde_json::from_value(data)
                .map(EventPayload::Profile)
                .map_err(|source| ProtocolError::InvalidShape {
                    kind: kind.to_owned(),
                    source,
                }),
            KIND_AVATAR => serde_json::from_value(data)
                .map(EventPayload::Avatar)
                .map_err(|source| ProtocolError::InvalidShape {
                    kind: kind.to_owned(),
                    source,
                }),
            // Whatever data a disconnect carries is ignored.
            KIND_DISCONNECTED => Ok(EventPayload::Disconnected),
            other => Ok(EventPayload::Unknown {
                kind: other.to_owned(),
            }),
        }
    }

    /// The discriminator for this event, as it appears on the wire.
    pub fn kind(&self) -> &str {
        match self {
            EventPayload::Profile(_) => KIND_PROFILE,
            EventPayload::Avatar(_) => KIND_AVATAR,
            EventPayload::Disconnected => KIND_DISCONNECTED,
            EventPayload::Unknown { kind } => kind,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Did;
    use serde_json::json;

    #[test]
    fn test_decode_profile_event() {
        let data = json!({
            "did": "did:x:1",
            "name": "Ada",
            "socials": [{"platform": "mastodon", "handle": "@ada"}]
        });
        let event = EventPayload::decode(KIND_PROFILE, data).unwrap();
        match event {
            EventPayload::Profile(p) => {
                assert_eq!(p.did, Did::from("did:x:1"));
                assert_eq!(p.name, "Ada");
                assert_eq!(p.socials.unwrap().len(), 1);
            }
            other => panic!("expected Profile, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_profile_with_bad_shape_fails_closed() {
        // A known kind with data that misses the schema is an error;
        // it must never come back as a partially-filled profile.
        let data = json!({"name": "Ada"}); // no did
        let result = EventPayload::decode(KIND_PROFILE, data);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidShape { ref kind, .. }) if kind == "profile"
        ));
    }

    #[test]
    fn test_decode_avatar_event() {
        let data = json!({"did": "did:x:1", "avatar": "data:image/png;base64,AAAA"});
        let event = EventPayload::decode(KIND_AVATAR, data).unwrap();
        assert!(matches!(event, EventPayload::Avatar(_)));
    }

    #[test]
    fn test_decode_avatar_with_wrong_type_fails_closed() {
        let data = json!({"did": "did:x:1", "avatar": 42});
        assert!(EventPayload::decode(KIND_AVATAR, data).is_err());
    }

    #[test]
    fn test_decode_disconnected_ignores_data() {
        // Disconnect carries no payload; any data shape is acceptable.
        let event = EventPayload::decode(
            KIND_DISCONNECTED,
            json!({"whatever": [1, 2, 3]}),
        )
        .unwrap();
        assert_eq!(event, EventPayload::Disconnected);

        let event = EventPayload::decode(KIND_DISCONNECTED, Value::Null).unwrap();
        assert_eq!(event, EventPayload::Disconnected);
    }

    #[test]
    fn test_decode_unknown_kind_is_not_an_error() {
        // Forward compatibility: new host event kinds must decode, not fail.
        let event =
            EventPayload::decode("reconnected", json!({"since": 0})).unwrap();
        assert_eq!(
            event,
            EventPayload::Unknown {
                kind: "reconnected".into()
            }
        );
    }

    #[test]
    fn test_kind_round_trips_through_decode() {
        let event = EventPayload::decode(KIND_DISCONNECTED, Value::Null).unwrap();
        assert_eq!(event.kind(), KIND_DISCONNECTED);

        let event = EventPayload::decode("mystery", Value::Null).unwrap();
        assert_eq!(event.kind(), "mystery");
    }
}
