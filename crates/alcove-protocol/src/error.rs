//! Error types for the payload layer.
//!
//! Each Alcove crate defines its own error enum. A `ProtocolError` always
//! means a payload-shape problem, never a bridge failure and never a
//! signature failure, which belong to their own layers.

/// Errors raised while decoding host payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A message's JSON text could not be parsed at all.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A known event kind carried data that does not match its schema.
    ///
    /// Fail-closed: a `"profile"` event whose data lacks `did` lands here
    /// instead of producing a partially-typed value.
    #[error("malformed {kind:?} event data: {source}")]
    InvalidShape {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
