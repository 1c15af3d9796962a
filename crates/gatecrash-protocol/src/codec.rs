//! Codec for converting events (and anything serde-shaped) to bytes.
//!
//! The core hands [`Event`](crate::Event) values to connection
//! channels; the transport edge — whatever it is — turns them into
//! bytes with a [`Codec`]. Keeping the trait here means a binary codec
//! can be swapped in later without touching any other layer.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so a codec can be shared across the async
/// tasks that write to connections.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, which is what the event payloads want anyway —
/// clients consume them as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, EventKind, SessionId};

    #[test]
    fn test_json_codec_round_trips_an_event() {
        let codec = JsonCodec;
        let event = Event::new(
            EventKind::ResponseTimeout,
            SessionId(5),
            serde_json::json!({ "doorId": 12 }),
        );

        let bytes = codec.encode(&event).unwrap();
        let decoded: Event = codec.decode(&bytes).unwrap();

        assert_eq!(event, decoded);
    }

    #[test]
    fn test_json_codec_decode_garbage_fails() {
        let codec = JsonCodec;
        let result: Result<Event, _> = codec.decode(b"definitely not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_decode_wrong_shape_fails() {
        let codec = JsonCodec;
        let result: Result<Event, _> = codec.decode(br#"{"name": "hello"}"#);
        assert!(result.is_err());
    }
}
