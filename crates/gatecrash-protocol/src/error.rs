//! Error types for the protocol layer.
//!
//! Each crate in Gatecrash defines its own error enum, so an error's
//! type already tells you which layer it came from.

/// Errors that can occur while encoding or decoding protocol data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    /// Common causes: malformed JSON, missing required fields,
    /// truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The data parsed but violates a protocol rule — e.g. a
    /// difficulty outside `[1, 3]`.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
