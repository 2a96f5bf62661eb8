//! Error types for the protocol layer.
//!
//! Every failure to turn bytes into a request (or a request into bytes)
//! lands here. A `ProtocolError` on the server side always means the
//! frame boundary can no longer be trusted, so the session that saw it
//! closes its connection.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into MessagePack).
    #[cfg(feature = "msgpack")]
    #[error("encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// The operation tag is not one of the known operations.
    #[error("unknown operation tag {0}")]
    UnknownTag(u32),

    /// An operation name could not be parsed.
    #[error("unknown operation name {0:?}")]
    UnknownOperation(String),

    /// The payload bytes don't hold exactly one value of the expected
    /// shape: truncated, trailing bytes, wrong arity, or out-of-range
    /// integers.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A payload is larger than a frame can carry.
    ///
    /// Raised when encoding an oversized request and when a peer declares
    /// a payload length beyond the frame capacity.
    #[error("payload of {len} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge { len: usize, max: usize },
}
