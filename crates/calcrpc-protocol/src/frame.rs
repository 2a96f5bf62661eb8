//! Request and response frame layout.
//!
//! ```text
//! request:  [tag: u32 BE][payload_len: u32 BE][payload: msgpack (a, b)]
//! response: [msgpack (result,)]
//! ```
//!
//! A request never exceeds [`MAX_FRAME_SIZE`] bytes. Clients transmit it
//! zero-padded to exactly that size (see [`pad_frame`]); the server only
//! ever reads `HEADER_LEN + payload_len` bytes per request. A response
//! has no length prefix: the client decodes it as soon as enough bytes
//! have arrived to hold one complete value.

use crate::codec::{Codec, MsgPackCodec};
use crate::types::{HEADER_LEN, MAX_FRAME_SIZE, MAX_PAYLOAD_LEN, Operation, Request};
use crate::ProtocolError;

const CODEC: MsgPackCodec = MsgPackCodec;

// ---------------------------------------------------------------------------
// Operands
// ---------------------------------------------------------------------------

/// Serializes the operand pair as a 2-element MessagePack array.
pub fn encode_operands(a: i32, b: i32) -> Result<Vec<u8>, ProtocolError> {
    CODEC.encode(&(a, b))
}

/// Deserializes an operand pair that must fill `payload` exactly.
///
/// # Errors
/// [`ProtocolError::MalformedPayload`] if the bytes are not exactly one
/// 2-element array of 32-bit integers.
pub fn decode_operands(payload: &[u8]) -> Result<(i32, i32), ProtocolError> {
    CODEC.decode(payload)
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Builds an unpadded request frame.
///
/// # Errors
/// [`ProtocolError::PayloadTooLarge`] if the serialized operands would not
/// fit in a frame after the header.
pub fn encode_request(op: Operation, a: i32, b: i32) -> Result<Vec<u8>, ProtocolError> {
    let payload = encode_operands(a, b)?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(&op.tag().to_be_bytes());
    // Bounded by MAX_PAYLOAD_LEN above, so this never truncates.
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Zero-pads a frame to [`MAX_FRAME_SIZE`], the size clients put on the
/// wire. Frames already at or above that size are returned unchanged.
pub fn pad_frame(mut frame: Vec<u8>) -> Vec<u8> {
    if frame.len() < MAX_FRAME_SIZE {
        frame.resize(MAX_FRAME_SIZE, 0);
    }
    frame
}

/// Decodes the 4-byte operation tag.
///
/// # Errors
/// [`ProtocolError::UnknownTag`] for any value outside the known set.
pub fn decode_request_header(bytes: [u8; 4]) -> Result<Operation, ProtocolError> {
    Operation::try_from(u32::from_be_bytes(bytes))
}

/// Decodes the 4-byte payload length.
pub fn decode_length(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}

/// Validates a declared payload length against the frame capacity.
///
/// # Errors
/// [`ProtocolError::PayloadTooLarge`] if `len` exceeds [`MAX_PAYLOAD_LEN`].
pub fn check_payload_len(len: u32) -> Result<usize, ProtocolError> {
    let len = len as usize;
    if len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            len,
            max: MAX_PAYLOAD_LEN,
        });
    }
    Ok(len)
}

/// Decodes a complete request frame held in memory.
///
/// Bytes after the declared payload (such as padding) are ignored. The
/// server decodes incrementally from the socket instead; this is the
/// same sequence of checks applied to a buffer.
pub fn decode_request(frame: &[u8]) -> Result<Request, ProtocolError> {
    if frame.len() < HEADER_LEN {
        return Err(ProtocolError::MalformedPayload(format!(
            "frame of {} bytes is shorter than the header",
            frame.len()
        )));
    }
    let mut tag = [0u8; 4];
    let mut len = [0u8; 4];
    tag.copy_from_slice(&frame[..4]);
    len.copy_from_slice(&frame[4..HEADER_LEN]);

    let op = decode_request_header(tag)?;
    let len = check_payload_len(decode_length(len))?;
    let payload = frame.get(HEADER_LEN..HEADER_LEN + len).ok_or_else(|| {
        ProtocolError::MalformedPayload(format!(
            "declared {len} payload bytes, frame holds {}",
            frame.len() - HEADER_LEN
        ))
    })?;
    let (a, b) = decode_operands(payload)?;
    Ok(Request { op, a, b })
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Serializes a result as a 1-element MessagePack array.
pub fn encode_response(result: i32) -> Result<Vec<u8>, ProtocolError> {
    CODEC.encode(&(result,))
}

/// Decodes a response that must fill `bytes` exactly.
pub fn decode_response(bytes: &[u8]) -> Result<i32, ProtocolError> {
    let (result,): (i32,) = CODEC.decode(bytes)?;
    Ok(result)
}

/// Decodes a response from the front of a partially filled buffer.
///
/// Returns the result and the bytes it used, or `Ok(None)` if more bytes
/// are needed.
pub fn try_decode_response(bytes: &[u8]) -> Result<Option<(i32, usize)>, ProtocolError> {
    Ok(CODEC
        .decode_prefix::<(i32,)>(bytes)?
        .map(|((result,), used)| (result, used)))
}
