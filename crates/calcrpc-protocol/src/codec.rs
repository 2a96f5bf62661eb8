//! Codec trait and the MessagePack implementation.
//!
//! The frame layer doesn't care how operand tuples and results become
//! bytes; it only needs something that implements [`Codec`]. Requests
//! carry a MessagePack 2-element array and responses a 1-element array,
//! which is what [`MsgPackCodec`] produces for Rust tuples.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Decodes one value from the front of `data`.
    ///
    /// Returns the value and the number of bytes it occupied, or
    /// `Ok(None)` if `data` is a valid but incomplete prefix.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedPayload` if the bytes can never
    /// become a value of type `T`, however many more arrive.
    fn decode_prefix<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<Option<(T, usize)>, ProtocolError>;

    /// Decodes a value that must occupy all of `data`.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedPayload` on truncated input,
    /// trailing bytes, or a shape mismatch.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        match self.decode_prefix(data)? {
            Some((value, used)) if used == data.len() => Ok(value),
            Some((_, used)) => Err(ProtocolError::MalformedPayload(format!(
                "{} trailing bytes after a {used}-byte value",
                data.len() - used
            ))),
            None => Err(ProtocolError::MalformedPayload(format!(
                "truncated: {} bytes is not a complete value",
                data.len()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// MsgPackCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses MessagePack (via `rmp-serde`).
///
/// Tuples encode as arrays and integers use the smallest encoding that
/// fits, so `(8, 9)` is three bytes: `[0x92, 0x08, 0x09]`.
///
/// ```rust
/// use calcrpc_protocol::{Codec, MsgPackCodec};
///
/// let codec = MsgPackCodec;
/// let bytes = codec.encode(&(8i32, 9i32)).unwrap();
/// assert_eq!(bytes, [0x92, 0x08, 0x09]);
///
/// let pair: (i32, i32) = codec.decode(&bytes).unwrap();
/// assert_eq!(pair, (8, 9));
/// ```
#[cfg(feature = "msgpack")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

#[cfg(feature = "msgpack")]
impl Codec for MsgPackCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode_prefix<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<Option<(T, usize)>, ProtocolError> {
        let mut cursor = std::io::Cursor::new(data);
        let result = {
            let mut de = rmp_serde::Deserializer::new(&mut cursor);
            <T as serde::Deserialize>::deserialize(&mut de)
        };
        match result {
            Ok(value) => Ok(Some((value, cursor.position() as usize))),
            Err(e) if ran_out_of_input(&e) => Ok(None),
            Err(e) => Err(ProtocolError::MalformedPayload(e.to_string())),
        }
    }
}

/// Whether the decoder stopped only because the input ended early.
#[cfg(feature = "msgpack")]
fn ran_out_of_input(err: &rmp_serde::decode::Error) -> bool {
    use rmp_serde::decode::Error;
    match err {
        Error::InvalidMarkerRead(e) | Error::InvalidDataRead(e) => {
            e.kind() == std::io::ErrorKind::UnexpectedEof
        }
        _ => false,
    }
}

#[cfg(all(test, feature = "msgpack"))]
mod tests {
    use super::*;

    #[test]
    fn test_pair_encodes_as_two_element_array() {
        let bytes = MsgPackCodec.encode(&(1i32, -1i32)).unwrap();
        // fixarray(2), positive fixint 1, negative fixint -1
        assert_eq!(bytes, [0x92, 0x01, 0xff]);
    }

    #[test]
    fn test_single_encodes_as_one_element_array() {
        let bytes = MsgPackCodec.encode(&(17i32,)).unwrap();
        assert_eq!(bytes, [0x91, 0x11]);
    }

    #[test]
    fn test_decode_prefix_reports_consumed_length() {
        let mut bytes = MsgPackCodec.encode(&(300i32,)).unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(&[0, 0, 0]);

        let (value, used): ((i32,), usize) =
            MsgPackCodec.decode_prefix(&bytes).unwrap().unwrap();
        assert_eq!(value, (300,));
        assert_eq!(used, len);
    }

    #[test]
    fn test_decode_prefix_incomplete_is_none() {
        let bytes = MsgPackCodec.encode(&(i32::MIN, i32::MAX)).unwrap();
        for cut in 0..bytes.len() {
            let partial: Option<((i32, i32), usize)> =
                MsgPackCodec.decode_prefix(&bytes[..cut]).unwrap();
            assert!(partial.is_none(), "prefix of {cut} bytes decoded");
        }
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = MsgPackCodec.encode(&(1i32, 2i32)).unwrap();
        bytes.push(0x00);
        let result: Result<(i32, i32), _> = MsgPackCodec.decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        // A string where an array of ints is expected.
        let bytes = MsgPackCodec.encode(&"hello").unwrap();
        let result: Result<(i32, i32), _> = MsgPackCodec.decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_rejects_out_of_range_integer() {
        let bytes = MsgPackCodec.encode(&(i64::MAX, 1i64)).unwrap();
        let result: Result<(i32, i32), _> = MsgPackCodec.decode(&bytes);
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }
}
