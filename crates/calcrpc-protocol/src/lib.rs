//! Wire protocol for calcrpc.
//!
//! This crate defines the bytes that clients and servers exchange:
//!
//! - **Types** ([`Operation`], [`Request`], frame constants): what a
//!   request names and the limits both peers agree on.
//! - **Codec** ([`Codec`] trait, [`MsgPackCodec`]): how operand tuples and
//!   results are turned into bytes.
//! - **Frames** ([`encode_request`], [`decode_operands`],
//!   [`encode_response`], ...): the framing around those bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong in any of the above.
//!
//! The protocol layer knows nothing about sockets. The server session
//! reads a frame piece by piece and hands each piece to the matching
//! decoder here.
//!
//! ```text
//! Transport (bytes) → Protocol (Request / result) → Session (dispatch)
//! ```

mod codec;
mod error;
#[cfg(feature = "msgpack")]
mod frame;
mod types;

pub use codec::Codec;
#[cfg(feature = "msgpack")]
pub use codec::MsgPackCodec;
pub use error::ProtocolError;
#[cfg(feature = "msgpack")]
pub use frame::{
    check_payload_len, decode_length, decode_operands, decode_request,
    decode_request_header, decode_response, encode_operands, encode_request,
    encode_response, pad_frame, try_decode_response,
};
pub use types::{
    HEADER_LEN, MAX_FRAME_SIZE, MAX_PAYLOAD_LEN, NOT_APPLICABLE, Operation,
    Request,
};
