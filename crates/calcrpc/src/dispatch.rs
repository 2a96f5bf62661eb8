//! Arithmetic dispatch: the function a request actually invokes.

use calcrpc_protocol::{
    NOT_APPLICABLE, Operation, ProtocolError, Request, decode_request, encode_response,
};

/// Applies `op` to the operands.
///
/// Overflow wraps (two's complement). Division by zero returns
/// [`NOT_APPLICABLE`] without attempting the division; any other
/// division truncates toward zero, and `i32::MIN / -1` wraps to
/// `i32::MIN`.
pub fn dispatch(op: Operation, a: i32, b: i32) -> i32 {
    match op {
        Operation::Add => a.wrapping_add(b),
        Operation::Subtract => a.wrapping_sub(b),
        Operation::Multiply => a.wrapping_mul(b),
        Operation::Divide => {
            if b == 0 {
                return NOT_APPLICABLE;
            }
            a.wrapping_div(b)
        }
    }
}

/// Evaluates a decoded request.
pub fn evaluate(request: &Request) -> i32 {
    dispatch(request.op, request.a, request.b)
}

/// Turns one in-memory request frame into its response frame.
///
/// The same decode → dispatch → encode path a server session runs,
/// without a socket in between.
pub fn respond(frame: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let request = decode_request(frame)?;
    encode_response(evaluate(&request))
}
