//! Operation tags and the constants both peers agree on.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Result value returned when an operation has no defined answer
/// (division by zero). It travels as an ordinary result.
pub const NOT_APPLICABLE: i32 = -3000;

/// Size of the client's transmit and receive buffer. A request frame,
/// header included, never exceeds this.
pub const MAX_FRAME_SIZE: usize = 1024;

/// Bytes taken by the tag and the payload length.
pub const HEADER_LEN: usize = 8;

/// Largest payload a request frame can carry.
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_SIZE - HEADER_LEN;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The arithmetic function a request invokes.
///
/// The discriminants are the wire values, sent as a big-endian `u32`.
/// Adding an operation here forces every `match` on it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Operation {
    Add = 1,
    Subtract = 2,
    Multiply = 3,
    Divide = 4,
}

impl Operation {
    /// Every operation, in tag order.
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    /// Returns the wire tag for this operation.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Returns the lowercase name used in logs and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }
}

impl TryFrom<u32> for Operation {
    type Error = ProtocolError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Operation::Add),
            2 => Ok(Operation::Subtract),
            3 => Ok(Operation::Multiply),
            4 => Ok(Operation::Divide),
            other => Err(ProtocolError::UnknownTag(other)),
        }
    }
}

impl From<Operation> for u32 {
    fn from(op: Operation) -> Self {
        op.tag()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the full name or the usual short aliases
/// (`sub`, `minus`, `mul`, `div`), case-insensitively.
impl FromStr for Operation {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" | "plus" => Ok(Operation::Add),
            "subtract" | "sub" | "minus" => Ok(Operation::Subtract),
            "multiply" | "mul" | "multi" => Ok(Operation::Multiply),
            "divide" | "div" => Ok(Operation::Divide),
            _ => Err(ProtocolError::UnknownOperation(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A decoded request: the operation and its two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub op: Operation,
    pub a: i32,
    pub b: i32,
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.op, self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_tags_match_wire_values() {
        assert_eq!(Operation::Add.tag(), 1);
        assert_eq!(Operation::Subtract.tag(), 2);
        assert_eq!(Operation::Multiply.tag(), 3);
        assert_eq!(Operation::Divide.tag(), 4);
    }

    #[test]
    fn test_operation_try_from_known_tags() {
        for op in Operation::ALL {
            assert_eq!(Operation::try_from(op.tag()).unwrap(), op);
        }
    }

    #[test]
    fn test_operation_try_from_rejects_unknown_tags() {
        for tag in [0, 5, 99, u32::MAX] {
            match Operation::try_from(tag) {
                Err(ProtocolError::UnknownTag(t)) => assert_eq!(t, tag),
                other => panic!("expected UnknownTag({tag}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_operation_parses_names_and_aliases() {
        assert_eq!("add".parse::<Operation>().unwrap(), Operation::Add);
        assert_eq!("MINUS".parse::<Operation>().unwrap(), Operation::Subtract);
        assert_eq!("mul".parse::<Operation>().unwrap(), Operation::Multiply);
        assert_eq!("Divide".parse::<Operation>().unwrap(), Operation::Divide);
        assert!(matches!(
            "modulo".parse::<Operation>(),
            Err(ProtocolError::UnknownOperation(_))
        ));
    }

    #[test]
    fn test_operation_display_round_trips_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.to_string().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn test_frame_constants() {
        assert_eq!(MAX_PAYLOAD_LEN, 1016);
        assert_eq!(NOT_APPLICABLE, -3000);
    }

    #[test]
    fn test_request_display() {
        let req = Request {
            op: Operation::Multiply,
            a: -4,
            b: 5,
        };
        assert_eq!(req.to_string(), "multiply(-4, 5)");
    }
}
