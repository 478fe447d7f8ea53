//! Core wire types: opcodes, argument values, and messages.
//!
//! A message on the wire is an ordered tuple `(opcode, args...)`. The
//! opcode is an unsigned integer; each argument is an opaque [`Value`]
//! (integer, string, nil, or a nested list of those).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Opcode
// ---------------------------------------------------------------------------

/// Integer identifying a message type.
///
/// Opcodes are only meaningful relative to the namespace (and phase
/// table) they were assigned in: `Opcode(0)` is `JOIN` in the lobby's
/// inbound table and `START` in the game's outbound namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Opcode(pub u32);

impl Opcode {
    /// An opcode no table ever assigns. Carried by empty frames so they
    /// fail the handler lookup instead of aliasing a real operation.
    pub const INVALID: Opcode = Opcode(u32::MAX);

    /// Returns the opcode as a table index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single message argument.
///
/// `#[serde(untagged)]` maps each variant onto the codec's plain shape:
/// nil, an integer, a string, or an array. Anything else (floats, maps,
/// booleans) fails to decode and surfaces as a malformed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value (e.g. "no password").
    Nil,
    /// A signed integer.
    Int(i64),
    /// A UTF-8 string.
    Str(String),
    /// An ordered, possibly nested, sequence.
    List(Vec<Value>),
}

impl Value {
    /// Returns the string if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the items if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` for `Nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Short type name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::List(_) => "list",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<Opcode> for Value {
    fn from(op: Opcode) -> Self {
        Self::from(op.0)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// One decoded message: an opcode plus its ordered arguments.
///
/// On the wire this is a flat sequence `[opcode, arg0, arg1, ...]`, so
/// serde goes through `Vec<Value>` and validates the head on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct Message {
    /// Which operation this message requests or announces.
    pub opcode: Opcode,
    /// Operation-specific arguments, in order.
    pub args: Vec<Value>,
}

impl Message {
    /// Builds a message from an opcode and arguments.
    pub fn new(opcode: impl Into<Opcode>, args: Vec<Value>) -> Self {
        Self {
            opcode: opcode.into(),
            args,
        }
    }

    /// The message a zero-length payload decodes to: no arguments and an
    /// opcode that never resolves.
    pub fn empty() -> Self {
        Self {
            opcode: Opcode::INVALID,
            args: Vec::new(),
        }
    }
}

impl TryFrom<Vec<Value>> for Message {
    type Error = String;

    fn try_from(mut items: Vec<Value>) -> Result<Self, Self::Error> {
        if items.is_empty() {
            return Err("message has no opcode".into());
        }
        let opcode = match items.remove(0) {
            Value::Int(n) => u32::try_from(n)
                .map(Opcode)
                .map_err(|_| format!("opcode {n} out of range"))?,
            other => return Err(format!("opcode must be an int, got {}", other.kind())),
        };
        Ok(Self {
            opcode,
            args: items,
        })
    }
}

impl From<Message> for Vec<Value> {
    fn from(msg: Message) -> Self {
        let mut items = Vec::with_capacity(msg.args.len() + 1);
        items.push(Value::from(msg.opcode));
        items.extend(msg.args);
        items
    }
}
