//! Typed access to an operation's argument list.

use switchboard_protocol::Value;

use crate::HandlerError;

/// The arguments of one queued message, tagged with the operation name so
/// every accessor can report which operation it was decoding for.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    op: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Wraps raw values for operation `op`.
    pub fn new(op: &'static str, values: &'a [Value]) -> Self {
        Self { op, values }
    }

    /// Display name of the operation these arguments belong to.
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw values.
    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Fails unless there are exactly `n` arguments.
    pub fn expect_len(&self, n: usize) -> Result<(), HandlerError> {
        if self.values.len() == n {
            Ok(())
        } else {
            Err(HandlerError::arguments(
                self.op,
                format!("expected {n} arguments, got {}", self.values.len()),
            ))
        }
    }

    /// The string at `index`.
    pub fn str(&self, index: usize, what: &str) -> Result<&'a str, HandlerError> {
        let value = self.get(index, what)?;
        value.as_str().ok_or_else(|| self.mismatch(what, "string", value))
    }

    /// The string at `index`, treating nil as absent.
    pub fn opt_str(&self, index: usize, what: &str) -> Result<Option<&'a str>, HandlerError> {
        match self.get(index, what)? {
            Value::Nil => Ok(None),
            Value::Str(s) => Ok(Some(s)),
            other => Err(self.mismatch(what, "string or nil", other)),
        }
    }

    /// The integer at `index`.
    pub fn int(&self, index: usize, what: &str) -> Result<i64, HandlerError> {
        let value = self.get(index, what)?;
        value.as_int().ok_or_else(|| self.mismatch(what, "int", value))
    }

    fn get(&self, index: usize, what: &str) -> Result<&'a Value, HandlerError> {
        self.values
            .get(index)
            .ok_or_else(|| HandlerError::arguments(self.op, format!("missing {what}")))
    }

    fn mismatch(&self, what: &str, expected: &str, got: &Value) -> HandlerError {
        HandlerError::arguments(
            self.op,
            format!("{what} must be {expected}, got {}", got.kind()),
        )
    }
}
