//! Error types for the raw event layer.

use std::fmt;

use crate::Mark;

/// A fatal parse error. Any error aborts the whole parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    msg: String,
    mark: Mark,
}

impl ParseError {
    pub(crate) fn new(msg: impl Into<String>, mark: Mark) -> Self {
        Self {
            msg: msg.into(),
            mark,
        }
    }

    /// Position the error was raised at.
    pub fn mark(&self) -> Mark {
        self.mark
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.msg, self.mark.line, self.mark.column
        )
    }
}

impl std::error::Error for ParseError {}

/// A fatal emit error: misuse of the emitter call surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitError {
    msg: String,
}

impl EmitError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

impl std::error::Error for EmitError {}
