//! Codec error type.

use std::fmt;

use tarn_engine::{EmitError, ParseError};

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure in the codec layer. All errors are fatal to the operation
/// that raised them; the codec never produces partial output.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A `!!binary` scalar whose text is not valid base64.
    InvalidBase64,
    /// The input is not UTF-8.
    InvalidUtf8,
    /// `next_event` was called after `Finish` was returned.
    DecoderFinished,
    /// An end call without a matching begin.
    UnbalancedEnd,
    /// An inline-absorbed mapping key shadows a declared record field.
    InlineKeyConflict(String),
    /// `emit_as_map` over a value that has no mapping shape.
    NotAMapping(&'static str),
    Parse(ParseError),
    /// Engine emitter misuse or an unsupported emission request.
    Emit(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBase64 => f.write_str("invalid base64 data"),
            Error::InvalidUtf8 => f.write_str("input is not valid UTF-8"),
            Error::DecoderFinished => f.write_str("decoder used after finish"),
            Error::UnbalancedEnd => f.write_str("end event without matching start"),
            Error::InlineKeyConflict(key) => {
                write!(f, "inline key {key:?} conflicts with a declared field")
            }
            Error::NotAMapping(kind) => write!(f, "cannot marshal {kind} as a map"),
            Error::Parse(e) => e.fmt(f),
            Error::Emit(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<EmitError> for Error {
    fn from(e: EmitError) -> Self {
        Error::Emit(e.to_string())
    }
}
