//! Raw event layer for the Tarn YAML codec.
//!
//! This crate holds the low-level machinery the codec layer builds on: a
//! comment-preserving parser that turns a byte buffer into a flat sequence
//! of [`RawEvent`]s, and a push-based [`Emitter`] that turns the same call
//! shapes back into text with width, indent, and comment-column control.
//!
//! Nothing here assigns meaning to scalar text. Tag resolution, implicit
//! typing, and native-value conversion all live one layer up.

mod cursor;
pub use cursor::Mark;

mod raw;
pub use raw::{
    RawCollectionStyle, RawEvent, RawEventKind, RawScalarStyle, RawTagDirective,
    RawVersionDirective,
};

mod error;
pub use error::{EmitError, ParseError};

mod parser;
pub use parser::Parser;

mod emitter;
pub use emitter::{CommentAlignment, Emitter, EmitterOptions};
