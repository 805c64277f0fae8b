//! Format-preserving YAML stream codec.
//!
//! The codec turns text into a stream of typed [`Event`]s and back again
//! without losing comments. Comments are first-class events, so a program
//! can decode a document, transform it, and re-encode it with every comment
//! still standing where a reader expects it.
//!
//! Three entry points, lowest level first:
//!
//! - [`StreamDecoder`] pulls typed events from a buffer, one per call,
//!   ending with [`EventKind::Finish`].
//! - [`StreamEncoder`] pushes events into text: implicit mode wraps a
//!   single document, explicit mode lets the caller bracket documents with
//!   `---`/`...` markers.
//! - [`Marshaller`] renders one [`Value`] in a single shot with width,
//!   indent, and comment-column control.
//!
//! Scalar text is resolved into native [`Value`]s per YAML 1.1 implicit
//! typing; mappings can be driven through the visitor protocol in
//! [`StreamEncoder::emit_as_map`], which flattens record fields, sorts map
//! keys deterministically, and honors omit-if-zero without the visitor
//! having to know any of that.
//!
//! The raw text machinery lives in `tarn-engine`; this crate assigns
//! meaning to it.

mod error;
pub use error::{Error, Result};

mod event;
pub use event::{Event, EventKind, ScalarStyle, TagInfo, VersionInfo};

mod value;
pub use value::{key_cmp, FieldInfo, FieldPath, Record, RecordInfo, Value};

pub mod resolve;

mod decode;
pub use decode::StreamDecoder;

mod encode;
pub use encode::StreamEncoder;

mod marshal;
pub use marshal::Marshaller;

pub use tarn_engine::{CommentAlignment, EmitterOptions, Mark};
