//! One-shot marshalling of a whole value.

use tarn_engine::{CommentAlignment, EmitterOptions};

use crate::encode::StreamEncoder;
use crate::error::Result;
use crate::value::Value;

/// Renders a single [`Value`] as one implicit document.
///
/// A thin builder over [`StreamEncoder`]; use the encoder directly when
/// comments or multiple documents are in play.
///
/// ```
/// use tarn_codec::{Marshaller, Value};
///
/// let value = Value::Map(vec![
///     (Value::Str("name".into()), Value::Str("tarn".into())),
///     (Value::Str("port".into()), Value::Int(7070)),
/// ]);
/// let text = Marshaller::new().marshal_to_string(&value).unwrap();
/// assert_eq!(text, "name: tarn\nport: 7070\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Marshaller {
    options: EmitterOptions,
}

impl Marshaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Soft wrap width for flow collections.
    pub fn max_width(mut self, width: usize) -> Self {
        self.options.max_width = width;
        self
    }

    /// Spaces per nesting level.
    pub fn indent(mut self, step: usize) -> Self {
        self.options.indent = step;
        self
    }

    /// Start trailing comments at a fixed column.
    pub fn comment_column(mut self, column: usize) -> Self {
        self.options.comment_column = CommentAlignment::Column(column);
        self
    }

    /// Align each run of trailing comments to its widest line.
    pub fn align_comments(mut self) -> Self {
        self.options.comment_column = CommentAlignment::Auto;
        self
    }

    pub fn marshal(&self, value: &Value) -> Result<Vec<u8>> {
        let mut encoder = StreamEncoder::implicit(self.options)?;
        encoder.emit_value("", value, false)?;
        encoder.finish()
    }

    pub fn marshal_to_string(&self, value: &Value) -> Result<String> {
        // The encoder only ever produces UTF-8.
        Ok(String::from_utf8(self.marshal(value)?).expect("emitter output is UTF-8"))
    }
}
