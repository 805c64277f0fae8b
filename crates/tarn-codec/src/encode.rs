//! Push encoder over the engine emitter.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tarn_engine::{Emitter, EmitterOptions, RawScalarStyle};

use crate::error::{Error, Result};
use crate::event::{to_engine_style, ScalarStyle, TagInfo, VersionInfo};
use crate::resolve::{self, TAG_BINARY, TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_NULL, TAG_STR};
use crate::value::{key_cmp, Value};

/// Pushes events into text.
///
/// An implicit encoder wraps everything in a single unmarked document; an
/// explicit encoder leaves document bracketing to the caller, which may
/// emit several documents with `---`/`...` markers. [`finish`] consumes
/// the encoder, so teardown happens exactly once.
///
/// [`finish`]: StreamEncoder::finish
pub struct StreamEncoder {
    emitter: Emitter,
    explicit: bool,
    in_document: bool,
    /// Open collections; guards against unbalanced end calls.
    depth: usize,
    /// Current flow preference; sticky once set so block collections are
    /// never nested inside flow ones.
    flow: bool,
}

impl StreamEncoder {
    /// An encoder for a single document without markers.
    pub fn implicit(options: EmitterOptions) -> Result<Self> {
        let mut emitter = Emitter::new(options);
        emitter.stream_start();
        emitter.document_start(None, &[], true)?;
        Ok(Self {
            emitter,
            explicit: false,
            in_document: true,
            depth: 0,
            flow: false,
        })
    }

    /// An encoder whose caller brackets documents explicitly.
    pub fn explicit(options: EmitterOptions) -> Self {
        let mut emitter = Emitter::new(options);
        emitter.stream_start();
        Self {
            emitter,
            explicit: true,
            in_document: false,
            depth: 0,
            flow: false,
        }
    }

    pub fn begin_document(
        &mut self,
        version: Option<VersionInfo>,
        tag_definitions: &[TagInfo],
        implicit: bool,
    ) -> Result<()> {
        if !self.explicit {
            return Err(Error::Emit(
                "document markers on an implicit encoder".to_string(),
            ));
        }
        let directives: Vec<_> = tag_definitions.iter().map(TagInfo::to_raw).collect();
        self.emitter
            .document_start(version.map(VersionInfo::to_raw), &directives, implicit)?;
        self.in_document = true;
        Ok(())
    }

    pub fn end_document(&mut self, implicit: bool) -> Result<()> {
        if !self.explicit {
            return Err(Error::Emit(
                "document markers on an implicit encoder".to_string(),
            ));
        }
        if self.depth != 0 {
            return Err(Error::UnbalancedEnd);
        }
        self.emitter.document_end(implicit)?;
        self.in_document = false;
        Ok(())
    }

    pub fn begin_mapping(&mut self, anchor: &str, tag: &str, flow: bool) -> Result<()> {
        self.emitter.mapping_start(anchor, tag, flow || self.flow)?;
        self.depth += 1;
        Ok(())
    }

    pub fn end_mapping(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::UnbalancedEnd);
        }
        self.emitter.mapping_end()?;
        self.depth -= 1;
        Ok(())
    }

    pub fn begin_sequence(&mut self, anchor: &str, tag: &str, flow: bool) -> Result<()> {
        self.emitter.sequence_start(anchor, tag, flow || self.flow)?;
        self.depth += 1;
        Ok(())
    }

    pub fn end_sequence(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::UnbalancedEnd);
        }
        self.emitter.sequence_end()?;
        self.depth -= 1;
        Ok(())
    }

    /// Emit a scalar with verbatim text, bypassing value rendering. This is
    /// the replay primitive: paired with the decoder's verbatim `text`, it
    /// reproduces the source scalar byte for byte.
    pub fn emit_raw_scalar(
        &mut self,
        anchor: &str,
        tag: &str,
        style: ScalarStyle,
        text: &str,
    ) -> Result<()> {
        let raw_style = to_engine_style(style);
        let (plain_implicit, quoted_implicit) = implicit_flags(raw_style, tag);
        self.emitter
            .scalar(anchor, tag, text, raw_style, plain_implicit, quoted_implicit)?;
        Ok(())
    }

    /// Render a scalar [`Value`] and emit it.
    pub fn emit_scalar(&mut self, tag: &str, value: &Value, style: ScalarStyle) -> Result<()> {
        let rendered = render_scalar(value)?;
        let style = if style == ScalarStyle::Any {
            rendered.style
        } else {
            style
        };
        let tag = if !tag.is_empty() {
            tag
        } else if rendered.tag_required {
            rendered.tag
        } else {
            ""
        };
        let raw_style = to_engine_style(style);
        let (plain_implicit, quoted_implicit) = implicit_flags(raw_style, tag);
        self.emitter
            .scalar("", tag, &rendered.text, raw_style, plain_implicit, quoted_implicit)?;
        Ok(())
    }

    pub fn emit_alias(&mut self, anchor: &str) -> Result<()> {
        self.emitter.alias(anchor)?;
        Ok(())
    }

    pub fn emit_comment(&mut self, text: &str, own_line: bool) {
        self.emitter.comment(text, own_line);
    }

    /// Marshal a whole value, overriding the flow preference for its
    /// subtree; the previous preference is restored afterwards.
    pub fn emit_value(&mut self, tag: &str, value: &Value, flow: bool) -> Result<()> {
        let saved = self.flow;
        self.flow = saved || flow;
        let result = self.emit_value_inner(tag, value);
        self.flow = saved;
        result
    }

    fn emit_value_inner(&mut self, tag: &str, value: &Value) -> Result<()> {
        match value {
            v if v.is_scalar() => self.emit_scalar(tag, v, ScalarStyle::Any),
            Value::Sequence(items) => {
                self.begin_sequence("", tag, self.flow)?;
                for item in items {
                    self.emit_value("", item, false)?;
                }
                self.end_sequence()
            }
            mapping => self.emit_as_map(tag, self.flow, mapping, default_visitor),
        }
    }

    /// The mapping iteration protocol.
    ///
    /// Drives `visit` over the entries of a mapping-shaped value in their
    /// emission order: record fields as declared (embedded paths resolved
    /// in place), then inline-absorbed entries sorted by [`key_cmp`];
    /// `Map` entries sorted; `Pairs` as given. `would_omit` tells the
    /// visitor an omit-if-zero field is zero; skipping is its call.
    ///
    /// A `Null` value short-circuits to a null scalar without opening a
    /// mapping. Anything without mapping shape is an error.
    pub fn emit_as_map<F>(
        &mut self,
        tag: &str,
        flow: bool,
        value: &Value,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(&mut StreamEncoder, &Value, &Value, bool, bool) -> Result<()>,
    {
        match value {
            Value::Null => self.emit_scalar(tag, &Value::Null, ScalarStyle::Plain),
            Value::Record(record) => {
                self.begin_mapping("", tag, flow)?;
                for field in record.info.fields {
                    let Some(field_value) = record.field(&field.path) else {
                        continue;
                    };
                    let would_omit = field.omit_empty && field_value.is_zero();
                    let key = Value::Str(field.key.to_string());
                    visit(self, &key, field_value, field.flow, would_omit)?;
                }
                if !record.inline.is_empty() {
                    let mut entries: Vec<&(Value, Value)> = record.inline.iter().collect();
                    entries.sort_by(|a, b| key_cmp(&a.0, &b.0));
                    for (key, entry_value) in entries {
                        if let Value::Str(s) = key
                            && record.info.fields.iter().any(|f| f.key == s)
                        {
                            return Err(Error::InlineKeyConflict(s.clone()));
                        }
                        visit(self, key, entry_value, false, false)?;
                    }
                }
                self.end_mapping()
            }
            Value::Map(entries) => {
                self.begin_mapping("", tag, flow)?;
                let mut sorted: Vec<&(Value, Value)> = entries.iter().collect();
                sorted.sort_by(|a, b| key_cmp(&a.0, &b.0));
                for (key, entry_value) in sorted {
                    visit(self, key, entry_value, false, false)?;
                }
                self.end_mapping()
            }
            Value::Pairs(entries) => {
                self.begin_mapping("", tag, flow)?;
                for (key, entry_value) in entries {
                    visit(self, key, entry_value, false, false)?;
                }
                self.end_mapping()
            }
            other => Err(Error::NotAMapping(other.type_name())),
        }
    }

    /// Close the stream and return the rendered bytes. Consuming `self`
    /// makes double teardown unrepresentable.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.depth != 0 {
            return Err(Error::Emit("finish with an open collection".to_string()));
        }
        if !self.explicit {
            self.emitter.document_end(true)?;
        } else if self.in_document {
            return Err(Error::Emit("finish with an open document".to_string()));
        }
        tracing::debug!("encoder finished");
        Ok(self.emitter.stream_end())
    }
}

fn default_visitor(
    encoder: &mut StreamEncoder,
    key: &Value,
    value: &Value,
    flow: bool,
    would_omit: bool,
) -> Result<()> {
    if would_omit {
        return Ok(());
    }
    encoder.emit_value("", key, flow)?;
    encoder.emit_value("", value, flow)
}

fn implicit_flags(style: RawScalarStyle, tag: &str) -> (bool, bool) {
    match style {
        RawScalarStyle::Plain | RawScalarStyle::Any => (tag.is_empty(), false),
        _ => (false, tag.is_empty()),
    }
}

struct RenderedScalar {
    text: String,
    style: ScalarStyle,
    tag: &'static str,
    /// The tag must be printed for the text to decode back to this value.
    tag_required: bool,
}

fn render_scalar(value: &Value) -> Result<RenderedScalar> {
    let rendered = match value {
        Value::Null => RenderedScalar {
            text: "null".to_string(),
            style: ScalarStyle::Plain,
            tag: TAG_NULL,
            tag_required: false,
        },
        Value::Bool(b) => RenderedScalar {
            text: b.to_string(),
            style: ScalarStyle::Plain,
            tag: TAG_BOOL,
            tag_required: false,
        },
        Value::Int(i) => RenderedScalar {
            text: i.to_string(),
            style: ScalarStyle::Plain,
            tag: TAG_INT,
            tag_required: false,
        },
        Value::Float(f) => RenderedScalar {
            text: render_float(*f),
            style: ScalarStyle::Plain,
            tag: TAG_FLOAT,
            tag_required: false,
        },
        Value::Str(s) => {
            let style = if s.contains('\n') {
                ScalarStyle::LiteralBlock
            } else if resolve::resolve("", s).0 == TAG_STR {
                // Safe to leave plain; the engine still quotes text whose
                // shape collides with syntax.
                ScalarStyle::Plain
            } else {
                ScalarStyle::SingleQuoted
            };
            RenderedScalar {
                text: s.clone(),
                style,
                tag: TAG_STR,
                tag_required: false,
            }
        }
        Value::Bytes(bytes) => RenderedScalar {
            text: BASE64.encode(bytes),
            style: ScalarStyle::Plain,
            tag: TAG_BINARY,
            tag_required: true,
        },
        other => {
            return Err(Error::Emit(format!(
                "cannot emit {} as a scalar",
                other.type_name()
            )));
        }
    };
    Ok(rendered)
}

fn render_float(f: f64) -> String {
    if f.is_nan() {
        return ".nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let mut text = format!("{f}");
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
    text
}
