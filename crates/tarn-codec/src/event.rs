//! Typed events and scalar styles.

use std::fmt;

use tarn_engine::{Mark, RawScalarStyle, RawTagDirective, RawVersionDirective};

use crate::value::Value;

/// Kind of a decoded event. Mirrors the engine's raw kinds, with the
/// stream terminator renamed to `Finish` on this side of the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    #[default]
    Scalar,
    Alias,
    MappingStart,
    MappingEnd,
    SequenceStart,
    SequenceEnd,
    DocumentStart,
    DocumentEnd,
    Comment,
    /// End of the stream; the decoder releases its engine state when this
    /// is returned.
    Finish,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Scalar => "scalar",
            EventKind::Alias => "alias",
            EventKind::MappingStart => "mapping-start",
            EventKind::MappingEnd => "mapping-end",
            EventKind::SequenceStart => "sequence-start",
            EventKind::SequenceEnd => "sequence-end",
            EventKind::DocumentStart => "document-start",
            EventKind::DocumentEnd => "document-end",
            EventKind::Comment => "comment",
            EventKind::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Presentation style of a scalar, on the codec side of the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Any,
    Plain,
    SingleQuoted,
    DoubleQuoted,
    LiteralBlock,
    FoldedBlock,
}

// The two style tables are kept adjacent so the asymmetry is visible:
// FoldedBlock lowers to Literal on the way out, matching the behavior the
// round-trip suite pins down.

pub(crate) fn to_engine_style(style: ScalarStyle) -> RawScalarStyle {
    match style {
        ScalarStyle::Any => RawScalarStyle::Any,
        ScalarStyle::Plain => RawScalarStyle::Plain,
        ScalarStyle::SingleQuoted => RawScalarStyle::SingleQuoted,
        ScalarStyle::DoubleQuoted => RawScalarStyle::DoubleQuoted,
        ScalarStyle::LiteralBlock => RawScalarStyle::Literal,
        ScalarStyle::FoldedBlock => RawScalarStyle::Literal,
    }
}

pub(crate) fn from_engine_style(style: RawScalarStyle) -> ScalarStyle {
    match style {
        RawScalarStyle::Any => ScalarStyle::Any,
        RawScalarStyle::Plain => ScalarStyle::Plain,
        RawScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        RawScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        RawScalarStyle::Literal => ScalarStyle::LiteralBlock,
        RawScalarStyle::Folded => ScalarStyle::FoldedBlock,
    }
}

/// A `%YAML` directive on a document-start event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub major: u8,
    pub minor: u8,
}

/// A `%TAG` directive on a document-start event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub handle: String,
    pub prefix: String,
}

impl VersionInfo {
    pub(crate) fn from_raw(raw: RawVersionDirective) -> Self {
        Self {
            major: raw.major,
            minor: raw.minor,
        }
    }

    pub(crate) fn to_raw(self) -> RawVersionDirective {
        RawVersionDirective {
            major: self.major,
            minor: self.minor,
        }
    }
}

impl TagInfo {
    pub(crate) fn from_raw(raw: &RawTagDirective) -> Self {
        Self {
            handle: raw.handle.clone(),
            prefix: raw.prefix.clone(),
        }
    }

    pub(crate) fn to_raw(&self) -> RawTagDirective {
        RawTagDirective {
            handle: self.handle.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

/// One decoded event.
///
/// Only the fields relevant to `kind` carry meaning; the rest stay at their
/// defaults. For scalars, `text` is the verbatim source text and `value` the
/// resolved native value; for comments, `text` is the comment body without
/// its `#` marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub kind: EventKind,
    /// Resolved native value of a scalar.
    pub value: Value,
    /// Verbatim scalar text, or comment text.
    pub text: String,
    pub anchor: String,
    /// Canonical tag, e.g. `tag:yaml.org,2002:int`. Empty on non-scalars
    /// unless the source tagged the node.
    pub tag: String,
    pub style: ScalarStyle,
    /// Collection starts: the source used flow notation.
    pub flow: bool,
    /// Scalars: plain and untagged. Document markers: no explicit
    /// `---`/`...` in the source.
    pub implicit: bool,
    /// Scalars: quoted (or block) and untagged.
    pub quoted_implicit: bool,
    /// 1-based line/column position of the event in the source text.
    pub position: Mark,
    /// `%YAML` directive, on document-start.
    pub yaml_version: Option<VersionInfo>,
    /// `%TAG` directives in declaration order, on document-start.
    pub tag_definitions: Vec<TagInfo>,
}

impl Event {
    pub(crate) fn of(kind: EventKind, position: Mark) -> Self {
        Event {
            kind,
            position,
            ..Default::default()
        }
    }

    /// The resolved value, for scalar events.
    pub fn value(&self) -> &Value {
        &self.value
    }
}
