//! Raw structural events produced by the parser and accepted by the emitter.

use crate::Mark;

/// Kind of a raw structural event.
///
/// This is a closed set: the parser emits nothing else, and both the parser
/// and the codec layer match on it exhaustively so that adding a variant is
/// a compile-time event, not a runtime surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    /// End of the whole stream. Exactly one per parse, always last.
    StreamEnd,
    /// Start of a document, possibly carrying directives.
    DocumentStart,
    /// End of a document.
    DocumentEnd,
    /// An alias node (`*name`).
    Alias,
    /// A scalar node.
    Scalar,
    /// Start of a sequence.
    SequenceStart,
    /// End of a sequence.
    SequenceEnd,
    /// Start of a mapping.
    MappingStart,
    /// End of a mapping.
    MappingEnd,
    /// A comment, stored without its `#` marker.
    Comment,
}

/// Presentation style of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawScalarStyle {
    /// Let the emitter choose.
    #[default]
    Any,
    /// Unquoted.
    Plain,
    /// `'...'`
    SingleQuoted,
    /// `"..."`
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
}

/// Presentation style of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawCollectionStyle {
    /// Let the emitter choose.
    #[default]
    Any,
    /// Indentation-delimited.
    Block,
    /// `[...]` / `{...}`.
    Flow,
}

/// A `%YAML major.minor` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawVersionDirective {
    pub major: u8,
    pub minor: u8,
}

/// A `%TAG handle prefix` directive, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTagDirective {
    pub handle: String,
    pub prefix: String,
}

/// One raw structural event.
///
/// Only the fields relevant to `kind` are populated; the rest stay at their
/// defaults. `value` holds scalar text for `Scalar` and comment text for
/// `Comment`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEvent {
    pub kind: RawEventKind,
    /// 1-based source position of the event's first character.
    pub mark: Mark,
    /// Anchor name (`&name` on nodes, `*name` target on aliases).
    pub anchor: String,
    /// Full-form tag, e.g. `tag:yaml.org,2002:str`. Empty when untagged.
    pub tag: String,
    /// Scalar or comment text.
    pub value: String,
    /// For scalars: the node was plain and untagged, so the tag may be
    /// inferred from content. For document markers: no explicit `---`/`...`.
    pub implicit: bool,
    /// For scalars: the node was quoted (or a block scalar) and untagged.
    pub quoted_implicit: bool,
    pub scalar_style: RawScalarStyle,
    pub collection_style: RawCollectionStyle,
    /// Present on `DocumentStart` when the source declared `%YAML`.
    pub version: Option<RawVersionDirective>,
    /// `%TAG` directives in declaration order, on `DocumentStart`.
    pub tag_directives: Vec<RawTagDirective>,
}

impl Default for RawEventKind {
    fn default() -> Self {
        RawEventKind::StreamEnd
    }
}

impl RawEvent {
    pub(crate) fn new(kind: RawEventKind, mark: Mark) -> Self {
        RawEvent {
            kind,
            mark,
            ..Default::default()
        }
    }
}
