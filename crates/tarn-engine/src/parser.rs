//! Comment-preserving raw event parser.
//!
//! Parses a YAML document stream into a flat sequence of [`RawEvent`]s.
//! Comments are first-class events, emitted at their structural position:
//! before the node they precede, or between a mapping key and its value.
//!
//! The whole buffer is parsed up front; [`Parser::next`] pops one event at
//! a time, ending with exactly one `StreamEnd`.

use std::collections::{HashMap, VecDeque};

use crate::cursor::{Cursor, Mark};
use crate::error::ParseError;
use crate::raw::{
    RawCollectionStyle, RawEvent, RawEventKind, RawScalarStyle, RawTagDirective,
    RawVersionDirective,
};

const DEFAULT_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Chomping mode of a block scalar header.
#[derive(Clone, Copy, PartialEq)]
enum Chomp {
    Clip,
    Strip,
    Keep,
}

/// Raw event parser over a complete in-memory buffer.
pub struct Parser {
    events: VecDeque<RawEvent>,
}

impl Parser {
    /// Parse the whole source. Any error aborts the parse.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut builder = Builder {
            cur: Cursor::new(source),
            events: Vec::new(),
            tag_handles: HashMap::new(),
            line_indent: 0,
        };
        builder.parse_stream()?;
        tracing::debug!(events = builder.events.len(), "parsed raw event stream");
        Ok(Parser {
            events: builder.events.into(),
        })
    }

    /// Pop the next raw event. `StreamEnd` is the last one returned.
    pub fn next(&mut self) -> Option<RawEvent> {
        self.events.pop_front()
    }
}

struct Builder<'src> {
    cur: Cursor<'src>,
    events: Vec<RawEvent>,
    /// Handle -> prefix map for the current document.
    tag_handles: HashMap<String, String>,
    /// Indent of the line the cursor most recently entered.
    line_indent: usize,
}

impl<'src> Builder<'src> {
    fn err<T>(&self, msg: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::new(msg, self.cur.mark()))
    }

    // ─── event helpers ───────────────────────────────────────────────────

    fn push(&mut self, event: RawEvent) {
        self.events.push(event);
    }

    fn push_comment(&mut self, mark: Mark, text: &str) {
        let mut event = RawEvent::new(RawEventKind::Comment, mark);
        event.value = comment_text(text).to_string();
        self.push(event);
    }

    fn push_scalar(
        &mut self,
        mark: Mark,
        anchor: String,
        tag: String,
        value: String,
        style: RawScalarStyle,
    ) {
        let untagged = tag.is_empty();
        let mut event = RawEvent::new(RawEventKind::Scalar, mark);
        event.anchor = anchor;
        event.tag = tag;
        event.value = value;
        event.scalar_style = style;
        match style {
            RawScalarStyle::Plain | RawScalarStyle::Any => event.implicit = untagged,
            _ => event.quoted_implicit = untagged,
        }
        self.push(event);
    }

    fn push_null_scalar(&mut self, mark: Mark, anchor: String, tag: String) {
        self.push_scalar(mark, anchor, tag, String::new(), RawScalarStyle::Plain);
    }

    fn push_collection_start(
        &mut self,
        kind: RawEventKind,
        mark: Mark,
        anchor: String,
        tag: String,
        style: RawCollectionStyle,
    ) {
        let untagged = tag.is_empty();
        let mut event = RawEvent::new(kind, mark);
        event.anchor = anchor;
        event.tag = tag;
        event.collection_style = style;
        event.implicit = untagged;
        self.push(event);
    }

    fn push_end(&mut self, kind: RawEventKind) {
        self.push(RawEvent::new(kind, self.cur.mark()));
    }

    // ─── line scanning ───────────────────────────────────────────────────

    /// Skip fully blank lines. Cursor must be at a line start.
    fn skip_blank_lines(&mut self) {
        while !self.cur.is_eof() {
            let line = self.cur.rest_of_line();
            if line.trim_matches(' ').is_empty() {
                self.cur.skip_to_next_line();
            } else {
                break;
            }
        }
    }

    /// Advance to the next content line, emitting comment lines as events
    /// along the way. Leaves the cursor at the content line's start and
    /// returns its indent, or `None` at end of input.
    ///
    /// Idempotent when already positioned at a content line start.
    fn peek_content(&mut self) -> Option<usize> {
        loop {
            if self.cur.is_eof() {
                return None;
            }
            let line = self.cur.rest_of_line();
            let trimmed = line.trim_start_matches(' ');
            if trimmed.is_empty() {
                self.cur.skip_to_next_line();
                continue;
            }
            if trimmed.starts_with('#') {
                let mark = self.cur.mark();
                self.push_comment(mark, trimmed);
                self.cur.skip_to_next_line();
                continue;
            }
            return Some(line.len() - trimmed.len());
        }
    }

    /// The content of the line the cursor is at, with indentation stripped.
    /// Only meaningful right after `peek_content`.
    fn content_line(&self) -> &'src str {
        self.cur.rest_of_line().trim_start_matches(' ')
    }

    /// Consume the indentation of the current content line.
    fn enter_line(&mut self) {
        let indent = self.cur.skip_spaces();
        self.line_indent = indent;
    }

    /// Consume the tail of the current line: optional trailing comment,
    /// then the line break. Anything else is an error.
    fn finish_line(&mut self) -> Result<(), ParseError> {
        self.cur.skip_spaces();
        if self.cur.peek() == Some('#') {
            let mark = self.cur.mark();
            let text = self.cur.rest_of_line().to_string();
            self.push_comment(mark, &text);
            self.cur.skip_to_next_line();
            return Ok(());
        }
        if self.cur.at_line_end() {
            self.cur.eat_line_break();
            return Ok(());
        }
        self.err("unexpected trailing content on line")
    }

    // ─── stream / document structure ─────────────────────────────────────

    fn parse_stream(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_blank_lines();
            if self.cur.is_eof() {
                break;
            }
            self.parse_document()?;
        }
        let mark = self.cur.mark();
        self.push(RawEvent::new(RawEventKind::StreamEnd, mark));
        Ok(())
    }

    fn parse_document(&mut self) -> Result<(), ParseError> {
        self.tag_handles.clear();
        let doc_mark = self.cur.mark();
        let mut version = None;
        let mut tag_directives = Vec::new();
        let mut explicit = false;
        let mut pending: Vec<(Mark, String)> = Vec::new();

        // Prologue: blank lines, leading comments, directives, `---`.
        loop {
            self.skip_blank_lines();
            if self.cur.is_eof() {
                break;
            }
            let line = self.cur.rest_of_line();
            let trimmed = line.trim_start_matches(' ');
            let indent = line.len() - trimmed.len();
            if trimmed.starts_with('#') {
                pending.push((self.cur.mark(), trimmed.to_string()));
                self.cur.skip_to_next_line();
                continue;
            }
            if indent == 0 && trimmed.starts_with("%YAML") {
                self.enter_line();
                version = Some(self.parse_version_directive()?);
                self.finish_line()?;
                continue;
            }
            if indent == 0 && trimmed.starts_with("%TAG") {
                self.enter_line();
                let directive = self.parse_tag_directive()?;
                self.tag_handles
                    .insert(directive.handle.clone(), directive.prefix.clone());
                tag_directives.push(directive);
                self.finish_line()?;
                continue;
            }
            if indent == 0 && trimmed.starts_with('%') {
                return self.err("unknown directive");
            }
            if indent == 0 && is_document_start(trimmed) {
                self.enter_line();
                self.cur.eat("---");
                self.cur.skip_spaces();
                explicit = true;
            }
            break;
        }

        let had_directives = version.is_some() || !tag_directives.is_empty();
        if self.cur.is_eof() && !explicit && !had_directives && pending.is_empty() {
            return Ok(());
        }

        let mut start = RawEvent::new(RawEventKind::DocumentStart, doc_mark);
        start.implicit = !explicit && !had_directives;
        start.version = version;
        start.tag_directives = tag_directives;
        self.push(start);
        for (mark, text) in pending {
            self.push_comment(mark, &text);
        }

        // Root node.
        if explicit && !self.cur.at_line_end() && self.cur.peek() != Some('#') {
            // Content on the marker line itself: `--- foo`.
            self.line_indent = 0;
            let indent = self.cur.indent();
            self.parse_block_node(indent)?;
        } else {
            if explicit {
                self.finish_line()?;
            }
            match self.peek_content() {
                None => {
                    let mark = self.cur.mark();
                    self.push_null_scalar(mark, String::new(), String::new());
                }
                Some(indent) => {
                    let content = self.content_line();
                    if indent == 0
                        && (is_document_start(content) || is_document_end(content))
                    {
                        let mark = self.cur.mark();
                        self.push_null_scalar(mark, String::new(), String::new());
                    } else {
                        self.enter_line();
                        self.parse_block_node(indent)?;
                    }
                }
            }
        }

        // Epilogue: trailing comments, then an optional `...` marker.
        let mut end = RawEvent::new(RawEventKind::DocumentEnd, self.cur.mark());
        end.implicit = true;
        if let Some(0) = self.peek_content()
            && is_document_end(self.content_line())
        {
            self.enter_line();
            self.cur.eat("...");
            self.finish_line()?;
            end.implicit = false;
        }
        self.push(end);
        Ok(())
    }

    fn parse_version_directive(&mut self) -> Result<RawVersionDirective, ParseError> {
        self.cur.eat("%YAML");
        self.cur.skip_spaces();
        let token = self.take_while(|c| c.is_ascii_digit() || c == '.');
        let mut parts = token.splitn(2, '.');
        let major = parts.next().and_then(|p| p.parse().ok());
        let minor = parts.next().and_then(|p| p.parse().ok());
        match (major, minor) {
            (Some(major), Some(minor)) => Ok(RawVersionDirective { major, minor }),
            _ => self.err("malformed %YAML directive"),
        }
    }

    fn parse_tag_directive(&mut self) -> Result<RawTagDirective, ParseError> {
        self.cur.eat("%TAG");
        self.cur.skip_spaces();
        let handle = self.take_while(|c| !c.is_whitespace()).to_string();
        self.cur.skip_spaces();
        let prefix = self.take_while(|c| !c.is_whitespace()).to_string();
        if handle.is_empty() || prefix.is_empty() {
            return self.err("malformed %TAG directive");
        }
        Ok(RawTagDirective { handle, prefix })
    }

    // ─── block nodes ─────────────────────────────────────────────────────

    /// Parse a block-context node. The cursor is at the node's first
    /// character; `indent` is the node's column.
    fn parse_block_node(&mut self, indent: usize) -> Result<(), ParseError> {
        let (anchor, tag) = self.parse_node_properties()?;
        if self.cur.at_line_end() || self.cur.peek() == Some('#') {
            // Properties alone on the line; content follows deeper.
            let mark = self.cur.mark();
            self.finish_line()?;
            match self.peek_content() {
                Some(child) if child > indent => {
                    self.enter_line();
                    self.dispatch_block(child, anchor, tag)
                }
                Some(child) if child == indent && is_sequence_dash(self.content_line()) => {
                    self.enter_line();
                    self.parse_block_sequence(indent, anchor, tag)
                }
                _ => {
                    self.push_null_scalar(mark, anchor, tag);
                    Ok(())
                }
            }
        } else {
            self.dispatch_block(indent, anchor, tag)
        }
    }

    fn dispatch_block(
        &mut self,
        indent: usize,
        anchor: String,
        tag: String,
    ) -> Result<(), ParseError> {
        match self.cur.peek() {
            Some('*') => {
                self.parse_alias()?;
                self.finish_line()
            }
            Some('|') | Some('>') => self.parse_block_scalar(self.line_indent, anchor, tag),
            Some('[') | Some('{') => {
                self.parse_flow_collection(anchor, tag)?;
                self.finish_line()
            }
            Some('-') if is_sequence_dash(self.cur.rest_of_line()) => {
                self.parse_block_sequence(indent, anchor, tag)
            }
            _ => {
                let line = self.cur.rest_of_line();
                if find_map_colon(line).is_some() {
                    self.parse_block_mapping(indent, anchor, tag)
                } else {
                    match self.cur.peek() {
                        Some('\'') | Some('"') => {
                            self.parse_quoted_scalar(anchor, tag)?;
                            self.finish_line()
                        }
                        _ => {
                            self.parse_plain_scalar(anchor, tag)?;
                            self.finish_line()
                        }
                    }
                }
            }
        }
    }

    fn parse_block_mapping(
        &mut self,
        indent: usize,
        anchor: String,
        tag: String,
    ) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        self.push_collection_start(
            RawEventKind::MappingStart,
            mark,
            anchor,
            tag,
            RawCollectionStyle::Block,
        );
        loop {
            self.parse_mapping_entry(indent)?;
            match self.peek_content() {
                Some(next) if next == indent => {
                    let content = self.content_line();
                    if indent == 0
                        && (is_document_start(content) || is_document_end(content))
                    {
                        break;
                    }
                    if is_sequence_dash(content) {
                        break;
                    }
                    self.enter_line();
                }
                _ => break,
            }
        }
        self.push_end(RawEventKind::MappingEnd);
        Ok(())
    }

    fn parse_mapping_entry(&mut self, indent: usize) -> Result<(), ParseError> {
        // Key.
        let key_mark = self.cur.mark();
        match self.cur.peek() {
            Some('\'') | Some('"') => {
                self.parse_quoted_scalar(String::new(), String::new())?;
                self.cur.skip_spaces();
                if self.cur.peek() != Some(':') {
                    return self.err("expected ':' after mapping key");
                }
            }
            _ => {
                let line = self.cur.rest_of_line();
                let Some(colon) = find_map_colon(line) else {
                    return self.err("expected ':' in mapping entry");
                };
                let text = line[..colon].trim_end_matches(' ').to_string();
                self.push_scalar(
                    key_mark,
                    String::new(),
                    String::new(),
                    text,
                    RawScalarStyle::Plain,
                );
                self.bump_bytes(colon);
            }
        }
        self.cur.bump(); // ':'
        self.cur.skip_spaces();

        // Value.
        if !self.cur.at_line_end() && self.cur.peek() != Some('#') {
            self.parse_inline_value(indent)
        } else {
            let mark = self.cur.mark();
            self.finish_line()?;
            match self.peek_content() {
                Some(child) if child > indent => {
                    self.enter_line();
                    self.parse_block_node(child)
                }
                Some(child)
                    if child == indent
                        && is_sequence_dash(self.content_line())
                        && !(indent == 0 && is_document_start(self.content_line())) =>
                {
                    // Zero-indented sequence under the key.
                    self.enter_line();
                    self.parse_block_sequence(indent, String::new(), String::new())
                }
                _ => {
                    self.push_null_scalar(mark, String::new(), String::new());
                    Ok(())
                }
            }
        }
    }

    /// Parse a mapping value that starts on the key's own line.
    fn parse_inline_value(&mut self, indent: usize) -> Result<(), ParseError> {
        let (anchor, tag) = self.parse_node_properties()?;
        if self.cur.at_line_end() || self.cur.peek() == Some('#') {
            let mark = self.cur.mark();
            self.finish_line()?;
            return match self.peek_content() {
                Some(child) if child > indent => {
                    self.enter_line();
                    self.dispatch_block(child, anchor, tag)
                }
                Some(child) if child == indent && is_sequence_dash(self.content_line()) => {
                    self.enter_line();
                    self.parse_block_sequence(indent, anchor, tag)
                }
                _ => {
                    self.push_null_scalar(mark, anchor, tag);
                    Ok(())
                }
            };
        }
        match self.cur.peek() {
            Some('*') => {
                self.parse_alias()?;
                self.finish_line()
            }
            // A block scalar header on the key line indents relative to the
            // key's line, not the header's column.
            Some('|') | Some('>') => self.parse_block_scalar(indent, anchor, tag),
            Some('\'') | Some('"') => {
                self.parse_quoted_scalar(anchor, tag)?;
                self.finish_line()
            }
            Some('[') | Some('{') => {
                self.parse_flow_collection(anchor, tag)?;
                self.finish_line()
            }
            _ => {
                if find_map_colon(self.cur.rest_of_line()).is_some() {
                    return self.err("nested mapping on the same line as its key");
                }
                self.parse_plain_scalar(anchor, tag)?;
                self.finish_line()
            }
        }
    }

    fn parse_block_sequence(
        &mut self,
        indent: usize,
        anchor: String,
        tag: String,
    ) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        self.push_collection_start(
            RawEventKind::SequenceStart,
            mark,
            anchor,
            tag,
            RawCollectionStyle::Block,
        );
        loop {
            self.cur.bump(); // '-'
            self.cur.skip_spaces();
            if self.cur.at_line_end() || self.cur.peek() == Some('#') {
                // Item on following lines (possibly after a comment on the
                // dash line).
                let mark = self.cur.mark();
                self.finish_line()?;
                match self.peek_content() {
                    Some(child) if child > indent => {
                        self.enter_line();
                        self.parse_block_node(child)?;
                    }
                    _ => self.push_null_scalar(mark, String::new(), String::new()),
                }
            } else {
                // Compact item on the dash line.
                let item_indent = self.cur.indent();
                self.parse_block_node(item_indent)?;
            }
            match self.peek_content() {
                Some(next) if next == indent => {
                    let content = self.content_line();
                    if indent == 0
                        && (is_document_start(content) || is_document_end(content))
                    {
                        break;
                    }
                    if !is_sequence_dash(content) {
                        break;
                    }
                    self.enter_line();
                }
                _ => break,
            }
        }
        self.push_end(RawEventKind::SequenceEnd);
        Ok(())
    }

    // ─── scalars ─────────────────────────────────────────────────────────

    fn parse_plain_scalar(&mut self, anchor: String, tag: String) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        let line = self.cur.rest_of_line();
        let end = find_comment_start(line).unwrap_or(line.len());
        let text = line[..end].trim_end_matches(' ').to_string();
        if text.is_empty() {
            return self.err("expected a scalar value");
        }
        self.bump_bytes(end);
        self.push_scalar(mark, anchor, tag, text, RawScalarStyle::Plain);
        Ok(())
    }

    fn parse_quoted_scalar(&mut self, anchor: String, tag: String) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        let quote = self.cur.bump().unwrap_or('"');
        let style = if quote == '\'' {
            RawScalarStyle::SingleQuoted
        } else {
            RawScalarStyle::DoubleQuoted
        };
        let mut value = String::new();
        loop {
            let Some(c) = self.cur.peek() else {
                return self.err("unterminated quoted scalar");
            };
            match c {
                '\'' if quote == '\'' => {
                    self.cur.bump();
                    if self.cur.peek() == Some('\'') {
                        self.cur.bump();
                        value.push('\'');
                    } else {
                        break;
                    }
                }
                '"' if quote == '"' => {
                    self.cur.bump();
                    break;
                }
                '\\' if quote == '"' => {
                    self.cur.bump();
                    self.parse_escape(&mut value)?;
                }
                '\n' | '\r' => {
                    // Line folding inside a quoted scalar.
                    while value.ends_with(' ') {
                        value.pop();
                    }
                    self.cur.eat_line_break();
                    self.cur.skip_spaces();
                    if self.cur.at_line_end() {
                        value.push('\n');
                    } else {
                        value.push(' ');
                    }
                }
                _ => {
                    self.cur.bump();
                    value.push(c);
                }
            }
        }
        self.push_scalar(mark, anchor, tag, value, style);
        Ok(())
    }

    fn parse_escape(&mut self, value: &mut String) -> Result<(), ParseError> {
        let Some(c) = self.cur.bump() else {
            return self.err("unterminated escape sequence");
        };
        match c {
            '0' => value.push('\0'),
            'a' => value.push('\x07'),
            'b' => value.push('\x08'),
            't' => value.push('\t'),
            'n' => value.push('\n'),
            'v' => value.push('\x0b'),
            'f' => value.push('\x0c'),
            'r' => value.push('\r'),
            'e' => value.push('\x1b'),
            ' ' => value.push(' '),
            '"' => value.push('"'),
            '\\' => value.push('\\'),
            '/' => value.push('/'),
            'x' => self.parse_hex_escape(value, 2)?,
            'u' => self.parse_hex_escape(value, 4)?,
            'U' => self.parse_hex_escape(value, 8)?,
            '\n' => {
                // Escaped line break: continuation without a space.
                self.cur.skip_spaces();
            }
            _ => return self.err(format!("invalid escape sequence '\\{c}'")),
        }
        Ok(())
    }

    fn parse_hex_escape(&mut self, value: &mut String, digits: usize) -> Result<(), ParseError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let Some(c) = self.cur.bump() else {
                return self.err("unterminated escape sequence");
            };
            let Some(d) = c.to_digit(16) else {
                return self.err("invalid hex digit in escape sequence");
            };
            code = code * 16 + d;
        }
        match char::from_u32(code) {
            Some(c) => {
                value.push(c);
                Ok(())
            }
            None => self.err("escape sequence is not a valid character"),
        }
    }

    /// Parse a `|` or `>` block scalar. `base_indent` is the indent of the
    /// line carrying the header; content must be indented past it.
    fn parse_block_scalar(
        &mut self,
        base_indent: usize,
        anchor: String,
        tag: String,
    ) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        let style = if self.cur.bump() == Some('|') {
            RawScalarStyle::Literal
        } else {
            RawScalarStyle::Folded
        };
        let mut chomp = Chomp::Clip;
        let mut explicit_indent = None;
        while let Some(c) = self.cur.peek() {
            match c {
                '-' => {
                    chomp = Chomp::Strip;
                    self.cur.bump();
                }
                '+' => {
                    chomp = Chomp::Keep;
                    self.cur.bump();
                }
                '1'..='9' => {
                    explicit_indent = Some(c as usize - '0' as usize);
                    self.cur.bump();
                }
                _ => break,
            }
        }
        self.cur.skip_spaces();
        // A comment on the header line precedes the scalar event.
        if self.cur.peek() == Some('#') {
            let comment_mark = self.cur.mark();
            let text = self.cur.rest_of_line().to_string();
            self.push_comment(comment_mark, &text);
        } else if !self.cur.at_line_end() {
            return self.err("unexpected characters after block scalar header");
        }
        self.cur.skip_to_next_line();

        let mut content_indent = explicit_indent.map(|d| base_indent + d);
        let mut lines: Vec<String> = Vec::new();
        loop {
            if self.cur.is_eof() {
                break;
            }
            let raw = self.cur.rest_of_line();
            let stripped = raw.trim_start_matches(' ');
            if stripped.is_empty() {
                lines.push(String::new());
                self.cur.skip_to_next_line();
                continue;
            }
            let indent = raw.len() - stripped.len();
            match content_indent {
                None if indent > base_indent => content_indent = Some(indent),
                None => break,
                Some(ci) if indent < ci => break,
                Some(_) => {}
            }
            let ci = content_indent.unwrap_or(indent);
            lines.push(raw[ci.min(raw.len())..].to_string());
            self.cur.skip_to_next_line();
        }

        let mut trailing = 0usize;
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
            trailing += 1;
        }
        let mut body = if style == RawScalarStyle::Literal {
            lines.join("\n")
        } else {
            fold_lines(&lines)
        };
        match chomp {
            Chomp::Strip => {}
            Chomp::Clip => {
                if !lines.is_empty() {
                    body.push('\n');
                }
            }
            Chomp::Keep => {
                let breaks = if lines.is_empty() { trailing } else { trailing + 1 };
                for _ in 0..breaks {
                    body.push('\n');
                }
            }
        }
        self.push_scalar(mark, anchor, tag, body, style);
        Ok(())
    }

    // ─── flow collections ────────────────────────────────────────────────

    fn parse_flow_collection(&mut self, anchor: String, tag: String) -> Result<(), ParseError> {
        match self.cur.peek() {
            Some('[') => self.parse_flow_sequence(anchor, tag),
            Some('{') => self.parse_flow_mapping(anchor, tag),
            _ => self.err("expected a flow collection"),
        }
    }

    fn parse_flow_sequence(&mut self, anchor: String, tag: String) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        self.cur.bump(); // '['
        self.push_collection_start(
            RawEventKind::SequenceStart,
            mark,
            anchor,
            tag,
            RawCollectionStyle::Flow,
        );
        self.flow_whitespace();
        if self.cur.peek() == Some(']') {
            self.cur.bump();
            self.push_end(RawEventKind::SequenceEnd);
            return Ok(());
        }
        loop {
            self.parse_flow_node()?;
            self.flow_whitespace();
            match self.cur.peek() {
                Some(',') => {
                    self.cur.bump();
                    self.flow_whitespace();
                    if self.cur.peek() == Some(']') {
                        self.cur.bump();
                        break;
                    }
                }
                Some(']') => {
                    self.cur.bump();
                    break;
                }
                _ => return self.err("expected ',' or ']' in flow sequence"),
            }
        }
        self.push_end(RawEventKind::SequenceEnd);
        Ok(())
    }

    fn parse_flow_mapping(&mut self, anchor: String, tag: String) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        self.cur.bump(); // '{'
        self.push_collection_start(
            RawEventKind::MappingStart,
            mark,
            anchor,
            tag,
            RawCollectionStyle::Flow,
        );
        self.flow_whitespace();
        if self.cur.peek() == Some('}') {
            self.cur.bump();
            self.push_end(RawEventKind::MappingEnd);
            return Ok(());
        }
        loop {
            self.parse_flow_node()?;
            self.flow_whitespace();
            if self.cur.peek() == Some(':') {
                self.cur.bump();
                self.flow_whitespace();
                self.parse_flow_node()?;
                self.flow_whitespace();
            } else {
                let mark = self.cur.mark();
                self.push_null_scalar(mark, String::new(), String::new());
            }
            match self.cur.peek() {
                Some(',') => {
                    self.cur.bump();
                    self.flow_whitespace();
                    if self.cur.peek() == Some('}') {
                        self.cur.bump();
                        break;
                    }
                }
                Some('}') => {
                    self.cur.bump();
                    break;
                }
                _ => return self.err("expected ',' or '}' in flow mapping"),
            }
        }
        self.push_end(RawEventKind::MappingEnd);
        Ok(())
    }

    fn parse_flow_node(&mut self) -> Result<(), ParseError> {
        let (anchor, tag) = self.parse_node_properties()?;
        self.flow_whitespace();
        match self.cur.peek() {
            Some('[') | Some('{') => self.parse_flow_collection(anchor, tag),
            Some('\'') | Some('"') => self.parse_quoted_scalar(anchor, tag),
            Some('*') => self.parse_alias(),
            _ => self.parse_flow_plain_scalar(anchor, tag),
        }
    }

    fn parse_flow_plain_scalar(&mut self, anchor: String, tag: String) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        let mut text = String::new();
        while let Some(c) = self.cur.peek() {
            match c {
                ',' | '[' | ']' | '{' | '}' | '\n' | '\r' => break,
                ':' => {
                    let rest = self.cur.rest();
                    let next = rest.chars().nth(1);
                    if matches!(next, None | Some(' ') | Some(',') | Some(']') | Some('}')) {
                        break;
                    }
                    text.push(c);
                    self.cur.bump();
                }
                '#' if text.ends_with(' ') => break,
                _ => {
                    text.push(c);
                    self.cur.bump();
                }
            }
        }
        let text = text.trim_end_matches(' ').to_string();
        if text.is_empty() {
            return self.err("expected a flow node");
        }
        self.push_scalar(mark, anchor, tag, text, RawScalarStyle::Plain);
        Ok(())
    }

    /// Skip spaces, line breaks, and comments inside a flow collection.
    fn flow_whitespace(&mut self) {
        loop {
            self.cur.skip_spaces();
            if self.cur.peek() == Some('#') {
                let mark = self.cur.mark();
                let text = self.cur.rest_of_line().to_string();
                self.push_comment(mark, &text);
                self.cur.skip_to_next_line();
                continue;
            }
            if self.cur.at_line_end() && !self.cur.is_eof() {
                self.cur.eat_line_break();
                continue;
            }
            break;
        }
    }

    // ─── node properties ─────────────────────────────────────────────────

    /// Parse optional `&anchor` and tag before a node.
    fn parse_node_properties(&mut self) -> Result<(String, String), ParseError> {
        let mut anchor = String::new();
        let mut tag = String::new();
        loop {
            match self.cur.peek() {
                Some('&') if anchor.is_empty() => {
                    self.cur.bump();
                    anchor = self
                        .take_while(|c| c.is_alphanumeric() || c == '-' || c == '_')
                        .to_string();
                    if anchor.is_empty() {
                        return self.err("expected anchor name after '&'");
                    }
                    self.cur.skip_spaces();
                }
                Some('!') if tag.is_empty() => {
                    tag = self.parse_tag_token()?;
                    self.cur.skip_spaces();
                }
                _ => break,
            }
        }
        Ok((anchor, tag))
    }

    fn parse_tag_token(&mut self) -> Result<String, ParseError> {
        self.cur.bump(); // '!'
        if self.cur.peek() == Some('<') {
            self.cur.bump();
            let uri = self.take_while(|c| c != '>' && c != '\n').to_string();
            if !self.cur.eat(">") {
                return self.err("unterminated verbatim tag");
            }
            return Ok(uri);
        }
        if self.cur.peek() == Some('!') {
            // `!!suffix` shorthand for the core schema prefix.
            self.cur.bump();
            let suffix = self.take_while(is_tag_char);
            return Ok(format!("{DEFAULT_TAG_PREFIX}{suffix}"));
        }
        let first = self.take_while(is_tag_char).to_string();
        if self.cur.peek() == Some('!') {
            // `!handle!suffix` with a %TAG-declared handle.
            self.cur.bump();
            let suffix = self.take_while(is_tag_char);
            let handle = format!("!{first}!");
            let Some(prefix) = self.tag_handles.get(&handle) else {
                return self.err(format!("undeclared tag handle '{handle}'"));
            };
            return Ok(format!("{prefix}{suffix}"));
        }
        if first.is_empty() {
            // A lone `!` is the non-specific tag.
            return Ok("!".to_string());
        }
        Ok(format!("!{first}"))
    }

    fn parse_alias(&mut self) -> Result<(), ParseError> {
        let mark = self.cur.mark();
        self.cur.bump(); // '*'
        let name = self
            .take_while(|c| c.is_alphanumeric() || c == '-' || c == '_')
            .to_string();
        if name.is_empty() {
            return self.err("expected alias name after '*'");
        }
        let mut event = RawEvent::new(RawEventKind::Alias, mark);
        event.anchor = name;
        self.push(event);
        Ok(())
    }

    // ─── low-level helpers ───────────────────────────────────────────────

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let rest = self.cur.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(rest.len(), |(i, _)| i);
        self.bump_bytes(end);
        &rest[..end]
    }

    fn bump_bytes(&mut self, n: usize) {
        let mut consumed = 0;
        while consumed < n {
            match self.cur.bump() {
                Some(c) => consumed += c.len_utf8(),
                None => break,
            }
        }
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '%')
}

fn is_document_start(content: &str) -> bool {
    content == "---" || content.starts_with("--- ")
}

fn is_document_end(content: &str) -> bool {
    content == "..." || content.starts_with("... ")
}

/// True for a line that begins a block sequence item: `-` followed by a
/// separator or end of line.
fn is_sequence_dash(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Strip the `#` marker and at most one following space from a comment.
fn comment_text(raw: &str) -> &str {
    let text = raw.strip_prefix('#').unwrap_or(raw);
    text.strip_prefix(' ').unwrap_or(text)
}

/// Find the byte offset of a block-mapping `:` on this line, skipping
/// quoted and flow regions. The colon must be followed by a separator.
fn find_map_colon(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_single {
            if b == b'\'' {
                in_single = false;
            }
        } else if in_double {
            if b == b'\\' {
                i += 1;
            } else if b == b'"' {
                in_double = false;
            }
        } else {
            match b {
                b'\'' => in_single = true,
                b'"' => in_double = true,
                b'[' | b'{' => depth += 1,
                b']' | b'}' => depth = depth.saturating_sub(1),
                b'#' if depth == 0 && i > 0 && bytes[i - 1] == b' ' => return None,
                b':' if depth == 0 => {
                    let next = bytes.get(i + 1);
                    if matches!(next, None | Some(b' ') | Some(b'\t')) {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Find where a trailing comment starts on a plain-scalar line.
fn find_comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    (1..bytes.len()).find(|&i| bytes[i] == b'#' && bytes[i - 1] == b' ')
}

/// Fold block-scalar lines: single breaks become spaces, blank lines become
/// newlines, and more-indented lines keep their literal breaks.
fn fold_lines(lines: &[String]) -> String {
    let mut result = String::new();
    let mut prev: Option<&str> = None;
    for line in lines {
        if let Some(p) = prev {
            if line.is_empty() {
                result.push('\n');
            } else if p.is_empty() {
                // Break already emitted for the blank line.
            } else if line.starts_with(' ') || p.starts_with(' ') {
                result.push('\n');
            } else {
                result.push(' ');
            }
        }
        result.push_str(line);
        prev = Some(line);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<RawEvent> {
        let mut parser = Parser::new(source).expect("parse failed");
        let mut events = Vec::new();
        while let Some(event) = parser.next() {
            let done = event.kind == RawEventKind::StreamEnd;
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    fn kinds(events: &[RawEvent]) -> Vec<RawEventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn simple_mapping() {
        use RawEventKind::*;
        let events = parse("key: value\n");
        assert_eq!(
            kinds(&events),
            vec![
                DocumentStart,
                MappingStart,
                Scalar,
                Scalar,
                MappingEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
        assert_eq!(events[2].value, "key");
        assert_eq!(events[3].value, "value");
        assert!(events[2].implicit);
        assert!(events[0].implicit);
    }

    #[test]
    fn comment_between_key_and_value() {
        use RawEventKind::*;
        let events = parse("key: # here\n  value\n");
        assert_eq!(
            kinds(&events),
            vec![
                DocumentStart,
                MappingStart,
                Scalar,
                Comment,
                Scalar,
                MappingEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
        assert_eq!(events[3].value, "here");
        assert_eq!(events[4].value, "value");
    }

    #[test]
    fn leading_comments_precede_content() {
        use RawEventKind::*;
        let events = parse("# one\n# two\nkey: value\n");
        assert_eq!(
            kinds(&events)[..4],
            [DocumentStart, Comment, Comment, MappingStart]
        );
        assert_eq!(events[1].value, "one");
        assert_eq!(events[2].value, "two");
    }

    #[test]
    fn block_scalar_with_header_comment() {
        use RawEventKind::*;
        let events = parse("key: | # block\n  a\n  b\n");
        assert_eq!(
            kinds(&events),
            vec![
                DocumentStart,
                MappingStart,
                Scalar,
                Comment,
                Scalar,
                MappingEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
        assert_eq!(events[4].value, "a\nb\n");
        assert_eq!(events[4].scalar_style, RawScalarStyle::Literal);
        assert!(events[4].quoted_implicit);
        assert!(!events[4].implicit);
    }

    #[test]
    fn block_scalar_chomping() {
        let events = parse("a: |-\n  x\nb: |+\n  y\n\n");
        let scalars: Vec<_> = events
            .iter()
            .filter(|e| e.kind == RawEventKind::Scalar)
            .collect();
        assert_eq!(scalars[1].value, "x");
        assert_eq!(scalars[3].value, "y\n\n");
    }

    #[test]
    fn folded_scalar_joins_lines() {
        let events = parse("key: >\n  a\n  b\n\n  c\n");
        let folded = events
            .iter()
            .find(|e| e.scalar_style == RawScalarStyle::Folded)
            .unwrap();
        assert_eq!(folded.value, "a b\nc\n");
    }

    #[test]
    fn sequence_with_compact_mapping() {
        use RawEventKind::*;
        let events = parse("- key: value\n- key: value\n");
        assert_eq!(
            kinds(&events),
            vec![
                DocumentStart,
                SequenceStart,
                MappingStart,
                Scalar,
                Scalar,
                MappingEnd,
                MappingStart,
                Scalar,
                Scalar,
                MappingEnd,
                SequenceEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
    }

    #[test]
    fn comment_after_dash_precedes_item() {
        use RawEventKind::*;
        let events = parse("- # actually a mapping\n  key: value\n");
        assert_eq!(
            kinds(&events)[..4],
            [DocumentStart, SequenceStart, Comment, MappingStart]
        );
    }

    #[test]
    fn zero_indented_sequence_value() {
        use RawEventKind::*;
        let events = parse("key:\n- a\n- b\n");
        assert_eq!(
            kinds(&events),
            vec![
                DocumentStart,
                MappingStart,
                Scalar,
                SequenceStart,
                Scalar,
                Scalar,
                SequenceEnd,
                MappingEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
    }

    #[test]
    fn flow_collections() {
        use RawEventKind::*;
        let events = parse("key: {a: 1, b: [x, y]}\n");
        assert_eq!(
            kinds(&events),
            vec![
                DocumentStart,
                MappingStart,
                Scalar,
                MappingStart,
                Scalar,
                Scalar,
                Scalar,
                SequenceStart,
                Scalar,
                Scalar,
                SequenceEnd,
                MappingEnd,
                MappingEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
        let flow_map = &events[3];
        assert_eq!(flow_map.collection_style, RawCollectionStyle::Flow);
    }

    #[test]
    fn quoted_scalars() {
        let events = parse("a: 'it''s'\nb: \"x\\ny\"\n");
        let scalars: Vec<_> = events
            .iter()
            .filter(|e| e.kind == RawEventKind::Scalar)
            .collect();
        assert_eq!(scalars[1].value, "it's");
        assert_eq!(scalars[1].scalar_style, RawScalarStyle::SingleQuoted);
        assert!(scalars[1].quoted_implicit);
        assert_eq!(scalars[3].value, "x\ny");
        assert_eq!(scalars[3].scalar_style, RawScalarStyle::DoubleQuoted);
    }

    #[test]
    fn anchors_aliases_and_tags() {
        let events = parse("a: &node !!str hello\nb: *node\n");
        let scalar = events
            .iter()
            .find(|e| e.kind == RawEventKind::Scalar && e.value == "hello")
            .unwrap();
        assert_eq!(scalar.anchor, "node");
        assert_eq!(scalar.tag, "tag:yaml.org,2002:str");
        assert!(!scalar.implicit);
        assert!(!scalar.quoted_implicit);
        let alias = events
            .iter()
            .find(|e| e.kind == RawEventKind::Alias)
            .unwrap();
        assert_eq!(alias.anchor, "node");
    }

    #[test]
    fn explicit_document_markers() {
        use RawEventKind::*;
        let events = parse("---\n# empty\n...\n");
        assert_eq!(
            kinds(&events),
            vec![DocumentStart, Comment, Scalar, DocumentEnd, StreamEnd]
        );
        assert!(!events[0].implicit);
        assert!(!events[3].implicit);
        assert_eq!(events[2].value, "");
        assert!(events[2].implicit);
    }

    #[test]
    fn comment_only_document() {
        use RawEventKind::*;
        let events = parse("# this document is empty");
        assert_eq!(
            kinds(&events),
            vec![DocumentStart, Comment, Scalar, DocumentEnd, StreamEnd]
        );
        assert!(events[0].implicit);
        assert!(events[3].implicit);
    }

    #[test]
    fn multiple_documents() {
        use RawEventKind::*;
        let events = parse("a: 1\n---\nb: 2\n");
        let starts = events
            .iter()
            .filter(|e| e.kind == DocumentStart)
            .collect::<Vec<_>>();
        assert_eq!(starts.len(), 2);
        assert!(starts[0].implicit);
        assert!(!starts[1].implicit);
    }

    #[test]
    fn version_and_tag_directives() {
        let events = parse("%YAML 1.1\n%TAG !e! tag:example.com,2024:\n---\n!e!thing ok\n");
        let start = &events[0];
        assert_eq!(
            start.version,
            Some(RawVersionDirective { major: 1, minor: 1 })
        );
        assert_eq!(start.tag_directives.len(), 1);
        assert_eq!(start.tag_directives[0].handle, "!e!");
        let scalar = events
            .iter()
            .find(|e| e.kind == RawEventKind::Scalar)
            .unwrap();
        assert_eq!(scalar.tag, "tag:example.com,2024:thing");
    }

    #[test]
    fn plain_scalar_with_trailing_comment() {
        use RawEventKind::*;
        let events = parse("key: value # trailing\n");
        assert_eq!(
            kinds(&events),
            vec![
                DocumentStart,
                MappingStart,
                Scalar,
                Scalar,
                Comment,
                MappingEnd,
                DocumentEnd,
                StreamEnd
            ]
        );
        assert_eq!(events[3].value, "value");
        assert_eq!(events[4].value, "trailing");
    }

    #[test]
    fn bad_escape_is_fatal() {
        assert!(Parser::new("a: \"\\q\"\n").is_err());
    }

    #[test]
    fn marks_are_one_based() {
        let events = parse("key: value\n");
        let map = events
            .iter()
            .find(|e| e.kind == RawEventKind::MappingStart)
            .unwrap();
        assert_eq!(map.mark.line, 1);
        assert_eq!(map.mark.column, 1);
    }
}
