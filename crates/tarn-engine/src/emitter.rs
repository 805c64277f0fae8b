//! Push-based text emitter.
//!
//! The emitter accepts the same call shapes the parser produces and renders
//! them back into text. Output is buffered as logical lines so trailing
//! comments can be laid out in one pass at the end of the stream.
//!
//! Comment placement is the fidelity core:
//! - own-line comments queue up and are written at the indentation of the
//!   next content line, before that line;
//! - a queued comment whose next node is a block scalar goes inline after
//!   the `|` header instead;
//! - a queued comment between a mapping key and a non-block value pushes the
//!   value onto its own indented line below the comment;
//! - trailing comments attach to the line they follow, at the configured
//!   comment column.

use std::mem::take;

use crate::error::EmitError;
use crate::raw::{RawScalarStyle, RawTagDirective, RawVersionDirective};

const DEFAULT_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Where trailing comments start on their line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAlignment {
    /// Fixed column (0-based); comments never start before it. Column 0
    /// means one space after the content.
    Column(usize),
    /// Align each run of commented lines to its widest content line.
    Auto,
}

impl Default for CommentAlignment {
    fn default() -> Self {
        CommentAlignment::Column(0)
    }
}

/// Output layout options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterOptions {
    /// Soft wrap width for flow collections.
    pub max_width: usize,
    /// Spaces per nesting level.
    pub indent: usize,
    pub comment_column: CommentAlignment,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            max_width: 80,
            indent: 2,
            comment_column: CommentAlignment::default(),
        }
    }
}

#[derive(Clone, Copy)]
enum State {
    /// Inside a document, at the root slot.
    Doc,
    BlockMap { indent: usize, at_value: bool },
    BlockSeq { indent: usize },
    FlowMap { indent: usize, first: bool, at_value: bool },
    FlowSeq { indent: usize, first: bool },
}

struct Line {
    text: String,
    comment: Option<String>,
}

/// Push-based emitter. Consume with [`Emitter::stream_end`].
pub struct Emitter {
    opts: EmitterOptions,
    lines: Vec<Line>,
    cur: String,
    cur_comment: Option<String>,
    /// Own-line comments waiting for the next content line.
    pending: Vec<String>,
    states: Vec<State>,
    in_document: bool,
    docs_emitted: usize,
    last_end_explicit: bool,
}

impl Emitter {
    pub fn new(options: EmitterOptions) -> Self {
        Self {
            opts: options,
            lines: Vec::new(),
            cur: String::new(),
            cur_comment: None,
            pending: Vec::new(),
            states: Vec::new(),
            in_document: false,
            docs_emitted: 0,
            last_end_explicit: false,
        }
    }

    /// Marks the start of the stream. Present for call symmetry with the
    /// parser's event shapes.
    pub fn stream_start(&mut self) {}

    pub fn document_start(
        &mut self,
        version: Option<RawVersionDirective>,
        tag_directives: &[RawTagDirective],
        implicit: bool,
    ) -> Result<(), EmitError> {
        if self.in_document {
            return Err(EmitError::new("document already open"));
        }
        self.in_document = true;
        self.states.push(State::Doc);
        if let Some(v) = version {
            self.cur = format!("%YAML {}.{}", v.major, v.minor);
            self.end_line();
        }
        for d in tag_directives {
            self.cur = format!("%TAG {} {}", d.handle, d.prefix);
            self.end_line();
        }
        let has_directives = version.is_some() || !tag_directives.is_empty();
        let needs_marker =
            !implicit || has_directives || (self.docs_emitted > 0 && !self.last_end_explicit);
        if needs_marker {
            self.cur.push_str("---");
        }
        self.docs_emitted += 1;
        Ok(())
    }

    pub fn document_end(&mut self, implicit: bool) -> Result<(), EmitError> {
        match self.states.pop() {
            Some(State::Doc) => {}
            _ => return Err(EmitError::new("document end without matching start")),
        }
        if !self.cur.is_empty() {
            self.end_line();
        }
        self.flush_pending(0);
        if !implicit {
            self.cur.push_str("...");
            self.end_line();
        }
        self.last_end_explicit = !implicit;
        self.in_document = false;
        Ok(())
    }

    pub fn scalar(
        &mut self,
        anchor: &str,
        tag: &str,
        value: &str,
        style: RawScalarStyle,
        plain_implicit: bool,
        quoted_implicit: bool,
    ) -> Result<(), EmitError> {
        let top = self.top()?;
        let style = self.effective_style(style, value, top);
        let props = render_props(anchor, tag, style, plain_implicit, quoted_implicit);

        if matches!(style, RawScalarStyle::Literal | RawScalarStyle::Folded) {
            self.block_scalar_slot()?;
            self.emit_block_scalar(&props, value);
            return Ok(());
        }

        let body = render_inline_scalar(value, style);
        let rendered = join_props(&props, &body);
        if rendered.is_empty() {
            return self.empty_scalar();
        }
        match top {
            State::BlockMap { at_value: false, .. } => {
                self.key_slot();
                self.cur.push_str(&rendered);
                self.cur.push(':');
            }
            State::FlowMap { .. } | State::FlowSeq { .. } => {
                self.flow_slot();
                self.cur.push_str(&rendered);
            }
            _ => {
                self.value_slot();
                self.cur.push_str(&rendered);
                self.end_line();
            }
        }
        Ok(())
    }

    pub fn alias(&mut self, anchor: &str) -> Result<(), EmitError> {
        if anchor.is_empty() {
            return Err(EmitError::new("alias without an anchor name"));
        }
        let rendered = format!("*{anchor}");
        match self.top()? {
            State::BlockMap { at_value: false, .. } => {
                self.key_slot();
                self.cur.push_str(&rendered);
                self.cur.push(':');
            }
            State::FlowMap { .. } | State::FlowSeq { .. } => {
                self.flow_slot();
                self.cur.push_str(&rendered);
            }
            _ => {
                self.value_slot();
                self.cur.push_str(&rendered);
                self.end_line();
            }
        }
        Ok(())
    }

    pub fn sequence_start(
        &mut self,
        anchor: &str,
        tag: &str,
        flow: bool,
    ) -> Result<(), EmitError> {
        self.collection_start(anchor, tag, flow, false)
    }

    pub fn sequence_end(&mut self) -> Result<(), EmitError> {
        match self.states.pop() {
            Some(State::BlockSeq { .. }) => {
                self.close_block_item();
                Ok(())
            }
            Some(State::FlowSeq { .. }) => {
                self.cur.push(']');
                self.close_flow();
                Ok(())
            }
            _ => Err(EmitError::new("sequence end without matching start")),
        }
    }

    pub fn mapping_start(
        &mut self,
        anchor: &str,
        tag: &str,
        flow: bool,
    ) -> Result<(), EmitError> {
        self.collection_start(anchor, tag, flow, true)
    }

    pub fn mapping_end(&mut self) -> Result<(), EmitError> {
        match self.states.pop() {
            Some(State::BlockMap { .. }) => {
                self.close_block_item();
                Ok(())
            }
            Some(State::FlowMap { .. }) => {
                self.cur.push('}');
                self.close_flow();
                Ok(())
            }
            _ => Err(EmitError::new("mapping end without matching start")),
        }
    }

    pub fn comment(&mut self, text: &str, own_line: bool) {
        if own_line {
            self.pending.push(text.to_string());
        } else if !self.cur.is_empty() {
            append_comment(&mut self.cur_comment, text);
        } else if let Some(last) = self.lines.last_mut() {
            append_comment(&mut last.comment, text);
        } else {
            self.pending.push(text.to_string());
        }
    }

    /// Finish the stream and return the rendered bytes.
    pub fn stream_end(mut self) -> Vec<u8> {
        if !self.cur.is_empty() || self.cur_comment.is_some() {
            self.end_line();
        }
        self.flush_pending(0);
        tracing::trace!(lines = self.lines.len(), "emitter stream end");
        self.render()
    }

    // ─── slots ───────────────────────────────────────────────────────────

    fn top(&self) -> Result<State, EmitError> {
        self.states
            .last()
            .copied()
            .ok_or_else(|| EmitError::new("node emitted outside a document"))
    }

    fn set_top(&mut self, state: State) {
        if let Some(top) = self.states.last_mut() {
            *top = state;
        }
    }

    /// Position the current line for a mapping key.
    fn key_slot(&mut self) {
        if let Ok(State::BlockMap { indent, .. }) = self.top() {
            if self.cur.is_empty() {
                self.flush_pending(indent);
                self.cur = " ".repeat(indent);
            }
            self.set_top(State::BlockMap {
                indent,
                at_value: true,
            });
        }
    }

    /// Position the current line for an inline node in a block or root slot.
    fn value_slot(&mut self) {
        match self.top() {
            Ok(State::Doc) => {
                if !self.pending.is_empty() {
                    if !self.cur.is_empty() {
                        self.end_line();
                    }
                    self.flush_pending(0);
                } else if !self.cur.is_empty() {
                    self.cur.push(' ');
                }
            }
            Ok(State::BlockMap { indent, .. }) => {
                let step = self.opts.indent;
                if self.pending.is_empty() {
                    self.cur.push(' ');
                } else {
                    self.end_line();
                    self.flush_pending(indent + step);
                    self.cur = " ".repeat(indent + step);
                }
                self.set_top(State::BlockMap {
                    indent,
                    at_value: false,
                });
            }
            Ok(State::BlockSeq { indent }) => self.begin_seq_item(indent),
            _ => {}
        }
    }

    /// Position for a block scalar: like `value_slot`, but queued comments
    /// stay queued so they can ride on the header line.
    fn block_scalar_slot(&mut self) -> Result<(), EmitError> {
        match self.top()? {
            State::Doc => {}
            State::BlockMap {
                indent,
                at_value: true,
            } => {
                self.set_top(State::BlockMap {
                    indent,
                    at_value: false,
                });
            }
            State::BlockMap { .. } => {
                return Err(EmitError::new("block scalar cannot be a mapping key"));
            }
            State::BlockSeq { indent } => {
                // Pending comments go above the dash, not on the header.
                self.begin_seq_item(indent);
            }
            State::FlowMap { .. } | State::FlowSeq { .. } => {
                return Err(EmitError::new("block scalar inside a flow collection"));
            }
        }
        Ok(())
    }

    /// Write the item prefix for a block sequence entry.
    fn begin_seq_item(&mut self, indent: usize) {
        if self.cur.is_empty() {
            self.flush_pending(indent);
            self.cur = " ".repeat(indent);
        }
        self.cur.push_str("- ");
    }

    /// An empty block collection can leave its sequence item prefix
    /// dangling; close the line so the next item starts fresh.
    fn close_block_item(&mut self) {
        if self.cur.ends_with("- ") {
            while self.cur.ends_with(' ') {
                self.cur.pop();
            }
            self.end_line();
        }
    }

    /// Write the separator before a flow item; wraps long lines. Flow
    /// mapping keys and values alternate through the same slot.
    fn flow_slot(&mut self) {
        match self.top() {
            Ok(State::FlowMap {
                indent,
                first,
                at_value,
            }) => {
                if at_value {
                    self.cur.push_str(": ");
                    self.set_top(State::FlowMap {
                        indent,
                        first,
                        at_value: false,
                    });
                } else {
                    if !first {
                        self.flow_separator(indent);
                    }
                    self.set_top(State::FlowMap {
                        indent,
                        first: false,
                        at_value: true,
                    });
                }
            }
            Ok(State::FlowSeq { indent, first }) => {
                if !first {
                    self.flow_separator(indent);
                }
                self.set_top(State::FlowSeq {
                    indent,
                    first: false,
                });
            }
            _ => {}
        }
    }

    fn flow_separator(&mut self, indent: usize) {
        self.cur.push(',');
        if self.cur.len() + 1 > self.opts.max_width {
            self.end_line();
            self.cur = " ".repeat(indent + self.opts.indent);
        } else {
            self.cur.push(' ');
        }
    }

    fn collection_start(
        &mut self,
        anchor: &str,
        tag: &str,
        flow: bool,
        mapping: bool,
    ) -> Result<(), EmitError> {
        let top = self.top()?;
        let props = render_props(anchor, tag, RawScalarStyle::Plain, tag.is_empty(), false);
        if flow || matches!(top, State::FlowMap { .. } | State::FlowSeq { .. }) {
            match top {
                State::FlowMap { .. } | State::FlowSeq { .. } => self.flow_slot(),
                _ => self.value_slot(),
            }
            if !props.is_empty() {
                self.cur.push_str(&props);
                self.cur.push(' ');
            }
            let indent = line_indent(&self.cur);
            if mapping {
                self.cur.push('{');
                self.states.push(State::FlowMap {
                    indent,
                    first: true,
                    at_value: false,
                });
            } else {
                self.cur.push('[');
                self.states.push(State::FlowSeq {
                    indent,
                    first: true,
                });
            }
            return Ok(());
        }
        match top {
            State::Doc => {
                if !props.is_empty() {
                    if !self.cur.is_empty() {
                        self.cur.push(' ');
                    }
                    self.cur.push_str(&props);
                }
                if !self.cur.is_empty() {
                    self.end_line();
                }
                if mapping {
                    self.states.push(State::BlockMap {
                        indent: 0,
                        at_value: false,
                    });
                } else {
                    self.states.push(State::BlockSeq { indent: 0 });
                }
                Ok(())
            }
            State::BlockMap {
                indent,
                at_value: true,
            } => {
                self.set_top(State::BlockMap {
                    indent,
                    at_value: false,
                });
                if !props.is_empty() {
                    self.cur.push(' ');
                    self.cur.push_str(&props);
                }
                self.end_line();
                if mapping {
                    self.states.push(State::BlockMap {
                        indent: indent + self.opts.indent,
                        at_value: false,
                    });
                } else {
                    // Sequences under a mapping key sit at the key's indent.
                    self.states.push(State::BlockSeq { indent });
                }
                Ok(())
            }
            State::BlockMap { .. } => {
                Err(EmitError::new("collection keys are not supported"))
            }
            State::BlockSeq { indent } => {
                self.begin_seq_item(indent);
                if !props.is_empty() {
                    self.cur.push_str(&props);
                    self.end_line();
                }
                let item_indent = self.cur.len();
                if mapping {
                    self.states.push(State::BlockMap {
                        indent: item_indent,
                        at_value: false,
                    });
                } else {
                    self.states.push(State::BlockSeq {
                        indent: item_indent,
                    });
                }
                Ok(())
            }
            State::FlowMap { .. } | State::FlowSeq { .. } => unreachable!(),
        }
    }

    /// After a flow collection closes, finish the block line it sat on.
    fn close_flow(&mut self) {
        if !matches!(
            self.states.last(),
            Some(State::FlowMap { .. }) | Some(State::FlowSeq { .. })
        ) {
            self.end_line();
        }
    }

    /// An empty plain scalar renders as nothing: close the slot's line.
    fn empty_scalar(&mut self) -> Result<(), EmitError> {
        match self.top()? {
            State::Doc => {
                // An empty document body materializes as an explicit null
                // so the output decodes back to the same value.
                self.value_slot();
                self.cur.push_str("null");
                self.end_line();
            }
            State::BlockMap {
                indent,
                at_value: true,
            } => {
                self.set_top(State::BlockMap {
                    indent,
                    at_value: false,
                });
                self.end_line();
                self.flush_pending(indent + self.opts.indent);
            }
            State::BlockMap { .. } => {
                // An empty key still needs its colon.
                self.key_slot();
                self.cur.push(':');
            }
            State::BlockSeq { indent } => {
                self.begin_seq_item(indent);
                self.close_block_item();
            }
            State::FlowMap {
                indent,
                first,
                at_value: true,
            } => {
                // A missing flow value renders as a bare key.
                self.set_top(State::FlowMap {
                    indent,
                    first,
                    at_value: false,
                });
            }
            State::FlowMap { .. } | State::FlowSeq { .. } => {
                self.flow_slot();
            }
        }
        Ok(())
    }

    // ─── scalar rendering ────────────────────────────────────────────────

    /// Resolve `Any` and escalate styles the context cannot express.
    fn effective_style(
        &self,
        style: RawScalarStyle,
        value: &str,
        top: State,
    ) -> RawScalarStyle {
        let in_flow = matches!(top, State::FlowMap { .. } | State::FlowSeq { .. });
        let is_key = matches!(top, State::BlockMap { at_value: false, .. });
        let mut style = match style {
            RawScalarStyle::Any => {
                if value.contains('\n') {
                    RawScalarStyle::Literal
                } else if plain_safe(value) || value.is_empty() {
                    RawScalarStyle::Plain
                } else {
                    RawScalarStyle::SingleQuoted
                }
            }
            // Folded output is not reproduced; emit the text literally.
            RawScalarStyle::Folded => RawScalarStyle::Literal,
            other => other,
        };
        if style == RawScalarStyle::Plain && !value.is_empty() && !plain_safe(value) {
            style = RawScalarStyle::SingleQuoted;
        }
        if style == RawScalarStyle::SingleQuoted && !single_quotable(value) {
            style = RawScalarStyle::DoubleQuoted;
        }
        if (in_flow || is_key) && style == RawScalarStyle::Literal {
            style = RawScalarStyle::DoubleQuoted;
        }
        style
    }

    fn emit_block_scalar(&mut self, props: &str, value: &str) {
        let base = line_indent(&self.cur);
        let content_indent = base + self.opts.indent;
        if !self.cur.is_empty() {
            self.cur.push(' ');
        }
        if !props.is_empty() {
            self.cur.push_str(props);
            self.cur.push(' ');
        }
        let body = value.trim_end_matches('\n');
        let trailing = value.len() - body.len();
        self.cur.push('|');
        if body.lines().next().is_some_and(|l| l.starts_with(' ')) {
            // First line starts with a space: the indent must be explicit.
            self.cur.push_str(&self.opts.indent.to_string());
        }
        match trailing {
            0 => self.cur.push('-'),
            1 => {}
            _ => self.cur.push('+'),
        }
        if !self.pending.is_empty() {
            // A queued comment rides inline on the header line.
            let joined = take(&mut self.pending).join(" ");
            append_comment(&mut self.cur_comment, &joined);
        }
        self.end_line();
        if !body.is_empty() {
            for line in body.split('\n') {
                if !line.is_empty() {
                    self.cur = " ".repeat(content_indent);
                    self.cur.push_str(line);
                }
                self.end_line();
            }
        }
        for _ in 1..trailing {
            self.end_line();
        }
    }

    // ─── line buffer ─────────────────────────────────────────────────────

    fn end_line(&mut self) {
        self.lines.push(Line {
            text: take(&mut self.cur),
            comment: self.cur_comment.take(),
        });
    }

    fn flush_pending(&mut self, indent: usize) {
        for text in take(&mut self.pending) {
            self.cur = " ".repeat(indent);
            self.cur.push_str(&render_comment(&text));
            self.end_line();
        }
    }

    fn render(&self) -> Vec<u8> {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&line.text);
            if let Some(comment) = &line.comment {
                let column = match self.opts.comment_column {
                    CommentAlignment::Column(n) => n.max(line.text.len() + 1),
                    CommentAlignment::Auto => self.auto_column(i).max(line.text.len() + 1),
                };
                for _ in line.text.len()..column {
                    out.push(' ');
                }
                out.push_str(&render_comment(comment));
            }
            out.push('\n');
        }
        out.into_bytes()
    }

    /// Widest content line of the contiguous run of commented lines
    /// containing line `i`, plus one space.
    fn auto_column(&self, i: usize) -> usize {
        let mut lo = i;
        while lo > 0 && self.lines[lo - 1].comment.is_some() {
            lo -= 1;
        }
        let mut hi = i;
        while hi + 1 < self.lines.len() && self.lines[hi + 1].comment.is_some() {
            hi += 1;
        }
        let widest = self.lines[lo..=hi]
            .iter()
            .map(|l| l.text.len())
            .max()
            .unwrap_or(0);
        widest + 1
    }
}

fn line_indent(line: &str) -> usize {
    line.chars().take_while(|&c| c == ' ').count()
}

fn append_comment(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

fn render_comment(text: &str) -> String {
    if text.is_empty() {
        "#".to_string()
    } else {
        format!("# {text}")
    }
}

/// `&anchor !tag` prefix, or empty. The tag is omitted when the implicit
/// flag matching the style says the receiver can infer it.
fn render_props(
    anchor: &str,
    tag: &str,
    style: RawScalarStyle,
    plain_implicit: bool,
    quoted_implicit: bool,
) -> String {
    let mut props = String::new();
    if !anchor.is_empty() {
        props.push('&');
        props.push_str(anchor);
    }
    let tag_implied = match style {
        RawScalarStyle::Plain | RawScalarStyle::Any => plain_implicit,
        _ => quoted_implicit,
    };
    if !tag.is_empty() && !tag_implied {
        if !props.is_empty() {
            props.push(' ');
        }
        props.push_str(&render_tag(tag));
    }
    props
}

fn render_tag(tag: &str) -> String {
    if tag == "!" {
        "!".to_string()
    } else if let Some(suffix) = tag.strip_prefix(DEFAULT_TAG_PREFIX) {
        format!("!!{suffix}")
    } else if tag.starts_with('!') {
        tag.to_string()
    } else {
        format!("!<{tag}>")
    }
}

fn join_props(props: &str, body: &str) -> String {
    match (props.is_empty(), body.is_empty()) {
        (true, _) => body.to_string(),
        (false, true) => props.to_string(),
        (false, false) => format!("{props} {body}"),
    }
}

fn render_inline_scalar(value: &str, style: RawScalarStyle) -> String {
    match style {
        RawScalarStyle::Plain | RawScalarStyle::Any => value.to_string(),
        RawScalarStyle::SingleQuoted => format!("'{}'", value.replace('\'', "''")),
        RawScalarStyle::DoubleQuoted => render_double_quoted(value),
        // Block styles are rendered by emit_block_scalar.
        RawScalarStyle::Literal | RawScalarStyle::Folded => value.to_string(),
    }
}

fn render_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// True when `text` can be written unquoted without changing its shape.
pub(crate) fn plain_safe(text: &str) -> bool {
    if text.is_empty() || text.starts_with(' ') || text.ends_with(' ') {
        return false;
    }
    if text == "---" || text == "..." || text == "-" {
        return false;
    }
    if text.starts_with("- ") || text.starts_with("? ") || text.starts_with(": ") {
        return false;
    }
    let first = text.chars().next().unwrap_or(' ');
    if "#&*!|>'\"%@`,[]{}".contains(first) {
        return false;
    }
    if text.ends_with(':') || text.contains(": ") || text.contains(" #") {
        return false;
    }
    !text.contains(['\n', '\r', '\t'])
}

fn single_quotable(text: &str) -> bool {
    !text.contains(['\n', '\r']) && text.chars().all(|c| c >= ' ' || c == '\t')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::raw::{RawCollectionStyle, RawEventKind};

    /// Parse and replay through a fresh emitter. Comments are replayed as
    /// own-line requests; the emitter decides their final placement.
    fn roundtrip_with(input: &str, options: EmitterOptions) -> String {
        let mut parser = Parser::new(input).expect("parse failed");
        let mut emitter = Emitter::new(options);
        emitter.stream_start();
        while let Some(event) = parser.next() {
            use RawEventKind::*;
            match event.kind {
                StreamEnd => break,
                DocumentStart => emitter
                    .document_start(event.version, &event.tag_directives, event.implicit)
                    .unwrap(),
                DocumentEnd => emitter.document_end(event.implicit).unwrap(),
                Scalar => emitter
                    .scalar(
                        &event.anchor,
                        &event.tag,
                        &event.value,
                        event.scalar_style,
                        event.implicit,
                        event.quoted_implicit,
                    )
                    .unwrap(),
                Alias => emitter.alias(&event.anchor).unwrap(),
                SequenceStart => emitter
                    .sequence_start(
                        &event.anchor,
                        &event.tag,
                        event.collection_style == RawCollectionStyle::Flow,
                    )
                    .unwrap(),
                SequenceEnd => emitter.sequence_end().unwrap(),
                MappingStart => emitter
                    .mapping_start(
                        &event.anchor,
                        &event.tag,
                        event.collection_style == RawCollectionStyle::Flow,
                    )
                    .unwrap(),
                MappingEnd => emitter.mapping_end().unwrap(),
                Comment => emitter.comment(&event.value, true),
            }
        }
        String::from_utf8(emitter.stream_end()).unwrap()
    }

    fn roundtrip(input: &str) -> String {
        roundtrip_with(input, EmitterOptions::default())
    }

    #[track_caller]
    fn assert_identity(input: &str) {
        assert_eq!(roundtrip(input), input);
    }

    #[test]
    fn leading_comment_identity() {
        assert_identity("# leading\nkey: value\n");
        assert_identity("# one\n# two\nkey: value\n");
    }

    #[test]
    fn comment_between_key_and_value_identity() {
        assert_identity("key:\n  # comment\n  value\n");
        assert_identity("key:\n  # one\n  # two\n  value\n");
    }

    #[test]
    fn inline_comment_form_normalizes() {
        assert_eq!(
            roundtrip("key: # comment\n  value\n"),
            "key:\n  # comment\n  value\n"
        );
    }

    #[test]
    fn block_scalar_header_comment_identity() {
        assert_identity("key: | # comment\n  line one\n  line two\n");
    }

    #[test]
    fn comment_before_submap_identity() {
        assert_identity("key:\n  # comment\n  sub: value\n");
    }

    #[test]
    fn bare_sequence_comment_identity() {
        assert_identity("# start\n- a\n# middle\n- b\n");
    }

    #[test]
    fn zero_indented_sequence_identity() {
        assert_identity("key:\n# comment\n- a\n- b\n");
        assert_identity("key:\n- a\n- b\n");
    }

    #[test]
    fn comment_hoisted_above_dash() {
        assert_eq!(
            roundtrip("- name: a\n  # note\n- name: b\n"),
            "- name: a\n# note\n- name: b\n"
        );
        assert_identity("- name: a\n# note\n- name: b\n");
    }

    #[test]
    fn explicit_empty_document_materializes_null() {
        assert_eq!(roundtrip("---\n# empty\n...\n"), "---\n# empty\nnull\n...\n");
    }

    #[test]
    fn comment_only_document_materializes_null() {
        assert_eq!(roundtrip("# just a comment\n"), "# just a comment\nnull\n");
    }

    #[test]
    fn empty_collections_close_their_sequence_items() {
        let mut emitter = Emitter::new(EmitterOptions::default());
        emitter.stream_start();
        emitter.document_start(None, &[], true).unwrap();
        emitter.sequence_start("", "", false).unwrap();
        emitter.sequence_start("", "", false).unwrap();
        emitter.sequence_end().unwrap();
        emitter.mapping_start("", "", false).unwrap();
        emitter.mapping_end().unwrap();
        emitter.sequence_end().unwrap();
        emitter.document_end(true).unwrap();
        let out = String::from_utf8(emitter.stream_end()).unwrap();
        assert_eq!(out, "-\n-\n");
    }

    #[test]
    fn comment_before_root_scalar_identity() {
        assert_identity("# intro\nvalue\n");
    }

    #[test]
    fn root_scalar_on_marker_line() {
        assert_identity("--- foo\n");
    }

    #[test]
    fn same_line_comment_moves_to_own_line() {
        assert_eq!(roundtrip("key: value # note\n"), "key: value\n# note\n");
    }

    fn commented_pairs(options: EmitterOptions, pairs: &[(&str, &str, &str)]) -> String {
        let mut emitter = Emitter::new(options);
        emitter.stream_start();
        emitter.document_start(None, &[], true).unwrap();
        emitter.mapping_start("", "", false).unwrap();
        for (key, value, note) in pairs {
            emitter.scalar("", "", key, RawScalarStyle::Plain, true, false).unwrap();
            emitter.scalar("", "", value, RawScalarStyle::Plain, true, false).unwrap();
            emitter.comment(note, false);
        }
        emitter.mapping_end().unwrap();
        emitter.document_end(true).unwrap();
        String::from_utf8(emitter.stream_end()).unwrap()
    }

    #[test]
    fn trailing_comment_default_sits_one_space_after_content() {
        let out = commented_pairs(EmitterOptions::default(), &[("key", "value", "note")]);
        assert_eq!(out, "key: value # note\n");
    }

    #[test]
    fn trailing_comment_alignment_fixed_column() {
        let opts = EmitterOptions {
            comment_column: CommentAlignment::Column(12),
            ..Default::default()
        };
        let out = commented_pairs(opts, &[("a", "1", "one"), ("bb", "2", "two")]);
        assert_eq!(out, "a: 1        # one\nbb: 2       # two\n");
    }

    #[test]
    fn trailing_comment_alignment_auto() {
        let opts = EmitterOptions {
            comment_column: CommentAlignment::Auto,
            ..Default::default()
        };
        let out = commented_pairs(opts, &[("a", "1", "one"), ("longer", "2", "two")]);
        insta::assert_snapshot!(out, @r"
        a: 1      # one
        longer: 2 # two
        ");
    }

    #[test]
    fn nested_structures_identity() {
        assert_identity("outer:\n  inner: x\n  other: y\n");
        assert_identity("- key: value\n- key: value\n");
        assert_identity("key: {a: 1, b: [x, y]}\n");
    }

    #[test]
    fn block_scalar_chomping_identity() {
        assert_identity("a: |-\n  x\n");
        assert_identity("a: |+\n  y\n\n");
        assert_identity("a: |\n  kept\n");
    }

    #[test]
    fn anchors_and_tags_identity() {
        assert_identity("a: &node !!str hello\nb: *node\n");
        assert_identity("a: !local thing\n");
    }

    #[test]
    fn multi_document_identity() {
        assert_identity("a: 1\n---\nb: 2\n");
        assert_identity("a: 1\n...\nb: 2\n");
    }

    #[test]
    fn quoted_scalars_identity() {
        assert_identity("a: 'it''s'\n");
        assert_identity("b: \"x\\ny\"\n");
    }

    #[test]
    fn null_value_identity() {
        assert_identity("key:\n");
        assert_identity("-\n");
    }

    #[test]
    fn directives_identity() {
        assert_identity("%YAML 1.1\n---\nkey: value\n");
    }

    #[test]
    fn unbalanced_end_is_an_error() {
        let mut emitter = Emitter::new(EmitterOptions::default());
        emitter.stream_start();
        emitter.document_start(None, &[], true).unwrap();
        assert!(emitter.mapping_end().is_err());
    }

    #[test]
    fn scalar_outside_document_is_an_error() {
        let mut emitter = Emitter::new(EmitterOptions::default());
        emitter.stream_start();
        let result = emitter.scalar("", "", "x", RawScalarStyle::Plain, true, false);
        assert!(result.is_err());
    }

    #[test]
    fn unsafe_plain_scalar_is_quoted() {
        let mut emitter = Emitter::new(EmitterOptions::default());
        emitter.stream_start();
        emitter.document_start(None, &[], true).unwrap();
        emitter
            .scalar("", "", "has: colon", RawScalarStyle::Plain, true, false)
            .unwrap();
        emitter.document_end(true).unwrap();
        let out = String::from_utf8(emitter.stream_end()).unwrap();
        assert_eq!(out, "'has: colon'\n");
    }
}
