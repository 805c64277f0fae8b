//! Pull decoder over a text buffer.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tarn_engine::{Mark, Parser, RawCollectionStyle, RawEvent, RawEventKind};

use crate::error::{Error, Result};
use crate::event::{from_engine_style, Event, EventKind, TagInfo, VersionInfo};
use crate::resolve::{self, TAG_BINARY, TAG_STR};
use crate::value::Value;

/// Decodes a buffer into typed events, one per [`next_event`] call.
///
/// The whole buffer is parsed up front; decoding cannot fail after
/// construction except for scalar-level errors (bad base64). The engine
/// parser is released when `Finish` is returned, and any call after that
/// is rejected.
///
/// [`next_event`]: StreamDecoder::next_event
pub struct StreamDecoder {
    parser: Option<Parser>,
}

impl StreamDecoder {
    pub fn new(input: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(input).map_err(|_| Error::InvalidUtf8)?;
        let parser = Parser::new(text)?;
        Ok(Self {
            parser: Some(parser),
        })
    }

    /// The next typed event. Ends with `Finish`; calling again after that
    /// returns [`Error::DecoderFinished`].
    pub fn next_event(&mut self) -> Result<Event> {
        let Some(parser) = self.parser.as_mut() else {
            return Err(Error::DecoderFinished);
        };
        let Some(raw) = parser.next() else {
            self.parser = None;
            return Ok(Event::of(EventKind::Finish, Mark::default()));
        };
        let position = raw.mark;
        match raw.kind {
            RawEventKind::StreamEnd => {
                self.parser = None;
                tracing::debug!(line = position.line, "decode finished");
                Ok(Event::of(EventKind::Finish, position))
            }
            RawEventKind::DocumentStart => {
                let mut event = Event::of(EventKind::DocumentStart, position);
                event.implicit = raw.implicit;
                event.yaml_version = raw.version.map(VersionInfo::from_raw);
                event.tag_definitions =
                    raw.tag_directives.iter().map(TagInfo::from_raw).collect();
                Ok(event)
            }
            RawEventKind::DocumentEnd => {
                let mut event = Event::of(EventKind::DocumentEnd, position);
                event.implicit = raw.implicit;
                Ok(event)
            }
            RawEventKind::Alias => {
                let mut event = Event::of(EventKind::Alias, position);
                event.anchor = raw.anchor;
                Ok(event)
            }
            RawEventKind::Scalar => decode_scalar(raw),
            RawEventKind::SequenceStart => {
                Ok(collection_start(EventKind::SequenceStart, raw))
            }
            RawEventKind::SequenceEnd => Ok(Event::of(EventKind::SequenceEnd, position)),
            RawEventKind::MappingStart => {
                Ok(collection_start(EventKind::MappingStart, raw))
            }
            RawEventKind::MappingEnd => Ok(Event::of(EventKind::MappingEnd, position)),
            RawEventKind::Comment => {
                let mut event = Event::of(EventKind::Comment, position);
                event.text = raw.value;
                Ok(event)
            }
        }
    }
}

fn collection_start(kind: EventKind, raw: RawEvent) -> Event {
    let mut event = Event::of(kind, raw.mark);
    event.anchor = raw.anchor;
    event.tag = raw.tag;
    event.flow = raw.collection_style == RawCollectionStyle::Flow;
    event.implicit = raw.implicit;
    event
}

fn decode_scalar(raw: RawEvent) -> Result<Event> {
    let mut event = Event::of(EventKind::Scalar, raw.mark);
    event.style = from_engine_style(raw.scalar_style);
    event.implicit = raw.implicit;
    event.quoted_implicit = raw.quoted_implicit;

    let (tag, value) = if raw.tag.is_empty() && !raw.implicit {
        // Quoted or block scalar without a tag: the text is a string
        // verbatim, never implicitly typed.
        (TAG_STR.to_string(), Value::Str(raw.value.clone()))
    } else {
        let (tag, value) = resolve::resolve(&raw.tag, &raw.value);
        if tag == TAG_BINARY {
            let compact: String = raw.value.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = BASE64.decode(compact).map_err(|_| Error::InvalidBase64)?;
            (tag, Value::Bytes(bytes))
        } else {
            (tag, value)
        }
    };
    event.tag = tag;
    event.value = value;
    event.anchor = raw.anchor;
    event.text = raw.value;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &str) -> Vec<Event> {
        let mut decoder = StreamDecoder::new(input.as_bytes()).unwrap();
        let mut events = Vec::new();
        loop {
            let event = decoder.next_event().unwrap();
            let done = event.kind == EventKind::Finish;
            events.push(event);
            if done {
                return events;
            }
        }
    }

    fn scalars(events: &[Event]) -> Vec<&Event> {
        events
            .iter()
            .filter(|e| e.kind == EventKind::Scalar)
            .collect()
    }

    #[test]
    fn plain_scalars_resolve() {
        let events = decode_all("a: 123\nb: yes\nc: ~\nd: text\n");
        let values: Vec<_> = scalars(&events).iter().map(|e| e.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                Value::Str("a".into()),
                Value::Int(123),
                Value::Str("b".into()),
                Value::Bool(true),
                Value::Str("c".into()),
                Value::Null,
                Value::Str("d".into()),
                Value::Str("text".into()),
            ]
        );
    }

    #[test]
    fn quoted_scalars_stay_strings() {
        let events = decode_all("a: '123'\nb: \"yes\"\n");
        let s = scalars(&events);
        assert_eq!(s[1].value, Value::Str("123".into()));
        assert_eq!(s[1].tag, TAG_STR);
        assert_eq!(s[3].value, Value::Str("yes".into()));
    }

    #[test]
    fn block_scalars_stay_strings() {
        let events = decode_all("a: |\n  123\n");
        let s = scalars(&events);
        assert_eq!(s[1].value, Value::Str("123\n".into()));
        assert_eq!(s[1].tag, TAG_STR);
        assert_eq!(s[1].style, crate::ScalarStyle::LiteralBlock);
    }

    #[test]
    fn binary_decodes_base64() {
        let events = decode_all("data: !!binary aGVsbG8=\n");
        let s = scalars(&events);
        assert_eq!(s[1].value, Value::Bytes(b"hello".to_vec()));
        assert_eq!(s[1].text, "aGVsbG8=");
    }

    #[test]
    fn bad_base64_is_fatal() {
        let mut decoder = StreamDecoder::new(b"data: !!binary '***'\n").unwrap();
        let result = loop {
            match decoder.next_event() {
                Ok(event) if event.kind == EventKind::Finish => break Ok(()),
                Ok(_) => continue,
                Err(e) => break Err(e),
            }
        };
        assert_eq!(result, Err(Error::InvalidBase64));
    }

    #[test]
    fn comments_are_events() {
        let events = decode_all("# heads up\nkey: value\n");
        assert_eq!(events[1].kind, EventKind::Comment);
        assert_eq!(events[1].text, "heads up");
    }

    #[test]
    fn flow_flag_reflects_notation() {
        let events = decode_all("a: [1, 2]\nb:\n- 1\n");
        let starts: Vec<_> = events
            .iter()
            .filter(|e| e.kind == EventKind::SequenceStart)
            .collect();
        assert!(starts[0].flow);
        assert!(!starts[1].flow);
    }

    #[test]
    fn document_directives_pass_through() {
        let events = decode_all("%YAML 1.1\n%TAG !e! tag:example.com,2024:\n---\nok\n");
        let start = &events[0];
        assert_eq!(start.yaml_version, Some(VersionInfo { major: 1, minor: 1 }));
        assert_eq!(start.tag_definitions.len(), 1);
        assert!(!start.implicit);
    }

    #[test]
    fn positions_track_line_and_column() {
        let events = decode_all("a: 1\nkey: value\n");
        let s = scalars(&events);
        assert_eq!((s[0].position.line, s[0].position.column), (1, 1));
        assert_eq!((s[1].position.line, s[1].position.column), (1, 4));
        assert_eq!((s[2].position.line, s[2].position.column), (2, 1));
        assert_eq!((s[3].position.line, s[3].position.column), (2, 6));
    }

    #[test]
    fn use_after_finish_is_rejected() {
        let mut decoder = StreamDecoder::new(b"key: value\n").unwrap();
        loop {
            if decoder.next_event().unwrap().kind == EventKind::Finish {
                break;
            }
        }
        assert_eq!(decoder.next_event(), Err(Error::DecoderFinished));
    }
}
