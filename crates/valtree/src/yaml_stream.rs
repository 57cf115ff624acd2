//! YAML documents streamed into a visitor.
//!
//! The YAML scanner needs the whole document, so chunks are collected and
//! the parser events are replayed into the visitor when the input ends.
//! Scalars are passed on as strings; plain `~`, `null` and empty scalars
//! become nil.

use crate::stream::{StreamInput, StreamParser};
use crate::values::Values;
use crate::visitor::ValueTreeVisitor;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

enum Frame {
    Mapping { key: Option<String> },
    Sequence,
}

/// Translates parser events into visitor calls.
struct EventReplay<'v, V> {
    visitor: &'v mut V,
    frames: Vec<Frame>,
    stopped: bool,
    unsupported: Option<Marker>,
}

impl<V: ValueTreeVisitor> EventReplay<'_, V> {
    fn in_key_position(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Mapping { key: None }))
    }

    fn value_done(&mut self) {
        if let Some(Frame::Mapping { key }) = self.frames.last_mut()
            && let Some(name) = key.take()
        {
            self.visitor.finish_attribute(&name);
        }
    }

    fn reject_complex_key(&mut self, marker: Marker) -> bool {
        if self.in_key_position() {
            self.unsupported.get_or_insert(marker);
            true
        } else {
            false
        }
    }
}

fn is_null(value: &str, style: TScalarStyle) -> bool {
    style == TScalarStyle::Plain && matches!(value, "" | "~" | "null" | "Null" | "NULL")
}

impl<V: ValueTreeVisitor> MarkedEventReceiver for EventReplay<'_, V> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.stopped || self.unsupported.is_some() {
            return;
        }
        if !self.visitor.should_continue() {
            tracing::debug!(line = marker.line(), "visitor stopped the YAML stream");
            self.stopped = true;
            return;
        }
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, _anchor_id, _tag) => {
                if self.in_key_position() {
                    self.visitor.begin_attribute(&value);
                    if let Some(Frame::Mapping { key }) = self.frames.last_mut() {
                        *key = Some(value);
                    }
                    return;
                }
                if is_null(&value, style) {
                    self.visitor.consume(Values::Nil(1));
                } else {
                    self.visitor.consume(Values::Str(&[value.as_str()]));
                }
                self.value_done();
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                if self.reject_complex_key(marker) {
                    return;
                }
                self.visitor.begin_list();
                self.frames.push(Frame::Sequence);
            }

            Event::SequenceEnd => {
                self.frames.pop();
                self.visitor.finish_list();
                self.value_done();
            }

            Event::MappingStart(_anchor_id, _tag) => {
                if self.reject_complex_key(marker) {
                    return;
                }
                self.visitor.begin_struct();
                self.frames.push(Frame::Mapping { key: None });
            }

            Event::MappingEnd => {
                self.frames.pop();
                self.visitor.finish_struct();
                self.value_done();
            }

            Event::Alias(_anchor_id) => {
                // Anchors are not tracked while replaying.
                tracing::debug!(line = marker.line(), "YAML alias replayed as null");
                if self.in_key_position() {
                    self.unsupported.get_or_insert(marker);
                    return;
                }
                self.visitor.consume(Values::Nil(1));
                self.value_done();
            }
        }
    }
}

/// The buffering parser behind [`traverse_yaml_stream`].
pub struct YamlStreamParser<V> {
    visitor: V,
    pending: Vec<u8>,
}

impl<V: ValueTreeVisitor> YamlStreamParser<V> {
    pub fn new(visitor: V) -> Self {
        YamlStreamParser {
            visitor,
            pending: Vec::new(),
        }
    }

    fn replay(&mut self) -> bool {
        let text = match std::str::from_utf8(&self.pending) {
            Ok(text) => text,
            Err(error) => {
                tracing::error!(%error, "YAML stream is not valid UTF-8");
                return false;
            }
        };
        let mut replay = EventReplay {
            visitor: &mut self.visitor,
            frames: Vec::new(),
            stopped: false,
            unsupported: None,
        };
        let mut parser = Parser::new_from_str(text);
        if let Err(error) = parser.load(&mut replay, false) {
            tracing::error!(%error, "YAML stream parse failed");
            return false;
        }
        if let Some(marker) = replay.unsupported {
            tracing::error!(
                line = marker.line(),
                col = marker.col(),
                "complex mapping keys are not supported"
            );
            return false;
        }
        true
    }
}

impl<V: ValueTreeVisitor> StreamParser for YamlStreamParser<V> {
    fn begin(&mut self) {
        self.visitor.begin();
    }

    fn parse_data(&mut self, data: &[u8]) -> bool {
        self.pending.extend_from_slice(data);
        true
    }

    fn finish(&mut self) -> bool {
        if self.replay() {
            self.visitor.flush();
            self.visitor.finish()
        } else {
            self.visitor.failed();
            false
        }
    }
}

/// Stream YAML chunks into `visitor`; events are delivered at finish.
pub fn traverse_yaml_stream<'a, V>(visitor: V) -> StreamInput<'a>
where
    V: ValueTreeVisitor + 'a,
{
    StreamInput::new(YamlStreamParser::new(visitor))
}
