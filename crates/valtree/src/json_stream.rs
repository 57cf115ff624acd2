//! Incremental JSON parsing into a visitor.
//!
//! Chunks are appended to a pending buffer and scanned token by token.
//! A token that runs past the end of the buffer is left in place until the
//! next chunk arrives, so chunk boundaries may fall anywhere, including
//! inside escape sequences and multi-byte characters. Numbers are only
//! complete once a delimiter follows them or the input ends.
//!
//! The grammar accepts a trailing comma before `]` and `}`.

use crate::builder::{ObjectBuilder, make_building_visitor};
use crate::error::StreamError;
use crate::stream::{StreamInput, StreamParser};
use crate::values::Values;
use crate::visitor::ValueTreeVisitor;

#[derive(Debug, Clone, PartialEq)]
enum Number {
    UInt(u64),
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Colon,
    Comma,
    Str(String),
    Number(Number),
    True,
    False,
    Null,
}

impl Token {
    fn describe(&self) -> &'static str {
        match self {
            Token::BeginObject => "'{'",
            Token::EndObject => "'}'",
            Token::BeginArray => "'['",
            Token::EndArray => "']'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Str(_) => "string",
            Token::Number(_) => "number",
            Token::True | Token::False => "boolean",
            Token::Null => "null",
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(
            self,
            Token::Str(_) | Token::Number(_) | Token::True | Token::False | Token::Null
        )
    }
}

enum Scan {
    Token(Token, usize),
    NeedMore,
    Error(StreamError),
}

fn incomplete(at_eof: bool) -> Scan {
    if at_eof {
        Scan::Error(StreamError::UnexpectedEof)
    } else {
        Scan::NeedMore
    }
}

fn whitespace_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|byte| matches!(byte, b' ' | b'\t' | b'\n' | b'\r'))
        .count()
}

/// Scan one token at the start of `bytes`. `base` is the absolute offset
/// of `bytes[0]`, used for error positions.
fn scan(bytes: &[u8], base: usize, at_eof: bool) -> Scan {
    let Some(&first) = bytes.first() else {
        return incomplete(at_eof);
    };
    let single = |token| Scan::Token(token, 1);
    match first {
        b'{' => single(Token::BeginObject),
        b'}' => single(Token::EndObject),
        b'[' => single(Token::BeginArray),
        b']' => single(Token::EndArray),
        b':' => single(Token::Colon),
        b',' => single(Token::Comma),
        b'"' => scan_string(bytes, base, at_eof),
        b'-' | b'0'..=b'9' => scan_number(bytes, base, at_eof),
        b't' => scan_literal(bytes, b"true", Token::True, base, at_eof),
        b'f' => scan_literal(bytes, b"false", Token::False, base, at_eof),
        b'n' => scan_literal(bytes, b"null", Token::Null, base, at_eof),
        other => Scan::Error(StreamError::UnexpectedChar {
            found: char::from(other),
            offset: base,
        }),
    }
}

fn scan_literal(bytes: &[u8], word: &[u8], token: Token, base: usize, at_eof: bool) -> Scan {
    if let Some(index) = bytes.iter().zip(word).position(|(got, want)| got != want) {
        return Scan::Error(StreamError::UnexpectedChar {
            found: char::from(bytes[index]),
            offset: base + index,
        });
    }
    if bytes.len() < word.len() {
        return incomplete(at_eof);
    }
    Scan::Token(token, word.len())
}

fn scan_number(bytes: &[u8], base: usize, at_eof: bool) -> Scan {
    let end = bytes
        .iter()
        .position(|byte| !matches!(byte, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'));
    let len = match end {
        Some(len) => len,
        None if at_eof => bytes.len(),
        None => return Scan::NeedMore,
    };
    let text = String::from_utf8_lossy(&bytes[..len]);
    match parse_number(&text) {
        Some(number) => Scan::Token(Token::Number(number), len),
        None => Scan::Error(StreamError::InvalidNumber {
            text: text.into_owned(),
            offset: base,
        }),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if !text.contains(['.', 'e', 'E']) {
        if text.starts_with('-') {
            if let Ok(value) = text.parse::<i64>() {
                return Some(Number::Int(value));
            }
        } else if let Ok(value) = text.parse::<u64>() {
            return Some(Number::UInt(value));
        }
    }
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Number::Float)
}

enum Hex {
    Value(u32),
    Incomplete,
    Invalid,
}

fn hex4(bytes: &[u8], at: usize) -> Hex {
    let Some(digits) = bytes.get(at..at + 4) else {
        let available = bytes.get(at..).unwrap_or_default();
        return if available.iter().all(u8::is_ascii_hexdigit) {
            Hex::Incomplete
        } else {
            Hex::Invalid
        };
    };
    let mut value = 0;
    for &digit in digits {
        match char::from(digit).to_digit(16) {
            Some(digit) => value = value * 16 + digit,
            None => return Hex::Invalid,
        }
    }
    Hex::Value(value)
}

enum Escape {
    Char(char, usize),
    Incomplete,
    Invalid,
}

/// Decode `\uXXXX` (or a `\uXXXX\uXXXX` surrogate pair) at `bytes[at..]`.
fn unicode_escape(bytes: &[u8], at: usize) -> Escape {
    let high = match hex4(bytes, at + 2) {
        Hex::Value(value) => value,
        Hex::Incomplete => return Escape::Incomplete,
        Hex::Invalid => return Escape::Invalid,
    };
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).map_or(Escape::Invalid, |c| Escape::Char(c, 6));
    }
    match bytes.get(at + 6..at + 8) {
        Some(b"\\u") => {}
        Some(_) => return Escape::Invalid,
        None => {
            let tail = bytes.get(at + 6..).unwrap_or_default();
            return if b"\\u".starts_with(tail) {
                Escape::Incomplete
            } else {
                Escape::Invalid
            };
        }
    }
    let low = match hex4(bytes, at + 8) {
        Hex::Value(value) => value,
        Hex::Incomplete => return Escape::Incomplete,
        Hex::Invalid => return Escape::Invalid,
    };
    if !(0xDC00..0xE000).contains(&low) {
        return Escape::Invalid;
    }
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).map_or(Escape::Invalid, |c| Escape::Char(c, 12))
}

fn scan_string(bytes: &[u8], base: usize, at_eof: bool) -> Scan {
    let mut text = Vec::new();
    let mut index = 1;
    loop {
        let Some(&byte) = bytes.get(index) else {
            return incomplete(at_eof);
        };
        match byte {
            b'"' => {
                return match String::from_utf8(text) {
                    Ok(text) => Scan::Token(Token::Str(text), index + 1),
                    Err(_) => Scan::Error(StreamError::InvalidUtf8 { offset: base }),
                };
            }
            b'\\' => {
                let Some(&escape) = bytes.get(index + 1) else {
                    return incomplete(at_eof);
                };
                let simple = match escape {
                    b'"' => b'"',
                    b'\\' => b'\\',
                    b'/' => b'/',
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'u' => match unicode_escape(bytes, index) {
                        Escape::Char(c, len) => {
                            text.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
                            index += len;
                            continue;
                        }
                        Escape::Incomplete => return incomplete(at_eof),
                        Escape::Invalid => {
                            return Scan::Error(StreamError::InvalidEscape {
                                offset: base + index,
                            });
                        }
                    },
                    _ => {
                        return Scan::Error(StreamError::InvalidEscape {
                            offset: base + index,
                        });
                    }
                };
                text.push(simple);
                index += 2;
            }
            0x00..=0x1f => {
                return Scan::Error(StreamError::UnexpectedChar {
                    found: char::from(byte),
                    offset: base + index,
                });
            }
            _ => {
                text.push(byte);
                index += 1;
            }
        }
    }
}

#[derive(Debug)]
enum Frame {
    Object { key: Option<String> },
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// a value, at the top level or after a key
    Value,
    /// a key or the end of an object
    Key,
    Colon,
    /// a value or the end of an array
    Item,
    /// a comma or the end of the enclosing container
    Next,
    Done,
}

/// The JSON state machine behind [`traverse_json_stream`].
pub struct JsonStreamParser<V> {
    visitor: V,
    pending: Vec<u8>,
    /// absolute offset of `pending[0]`
    consumed: usize,
    frames: Vec<Frame>,
    expect: Expect,
    error: Option<StreamError>,
    stopped: bool,
}

impl<V: ValueTreeVisitor> JsonStreamParser<V> {
    pub fn new(visitor: V, max_token_size: usize) -> Self {
        JsonStreamParser {
            visitor,
            pending: Vec::with_capacity(max_token_size),
            consumed: 0,
            frames: Vec::new(),
            expect: Expect::Value,
            error: None,
            stopped: false,
        }
    }

    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    fn fail(&mut self, error: StreamError) {
        tracing::error!(%error, "JSON stream parse failed");
        self.error = Some(error);
    }

    fn process(&mut self, at_eof: bool) {
        let mut pos = 0;
        while self.error.is_none() {
            pos += whitespace_len(&self.pending[pos..]);
            if pos == self.pending.len() {
                break;
            }
            if self.expect == Expect::Done {
                self.visitor.unparsed_data(&[&self.pending[pos..]]);
                pos = self.pending.len();
                break;
            }
            match scan(&self.pending[pos..], self.consumed + pos, at_eof) {
                Scan::NeedMore => break,
                Scan::Token(token, len) => {
                    let offset = self.consumed + pos;
                    pos += len;
                    self.accept(token, offset);
                }
                Scan::Error(error) => self.fail(error),
            }
        }
        self.pending.drain(..pos);
        self.consumed += pos;
    }

    fn accept(&mut self, token: Token, offset: usize) {
        let in_array = matches!(self.frames.last(), Some(Frame::Array));
        let in_object = matches!(self.frames.last(), Some(Frame::Object { .. }));
        match (self.expect, token) {
            (Expect::Value | Expect::Item, Token::BeginObject) => {
                self.visitor.begin_struct();
                self.frames.push(Frame::Object { key: None });
                self.expect = Expect::Key;
            }
            (Expect::Value | Expect::Item, Token::BeginArray) => {
                self.visitor.begin_list();
                self.frames.push(Frame::Array);
                self.expect = Expect::Item;
            }
            (Expect::Value | Expect::Item, token) if token.is_scalar() => {
                self.consume_scalar(token);
                self.value_done();
            }
            (Expect::Item | Expect::Next, Token::EndArray) if in_array => {
                self.frames.pop();
                self.visitor.finish_list();
                self.value_done();
            }
            (Expect::Key | Expect::Next, Token::EndObject) if in_object => {
                self.frames.pop();
                self.visitor.finish_struct();
                self.value_done();
            }
            (Expect::Key, Token::Str(name)) => {
                self.visitor.begin_attribute(&name);
                if let Some(Frame::Object { key }) = self.frames.last_mut() {
                    *key = Some(name);
                }
                self.expect = Expect::Colon;
            }
            (Expect::Colon, Token::Colon) => self.expect = Expect::Value,
            (Expect::Next, Token::Comma) => {
                self.expect = if in_array { Expect::Item } else { Expect::Key };
            }
            (_, token) => self.fail(StreamError::UnexpectedToken {
                token: token.describe(),
                offset,
            }),
        }
    }

    fn consume_scalar(&mut self, token: Token) {
        match token {
            Token::Str(text) => self.visitor.consume(Values::Str(&[text.as_str()])),
            Token::Number(Number::UInt(value)) => self.visitor.consume(Values::UInt(&[value])),
            Token::Number(Number::Int(value)) => self.visitor.consume(Values::Int(&[value])),
            Token::Number(Number::Float(value)) => self.visitor.consume(Values::Double(&[value])),
            Token::True => self.visitor.consume(Values::Bool(&[true])),
            Token::False => self.visitor.consume(Values::Bool(&[false])),
            Token::Null => self.visitor.consume(Values::Nil(1)),
            _ => {}
        }
    }

    fn value_done(&mut self) {
        match self.frames.last_mut() {
            Some(Frame::Object { key }) => {
                if let Some(name) = key.take() {
                    self.visitor.finish_attribute(&name);
                }
                self.expect = Expect::Next;
            }
            Some(Frame::Array) => self.expect = Expect::Next,
            None => self.expect = Expect::Done,
        }
    }
}

impl<V: ValueTreeVisitor> StreamParser for JsonStreamParser<V> {
    fn begin(&mut self) {
        self.visitor.begin();
    }

    fn parse_data(&mut self, data: &[u8]) -> bool {
        if self.error.is_some() || self.stopped || self.expect == Expect::Done {
            return false;
        }
        self.pending.extend_from_slice(data);
        self.process(false);
        self.visitor.flush();
        if !self.visitor.should_continue() {
            tracing::debug!(offset = self.consumed, "visitor stopped the JSON stream");
            self.stopped = true;
        }
        self.error.is_none() && !self.stopped && self.expect != Expect::Done
    }

    fn finish(&mut self) -> bool {
        if self.error.is_none() && !self.stopped {
            self.process(true);
            if self.error.is_none() && self.expect != Expect::Done {
                self.fail(StreamError::UnexpectedEof);
            }
        }
        if self.error.is_some() {
            self.visitor.failed();
            false
        } else {
            self.visitor.finish()
        }
    }
}

/// Stream JSON chunks into `visitor`.
///
/// `max_token_size` sizes the buffer for tokens split across chunks; longer
/// tokens still parse, the buffer just grows.
pub fn traverse_json_stream<'a, V>(visitor: V, max_token_size: usize) -> StreamInput<'a>
where
    V: ValueTreeVisitor + 'a,
{
    StreamInput::new(JsonStreamParser::new(visitor, max_token_size))
}

/// Stream JSON chunks into `builder`, addressing every value by its path.
pub fn build_from_json_stream<'a, B>(builder: B) -> StreamInput<'a>
where
    B: ObjectBuilder + 'a,
{
    let max_token_size = builder.max_token_size();
    traverse_json_stream(make_building_visitor(builder), max_token_size)
}
