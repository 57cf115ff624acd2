//! Feeding chunked input into incremental parsers.
//!
//! A [`StreamInput`] owns a [`StreamParser`] and guarantees that the parser
//! is finalized exactly once: either through [`StreamInput::finish`], which
//! consumes the handle, or when the handle is dropped.
//!
//! ```rust
//! use valtree::{make_printing_visitor, traverse_json_stream};
//!
//! let mut out = Vec::new();
//! let mut input = traverse_json_stream(make_printing_visitor(&mut out), 64);
//! input.consume_text(r#"{"a": [1, "#);
//! input.consume_text("2]}");
//! assert!(input.finish());
//! ```

/// An incremental parser driven by [`StreamInput`].
pub trait StreamParser {
    fn begin(&mut self) {}

    /// Parse the next chunk. Returns `false` once the parser has reached a
    /// terminal state and wants no further input.
    fn parse_data(&mut self, data: &[u8]) -> bool;

    /// End of input. Returns whether the document was parsed and accepted.
    fn finish(&mut self) -> bool;
}

impl<P: StreamParser + ?Sized> StreamParser for Box<P> {
    fn begin(&mut self) {
        (**self).begin()
    }

    fn parse_data(&mut self, data: &[u8]) -> bool {
        (**self).parse_data(data)
    }

    fn finish(&mut self) -> bool {
        (**self).finish()
    }
}

pub struct StreamInput<'a> {
    parser: Option<Box<dyn StreamParser + 'a>>,
    active: bool,
}

impl<'a> StreamInput<'a> {
    pub fn new<P: StreamParser + 'a>(parser: P) -> Self {
        let mut parser: Box<dyn StreamParser + 'a> = Box::new(parser);
        parser.begin();
        StreamInput {
            parser: Some(parser),
            active: true,
        }
    }

    /// Whether the parser still accepts input.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed one chunk. Chunks after the parser went terminal are ignored.
    pub fn consume_data(&mut self, data: &[u8]) -> bool {
        if !self.active {
            return false;
        }
        if let Some(parser) = self.parser.as_mut() {
            self.active = parser.parse_data(data);
        }
        self.active
    }

    pub fn consume_text(&mut self, text: &str) -> bool {
        self.consume_data(text.as_bytes())
    }

    /// A chunk sink for producers that push data as it arrives.
    pub fn handler(&mut self) -> impl FnMut(&[u8]) -> bool + '_ {
        move |data: &[u8]| self.consume_data(data)
    }

    /// Finalize the parser and return its verdict.
    pub fn finish(mut self) -> bool {
        self.finalize()
    }

    fn finalize(&mut self) -> bool {
        self.active = false;
        match self.parser.take() {
            Some(mut parser) => parser.finish(),
            None => false,
        }
    }
}

impl Drop for StreamInput<'_> {
    fn drop(&mut self) {
        if self.parser.is_some() {
            tracing::debug!("stream input dropped without finish");
            self.finalize();
        }
    }
}

/// Run `f` with a fresh input over `parser`, then finalize it.
///
/// Returns the result of `f` and the parser's verdict.
pub fn with_stream_input<'a, P, F, R>(parser: P, f: F) -> (R, bool)
where
    P: StreamParser + 'a,
    F: FnOnce(&mut StreamInput<'a>) -> R,
{
    let mut input = StreamInput::new(parser);
    let result = f(&mut input);
    (result, input.finish())
}
