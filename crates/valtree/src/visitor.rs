//! The push-based traversal protocol.
//!
//! A [`ValueTreeVisitor`] receives a tree as a flat sequence of events:
//!
//! ```text
//! begin
//!   begin_struct
//!     begin_attribute("name") consume(values) finish_attribute("name")
//!     begin_attribute("items") begin_list consume(..) consume(..) finish_list finish_attribute("items")
//!   finish_struct
//! finish            (or failed)
//! ```
//!
//! Drivers poll [`ValueTreeVisitor::should_continue`] and stop early when it
//! returns `false`; they still end the traversal with `finish` or `failed`.
//! Streaming drivers call `flush` at every chunk boundary and report bytes
//! left over after the document through `unparsed_data`.

use crate::values::Values;
use std::io::Write;

pub trait ValueTreeVisitor {
    fn should_continue(&self) -> bool {
        true
    }

    fn begin(&mut self);

    fn consume(&mut self, values: Values<'_>);

    fn begin_struct(&mut self);

    fn begin_attribute(&mut self, name: &str);

    fn finish_attribute(&mut self, name: &str);

    fn finish_struct(&mut self);

    fn begin_list(&mut self);

    fn finish_list(&mut self);

    fn flush(&mut self) {}

    fn unparsed_data(&mut self, _data: &[&[u8]]) {}

    /// End of a successful traversal. Returns whether the visitor is
    /// satisfied with what it received.
    fn finish(&mut self) -> bool;

    fn failed(&mut self);
}

macro_rules! forward_visitor {
    () => {
        fn should_continue(&self) -> bool {
            (**self).should_continue()
        }

        fn begin(&mut self) {
            (**self).begin()
        }

        fn consume(&mut self, values: Values<'_>) {
            (**self).consume(values)
        }

        fn begin_struct(&mut self) {
            (**self).begin_struct()
        }

        fn begin_attribute(&mut self, name: &str) {
            (**self).begin_attribute(name)
        }

        fn finish_attribute(&mut self, name: &str) {
            (**self).finish_attribute(name)
        }

        fn finish_struct(&mut self) {
            (**self).finish_struct()
        }

        fn begin_list(&mut self) {
            (**self).begin_list()
        }

        fn finish_list(&mut self) {
            (**self).finish_list()
        }

        fn flush(&mut self) {
            (**self).flush()
        }

        fn unparsed_data(&mut self, data: &[&[u8]]) {
            (**self).unparsed_data(data)
        }

        fn finish(&mut self) -> bool {
            (**self).finish()
        }

        fn failed(&mut self) {
            (**self).failed()
        }
    };
}

impl<V: ValueTreeVisitor + ?Sized> ValueTreeVisitor for &mut V {
    forward_visitor!();
}

impl<V: ValueTreeVisitor + ?Sized> ValueTreeVisitor for Box<V> {
    forward_visitor!();
}

/// Sends every event to two visitors.
///
/// Continues while either visitor wants to; succeeds only if both do.
pub struct CombinedVisitor<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> CombinedVisitor<A, B> {
    pub fn new(first: A, second: B) -> Self {
        CombinedVisitor { first, second }
    }

    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: ValueTreeVisitor, B: ValueTreeVisitor> ValueTreeVisitor for CombinedVisitor<A, B> {
    fn should_continue(&self) -> bool {
        self.first.should_continue() || self.second.should_continue()
    }

    fn begin(&mut self) {
        self.first.begin();
        self.second.begin();
    }

    fn consume(&mut self, values: Values<'_>) {
        self.first.consume(values);
        self.second.consume(values);
    }

    fn begin_struct(&mut self) {
        self.first.begin_struct();
        self.second.begin_struct();
    }

    fn begin_attribute(&mut self, name: &str) {
        self.first.begin_attribute(name);
        self.second.begin_attribute(name);
    }

    fn finish_attribute(&mut self, name: &str) {
        self.first.finish_attribute(name);
        self.second.finish_attribute(name);
    }

    fn finish_struct(&mut self) {
        self.first.finish_struct();
        self.second.finish_struct();
    }

    fn begin_list(&mut self) {
        self.first.begin_list();
        self.second.begin_list();
    }

    fn finish_list(&mut self) {
        self.first.finish_list();
        self.second.finish_list();
    }

    fn flush(&mut self) {
        self.first.flush();
        self.second.flush();
    }

    fn unparsed_data(&mut self, data: &[&[u8]]) {
        self.first.unparsed_data(data);
        self.second.unparsed_data(data);
    }

    fn finish(&mut self) -> bool {
        let first = self.first.finish();
        let second = self.second.finish();
        first && second
    }

    fn failed(&mut self) {
        self.first.failed();
        self.second.failed();
    }
}

pub fn make_combined_visitor<A, B>(first: A, second: B) -> CombinedVisitor<A, B>
where
    A: ValueTreeVisitor,
    B: ValueTreeVisitor,
{
    CombinedVisitor::new(first, second)
}

const INDENT: &str = "  ";

/// Writes an indented log of every event.
///
/// Write errors are logged once; afterwards the visitor stops asking for
/// more input and `finish` reports failure.
pub struct PrintingVisitor<W: Write> {
    out: W,
    depth: usize,
    write_failed: bool,
}

impl<W: Write> PrintingVisitor<W> {
    pub fn new(out: W) -> Self {
        PrintingVisitor {
            out,
            depth: 0,
            write_failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        if self.write_failed {
            return;
        }
        let result = write!(self.out, "{}", INDENT.repeat(self.depth))
            .and_then(|()| self.out.write_fmt(text))
            .and_then(|()| writeln!(self.out));
        if let Err(error) = result {
            tracing::error!(%error, "failed to write value tree event");
            self.write_failed = true;
        }
    }

    fn close(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(format_args!("{text}"));
    }
}

impl<W: Write> ValueTreeVisitor for PrintingVisitor<W> {
    fn should_continue(&self) -> bool {
        !self.write_failed
    }

    fn begin(&mut self) {
        self.line(format_args!("begin"));
    }

    fn consume(&mut self, values: Values<'_>) {
        self.line(format_args!("{}: {}", values.kind_name(), values));
    }

    fn begin_struct(&mut self) {
        self.line(format_args!("{{"));
        self.depth += 1;
    }

    fn begin_attribute(&mut self, name: &str) {
        self.line(format_args!("{name:?}:"));
        self.depth += 1;
    }

    fn finish_attribute(&mut self, _name: &str) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn finish_struct(&mut self) {
        self.close("}");
    }

    fn begin_list(&mut self) {
        self.line(format_args!("["));
        self.depth += 1;
    }

    fn finish_list(&mut self) {
        self.close("]");
    }

    fn flush(&mut self) {
        if let Err(error) = self.out.flush() {
            tracing::error!(%error, "failed to flush value tree output");
            self.write_failed = true;
        }
    }

    fn unparsed_data(&mut self, data: &[&[u8]]) {
        let total: usize = data.iter().map(|block| block.len()).sum();
        self.line(format_args!("unparsed: {total} bytes"));
    }

    fn finish(&mut self) -> bool {
        self.line(format_args!("finish"));
        self.flush();
        !self.write_failed
    }

    fn failed(&mut self) {
        self.line(format_args!("failed"));
        self.flush();
    }
}

pub fn make_printing_visitor<W: Write>(out: W) -> PrintingVisitor<W> {
    PrintingVisitor::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts events, optionally asking to stop after a number of values.
    #[derive(Default)]
    struct Counter {
        values: usize,
        structs: usize,
        limit: Option<usize>,
        finished: bool,
    }

    impl ValueTreeVisitor for Counter {
        fn should_continue(&self) -> bool {
            self.limit.is_none_or(|limit| self.values < limit)
        }
        fn begin(&mut self) {}
        fn consume(&mut self, values: Values<'_>) {
            self.values += values.len();
        }
        fn begin_struct(&mut self) {
            self.structs += 1;
        }
        fn begin_attribute(&mut self, _name: &str) {}
        fn finish_attribute(&mut self, _name: &str) {}
        fn finish_struct(&mut self) {}
        fn begin_list(&mut self) {}
        fn finish_list(&mut self) {}
        fn finish(&mut self) -> bool {
            self.finished = true;
            true
        }
        fn failed(&mut self) {}
    }

    fn drive(visitor: &mut dyn ValueTreeVisitor) {
        visitor.begin();
        visitor.begin_struct();
        visitor.begin_attribute("a");
        visitor.consume(Values::Int(&[1, 2]));
        visitor.finish_attribute("a");
        visitor.begin_attribute("b");
        visitor.begin_list();
        visitor.consume(Values::Str(&["x"]));
        visitor.consume(Values::Bool(&[true]));
        visitor.finish_list();
        visitor.finish_attribute("b");
        visitor.finish_struct();
        visitor.finish();
    }

    #[test]
    fn test_printing_visitor_output() {
        let mut printer = make_printing_visitor(Vec::new());
        drive(&mut printer);
        let output = String::from_utf8(printer.into_inner()).unwrap();
        insta::assert_snapshot!(output.trim_end(), @r#"
        begin
        {
          "a":
            int: 1, 2
          "b":
            [
              string: "x"
              bool: true
            ]
        }
        finish
        "#);
    }

    #[test]
    fn test_combined_visitor_fans_out() {
        let mut combined = make_combined_visitor(Counter::default(), Counter::default());
        drive(&mut combined);
        let (first, second) = combined.into_inner();
        assert_eq!(first.values, 4);
        assert_eq!(second.values, 4);
        assert!(first.finished && second.finished);
    }

    #[test]
    fn test_combined_continue_is_either() {
        let stopping = Counter {
            limit: Some(0),
            ..Counter::default()
        };
        let combined = make_combined_visitor(stopping, Counter::default());
        assert!(combined.should_continue());
        let both_stopping = make_combined_visitor(
            Counter {
                limit: Some(0),
                ..Counter::default()
            },
            Counter {
                limit: Some(0),
                ..Counter::default()
            },
        );
        assert!(!both_stopping.should_continue());
    }

    #[test]
    fn test_boxed_visitor_forwards() {
        let mut boxed: Box<dyn ValueTreeVisitor> = Box::new(Counter::default());
        drive(&mut boxed);
        assert!(boxed.finish());
    }
}
