//! Object builders: the path-keyed dual of visitors.
//!
//! Where a visitor sees nesting events, a builder sees every value together
//! with its absolute [`TreePath`]. [`BuildingVisitor`] converts one into the
//! other, so any traversal driver can populate any builder.
//!
//! Path rules: attribute names append a segment; structures and lists that
//! are items of a list append their zero-based index; scalar items of a
//! list are added, in order, at the list's own path (they still count
//! towards the index of later items).

use crate::path::TreePath;
use crate::values::Values;
use crate::visitor::ValueTreeVisitor;

/// Token size used when a builder has no preference.
pub const DEFAULT_MAX_TOKEN_SIZE: usize = 256;

pub trait ObjectBuilder {
    /// Hint for the largest token a streaming parser should expect.
    fn max_token_size(&self) -> usize {
        DEFAULT_MAX_TOKEN_SIZE
    }

    fn should_continue(&self) -> bool {
        true
    }

    fn begin(&mut self) {}

    fn add(&mut self, path: &TreePath, values: Values<'_>);

    fn add_object(&mut self, _path: &TreePath) {}

    fn finish_object(&mut self, _path: &TreePath) {}

    fn add_list(&mut self, _path: &TreePath) {}

    fn finish_list(&mut self, _path: &TreePath) {}

    fn unparsed_data(&mut self, _data: &[&[u8]]) {}

    fn finish(&mut self) -> bool {
        true
    }

    fn failed(&mut self) {}
}

impl<B: ObjectBuilder + ?Sized> ObjectBuilder for &mut B {
    fn max_token_size(&self) -> usize {
        (**self).max_token_size()
    }

    fn should_continue(&self) -> bool {
        (**self).should_continue()
    }

    fn begin(&mut self) {
        (**self).begin()
    }

    fn add(&mut self, path: &TreePath, values: Values<'_>) {
        (**self).add(path, values)
    }

    fn add_object(&mut self, path: &TreePath) {
        (**self).add_object(path)
    }

    fn finish_object(&mut self, path: &TreePath) {
        (**self).finish_object(path)
    }

    fn add_list(&mut self, path: &TreePath) {
        (**self).add_list(path)
    }

    fn finish_list(&mut self, path: &TreePath) {
        (**self).finish_list(path)
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
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Struct { indexed: bool },
    List { indexed: bool, next: usize },
}

/// Adapts an [`ObjectBuilder`] to the visitor protocol.
pub struct BuildingVisitor<B> {
    builder: B,
    path: TreePath,
    frames: Vec<Frame>,
}

impl<B: ObjectBuilder> BuildingVisitor<B> {
    pub fn new(builder: B) -> Self {
        BuildingVisitor {
            builder,
            path: TreePath::new(),
            frames: Vec::new(),
        }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn into_builder(self) -> B {
        self.builder
    }

    /// Push the next index segment if the container being opened is an
    /// item of a list.
    fn enter_item(&mut self) -> bool {
        match self.frames.last_mut() {
            Some(Frame::List { next, .. }) => {
                self.path.push(next.to_string());
                *next += 1;
                true
            }
            _ => false,
        }
    }

    fn leave_item(&mut self, indexed: bool) {
        if indexed {
            self.path.pop();
        }
    }
}

impl<B: ObjectBuilder> ValueTreeVisitor for BuildingVisitor<B> {
    fn should_continue(&self) -> bool {
        self.builder.should_continue()
    }

    fn begin(&mut self) {
        self.path = TreePath::new();
        self.frames.clear();
        self.builder.begin();
    }

    fn consume(&mut self, values: Values<'_>) {
        self.builder.add(&self.path, values);
        if let Some(Frame::List { next, .. }) = self.frames.last_mut() {
            *next += values.len();
        }
    }

    fn begin_struct(&mut self) {
        let indexed = self.enter_item();
        self.frames.push(Frame::Struct { indexed });
        self.builder.add_object(&self.path);
    }

    fn begin_attribute(&mut self, name: &str) {
        self.path.push(name);
    }

    fn finish_attribute(&mut self, _name: &str) {
        self.path.pop();
    }

    fn finish_struct(&mut self) {
        self.builder.finish_object(&self.path);
        if let Some(Frame::Struct { indexed }) = self.frames.pop() {
            self.leave_item(indexed);
        }
    }

    fn begin_list(&mut self) {
        let indexed = self.enter_item();
        self.frames.push(Frame::List { indexed, next: 0 });
        self.builder.add_list(&self.path);
    }

    fn finish_list(&mut self) {
        self.builder.finish_list(&self.path);
        if let Some(Frame::List { indexed, .. }) = self.frames.pop() {
            self.leave_item(indexed);
        }
    }

    fn unparsed_data(&mut self, data: &[&[u8]]) {
        self.builder.unparsed_data(data);
    }

    fn finish(&mut self) -> bool {
        self.builder.finish()
    }

    fn failed(&mut self) {
        self.builder.failed();
    }
}

pub fn make_building_visitor<B: ObjectBuilder>(builder: B) -> BuildingVisitor<B> {
    BuildingVisitor::new(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ObjectBuilder for Recorder {
        fn add(&mut self, path: &TreePath, values: Values<'_>) {
            self.events.push(format!("add {path} = {values}"));
        }

        fn add_object(&mut self, path: &TreePath) {
            self.events.push(format!("object {path}"));
        }

        fn add_list(&mut self, path: &TreePath) {
            self.events.push(format!("list {path}"));
        }
    }

    #[test]
    fn test_paths_follow_nesting() {
        let mut visitor = make_building_visitor(Recorder::default());
        visitor.begin();
        visitor.begin_struct();
        visitor.begin_attribute("name");
        visitor.consume(Values::Str(&["box"]));
        visitor.finish_attribute("name");
        visitor.begin_attribute("tags");
        visitor.begin_list();
        visitor.consume(Values::Str(&["a"]));
        visitor.consume(Values::Str(&["b"]));
        visitor.finish_list();
        visitor.finish_attribute("tags");
        visitor.begin_attribute("points");
        visitor.begin_list();
        visitor.begin_struct();
        visitor.begin_attribute("x");
        visitor.consume(Values::Int(&[1]));
        visitor.finish_attribute("x");
        visitor.finish_struct();
        visitor.begin_struct();
        visitor.begin_attribute("x");
        visitor.consume(Values::Int(&[2]));
        visitor.finish_attribute("x");
        visitor.finish_struct();
        visitor.finish_list();
        visitor.finish_attribute("points");
        visitor.finish_struct();
        assert!(visitor.finish());

        let events = visitor.into_builder().events;
        assert_eq!(
            events,
            vec![
                "object ",
                "add name = \"box\"",
                "list tags",
                "add tags = \"a\"",
                "add tags = \"b\"",
                "list points",
                "object points.0",
                "add points.0.x = 1",
                "object points.1",
                "add points.1.x = 2",
            ]
        );
    }
}
