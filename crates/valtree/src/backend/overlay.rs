//! Overlays: one tree stacked from several source trees.
//!
//! Sources are attributes of other compounds, ordered by precedence (the
//! first source wins). A node of the overlay is a path from the overlay
//! root. Its children are the union of the child names found at that path
//! in every source, and its values come from the first source that has the
//! path at all.
//!
//! # Example
//!
//! ```rust
//! use valtree::{from_json_text, make_overlay};
//!
//! let defaults = from_json_text(r#"{"port": 80, "host": "localhost"}"#);
//! let site = from_json_text(r#"{"port": 8080}"#);
//!
//! let overlay = make_overlay();
//! overlay.add_overlay(defaults.structure());
//! overlay.add_overlay(site.structure());
//!
//! let tree = overlay.compound();
//! assert_eq!(tree.get::<u16>("port", &[]), Some(8080));
//! assert_eq!(tree.get::<String>("host", &[]).as_deref(), Some("localhost"));
//! ```

use super::{Backend, InternedCompound};
use crate::compound::{Attribute, Compound};
use crate::kind::ValueKind;
use crate::path::TreePath;
use crate::values::ValueSpan;
use indexmap::IndexSet;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct OverlayBackend {
    sources: RefCell<Vec<Attribute>>,
    children: RefCell<HashMap<TreePath, Rc<IndexSet<String>>>>,
}

impl OverlayBackend {
    /// Make `source` the highest-precedence source.
    pub fn add_overlay(&self, source: Attribute) {
        self.sources.borrow_mut().insert(0, source);
        self.children.borrow_mut().clear();
    }

    pub fn source_count(&self) -> usize {
        self.sources.borrow().len()
    }

    /// Every source that has `path`, in precedence order.
    fn resolved(&self, path: &TreePath) -> Vec<Attribute> {
        self.sources
            .borrow()
            .iter()
            .filter_map(|source| source.find(path, &[]))
            .collect()
    }

    fn first(&self, path: &TreePath) -> Option<Attribute> {
        self.sources
            .borrow()
            .iter()
            .find_map(|source| source.find(path, &[]))
    }

    fn child_names(&self, path: &TreePath) -> Rc<IndexSet<String>> {
        if let Some(names) = self.children.borrow().get(path) {
            return Rc::clone(names);
        }
        let mut names = IndexSet::new();
        for source in self.resolved(path) {
            for (index, child) in source.children().enumerate() {
                let name = child
                    .name()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| index.to_string());
                names.insert(name);
            }
        }
        let names = Rc::new(names);
        self.children
            .borrow_mut()
            .insert(path.clone(), Rc::clone(&names));
        names
    }
}

impl Backend for OverlayBackend {
    type Node = TreePath;

    fn type_id(&self) -> &'static str {
        "overlay"
    }

    fn root(&self) -> TreePath {
        TreePath::new()
    }

    fn name(&self, node: &TreePath) -> Option<String> {
        node.last().map(str::to_string)
    }

    fn preview(&self, node: &TreePath) -> Option<String> {
        self.first(node)?.preview()
    }

    fn canonical_type(&self, node: &TreePath) -> ValueKind {
        self.first(node)
            .map_or(ValueKind::Unknown, |source| source.canonical_type())
    }

    fn is_immutable(&self, node: &TreePath) -> bool {
        self.first(node).is_some_and(|source| source.is_immutable())
    }

    fn is_link(&self, node: &TreePath) -> bool {
        self.first(node).is_some_and(|source| source.is_link())
    }

    /// Children are always addressed by name; list elements of the sources
    /// are named by their index.
    fn is_list(&self, _node: &TreePath) -> bool {
        false
    }

    fn nested_count(&self, node: &TreePath) -> usize {
        self.child_names(node).len()
    }

    fn nested_at(&self, node: &TreePath, index: usize) -> Option<TreePath> {
        let names = self.child_names(node);
        names.get_index(index).map(|name| node.join(name.as_str()))
    }

    fn nested_named(&self, node: &TreePath, name: &str) -> Option<TreePath> {
        self.child_names(node)
            .contains(name)
            .then(|| node.join(name))
    }

    fn value_count(&self, node: &TreePath) -> usize {
        self.first(node).map_or(0, |source| source.value_count())
    }

    fn fetch_values(&self, node: &TreePath, offset: usize, dest: ValueSpan<'_>) -> usize {
        match self.first(node) {
            Some(source) => source.fetch_span(offset, dest),
            None => 0,
        }
    }
}

/// Handle to an overlay compound that can still take new sources.
#[derive(Clone)]
pub struct Overlay {
    inner: Rc<InternedCompound<OverlayBackend>>,
}

impl Overlay {
    /// Stack `source` on top of the existing sources.
    pub fn add_overlay(&self, source: Attribute) {
        tracing::debug!(source = source.type_id(), "adding overlay source");
        self.inner.backend().add_overlay(source);
    }

    pub fn source_count(&self) -> usize {
        self.inner.backend().source_count()
    }

    pub fn compound(&self) -> Compound {
        Compound::from_rc(self.inner.clone())
    }
}

/// Create an overlay without any sources.
pub fn make_overlay() -> Overlay {
    Overlay {
        inner: Rc::new(InternedCompound::new(OverlayBackend::default())),
    }
}
