//! The backend contract and its adaptation to [`CompoundImpl`].
//!
//! A backend describes one kind of physical tree (a directory, a parsed
//! document, an overlay) in terms of plain node values. [`InternedCompound`]
//! wraps any backend with a [`NodeInterner`] and exposes it through the
//! object-safe compound interface, so backends never deal with reference
//! counting or handle identity themselves.

pub mod empty;
pub mod filesystem;
pub mod json;
pub mod overlay;
pub mod yaml;

use crate::compound::{Compound, CompoundImpl};
use crate::interner::{NodeId, NodeInterner};
use crate::kind::ValueKind;
use crate::path::TreePath;
use crate::resolve::{Navigate, resolve};
use crate::values::ValueSpan;
use std::rc::Rc;

pub trait Backend: 'static {
    /// Backend-specific node identity. Equal nodes are interned once.
    type Node: Clone + PartialEq;

    fn type_id(&self) -> &'static str;

    fn root(&self) -> Self::Node;

    fn name(&self, node: &Self::Node) -> Option<String>;

    fn preview(&self, _node: &Self::Node) -> Option<String> {
        None
    }

    fn canonical_type(&self, node: &Self::Node) -> ValueKind;

    fn is_immutable(&self, _node: &Self::Node) -> bool {
        true
    }

    fn is_link(&self, _node: &Self::Node) -> bool {
        false
    }

    fn is_list(&self, node: &Self::Node) -> bool;

    fn nested_count(&self, node: &Self::Node) -> usize;

    fn nested_at(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

    fn nested_named(&self, node: &Self::Node, name: &str) -> Option<Self::Node>;

    fn find(&self, node: &Self::Node, path: &TreePath, tags: &[&str]) -> Option<Self::Node> {
        resolve(&BackendNav(self), node.clone(), path, tags)
    }

    fn value_count(&self, node: &Self::Node) -> usize;

    fn fetch_values(&self, node: &Self::Node, offset: usize, dest: ValueSpan<'_>) -> usize;
}

/// Runs the generic resolver directly on backend nodes.
pub struct BackendNav<'a, B: ?Sized>(pub &'a B);

impl<B: Backend + ?Sized> Navigate for BackendNav<'_, B> {
    type Node = B::Node;

    fn is_list(&self, node: &B::Node) -> bool {
        self.0.is_list(node)
    }

    fn child_at(&self, node: &B::Node, index: usize) -> Option<B::Node> {
        self.0.nested_at(node, index)
    }

    fn child_named(&self, node: &B::Node, name: &str) -> Option<B::Node> {
        self.0.nested_named(node, name)
    }
}

/// A backend plus the node table that backs its attributes.
pub struct InternedCompound<B: Backend> {
    backend: B,
    nodes: NodeInterner<B::Node>,
}

impl<B: Backend> InternedCompound<B> {
    pub fn new(backend: B) -> Self {
        InternedCompound {
            backend,
            nodes: NodeInterner::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_compound(self) -> Compound {
        Compound::new(self)
    }

    fn node(&self, id: NodeId) -> Option<Rc<B::Node>> {
        let node = self.nodes.get(id);
        if node.is_none() {
            tracing::debug!(
                compound = self.backend.type_id(),
                id = id.raw(),
                "unknown node id"
            );
        }
        node
    }

    fn intern(&self, node: Option<B::Node>) -> Option<NodeId> {
        node.map(|node| self.nodes.make_node(node))
    }
}

impl<B: Backend> CompoundImpl for InternedCompound<B> {
    fn type_id(&self) -> &'static str {
        self.backend.type_id()
    }

    fn add_ref(&self, id: NodeId) {
        self.nodes.add_ref(id);
    }

    fn release(&self, id: NodeId) {
        self.nodes.release(id);
    }

    fn structure(&self) -> NodeId {
        self.nodes.make_node(self.backend.root())
    }

    fn attribute_name(&self, id: NodeId) -> Option<String> {
        self.backend.name(&*self.node(id)?)
    }

    fn attribute_preview(&self, id: NodeId) -> Option<String> {
        self.backend.preview(&*self.node(id)?)
    }

    fn canonical_type(&self, id: NodeId) -> ValueKind {
        self.node(id)
            .map_or(ValueKind::Unknown, |node| self.backend.canonical_type(&node))
    }

    fn is_immutable(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| self.backend.is_immutable(&node))
    }

    fn is_link(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| self.backend.is_link(&node))
    }

    fn is_list(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| self.backend.is_list(&node))
    }

    fn nested_count(&self, id: NodeId) -> usize {
        self.node(id)
            .map_or(0, |node| self.backend.nested_count(&node))
    }

    fn nested_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        let node = self.node(id)?;
        self.intern(self.backend.nested_at(&node, index))
    }

    fn nested_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let node = self.node(id)?;
        self.intern(self.backend.nested_named(&node, name))
    }

    fn find(&self, id: NodeId, path: &TreePath, tags: &[&str]) -> Option<NodeId> {
        let node = self.node(id)?;
        self.intern(self.backend.find(&node, path, tags))
    }

    fn value_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |node| self.backend.value_count(&node))
    }

    fn fetch_values(&self, id: NodeId, offset: usize, dest: ValueSpan<'_>) -> usize {
        self.node(id)
            .map_or(0, |node| self.backend.fetch_values(&node, offset, dest))
    }

    fn interned_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Wrap `backend` into a ready-to-use compound.
pub fn make_compound<B: Backend>(backend: B) -> Compound {
    InternedCompound::new(backend).into_compound()
}
