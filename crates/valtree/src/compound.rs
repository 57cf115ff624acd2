//! Compounds and attributes.
//!
//! A [`Compound`] represents one whole tree; an [`Attribute`] is a handle to
//! one node inside it. Attributes are reference counted against the
//! compound's node table: cloning takes a reference, dropping releases it.
//!
//! Every attribute carries its owning compound, so the methods on
//! [`Attribute`] can never mix up trees. The compound-centric methods on
//! [`Compound`] accept any attribute and return the empty result for one
//! that belongs to a different compound.
//!
//! # Example
//!
//! ```rust
//! use valtree::{TreePath, from_json_text};
//!
//! let tree = from_json_text(r#"{"server": {"port": 8080, "port@test": 9090}}"#);
//! let port = tree.find_path(&TreePath::from_dotted("server.port"), &["test"]).unwrap();
//! assert_eq!(port.get::<u16>(), Some(9090));
//! ```

use crate::interner::NodeId;
use crate::kind::ValueKind;
use crate::path::TreePath;
use crate::resolve::Navigate;
use crate::values::{FetchValue, ValueSpan};
use std::fmt;
use std::rc::Rc;

/// Object-safe interface every compound implementation provides.
///
/// Node ids handed out by `structure`, `nested_at`, `nested_named` and
/// `find` already carry one reference, which the receiving [`Attribute`]
/// takes over. Unknown ids yield empty results.
pub trait CompoundImpl {
    /// Short name of the implementation, for diagnostics.
    fn type_id(&self) -> &'static str;

    fn add_ref(&self, id: NodeId);

    fn release(&self, id: NodeId);

    fn structure(&self) -> NodeId;

    fn attribute_name(&self, id: NodeId) -> Option<String>;

    fn attribute_preview(&self, id: NodeId) -> Option<String>;

    fn canonical_type(&self, id: NodeId) -> ValueKind;

    fn is_immutable(&self, id: NodeId) -> bool;

    fn is_link(&self, id: NodeId) -> bool;

    fn is_list(&self, id: NodeId) -> bool;

    fn nested_count(&self, id: NodeId) -> usize;

    fn nested_at(&self, id: NodeId, index: usize) -> Option<NodeId>;

    fn nested_named(&self, id: NodeId, name: &str) -> Option<NodeId>;

    fn find(&self, id: NodeId, path: &TreePath, tags: &[&str]) -> Option<NodeId>;

    fn value_count(&self, id: NodeId) -> usize;

    fn fetch_values(&self, id: NodeId, offset: usize, dest: ValueSpan<'_>) -> usize;

    /// Number of live entries in the node table.
    fn interned_count(&self) -> usize;
}

/// Handle to one node of a [`Compound`].
pub struct Attribute {
    owner: Rc<dyn CompoundImpl>,
    id: NodeId,
}

impl Attribute {
    fn adopt(owner: &Rc<dyn CompoundImpl>, id: NodeId) -> Attribute {
        Attribute {
            owner: Rc::clone(owner),
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The compound this attribute belongs to.
    pub fn compound(&self) -> Compound {
        Compound {
            inner: Rc::clone(&self.owner),
        }
    }

    pub fn belongs_to(&self, compound: &Compound) -> bool {
        Rc::ptr_eq(&self.owner, &compound.inner)
    }

    pub fn type_id(&self) -> &'static str {
        self.owner.type_id()
    }

    pub fn name(&self) -> Option<String> {
        self.owner.attribute_name(self.id)
    }

    pub fn preview(&self) -> Option<String> {
        self.owner.attribute_preview(self.id)
    }

    pub fn canonical_type(&self) -> ValueKind {
        self.owner.canonical_type(self.id)
    }

    pub fn is_immutable(&self) -> bool {
        self.owner.is_immutable(self.id)
    }

    pub fn is_link(&self) -> bool {
        self.owner.is_link(self.id)
    }

    /// Whether nested nodes are addressed by index rather than by name.
    pub fn is_list(&self) -> bool {
        self.owner.is_list(self.id)
    }

    pub fn nested_count(&self) -> usize {
        self.owner.nested_count(self.id)
    }

    pub fn has_nested(&self) -> bool {
        self.nested_count() != 0
    }

    pub fn nested_at(&self, index: usize) -> Option<Attribute> {
        let id = self.owner.nested_at(self.id, index)?;
        Some(Attribute::adopt(&self.owner, id))
    }

    pub fn nested_named(&self, name: &str) -> Option<Attribute> {
        let id = self.owner.nested_named(self.id, name)?;
        Some(Attribute::adopt(&self.owner, id))
    }

    /// Iterate over the nested attributes in index order.
    pub fn children(&self) -> impl Iterator<Item = Attribute> + '_ {
        (0..self.nested_count()).filter_map(|index| self.nested_at(index))
    }

    /// Resolve `path` below this attribute, preferring `segment@tag`
    /// variants in the order of `tags`.
    pub fn find(&self, path: &TreePath, tags: &[&str]) -> Option<Attribute> {
        let id = self.owner.find(self.id, path, tags)?;
        Some(Attribute::adopt(&self.owner, id))
    }

    pub fn value_count(&self) -> usize {
        self.owner.value_count(self.id)
    }

    /// Copy values starting at `offset` into `dest`, converting to `T`.
    ///
    /// Returns the number of values written, at most `dest.len()` and at
    /// most `value_count() - offset`. Zero if the values do not convert.
    pub fn fetch_values<T: FetchValue>(&self, offset: usize, dest: &mut [T]) -> usize {
        self.owner.fetch_values(self.id, offset, T::span(dest))
    }

    /// Like [`Attribute::fetch_values`], for a destination already wrapped
    /// in a [`ValueSpan`].
    pub fn fetch_span(&self, offset: usize, dest: ValueSpan<'_>) -> usize {
        self.owner.fetch_values(self.id, offset, dest)
    }

    /// The single value at `offset`.
    pub fn fetch_value<T: FetchValue>(&self, offset: usize) -> Option<T> {
        let mut slot = [T::default()];
        match self.fetch_values(offset, &mut slot) {
            1 => {
                let [value] = slot;
                Some(value)
            }
            _ => None,
        }
    }

    /// The first value, converted to `T`.
    pub fn get<T: FetchValue>(&self) -> Option<T> {
        self.fetch_value(0)
    }

    /// All values, converted to `T`. Stops at the first value that does not
    /// convert.
    pub fn get_all<T: FetchValue>(&self) -> Vec<T> {
        let mut values: Vec<T> = (0..self.value_count()).map(|_| T::default()).collect();
        let written = self.fetch_values(0, &mut values);
        values.truncate(written);
        values
    }

    /// The whole value as raw bytes, fetched in chunks until exhausted.
    pub fn fetch_blob(&self) -> Vec<u8> {
        let mut blob = Vec::new();
        let mut chunk = [0u8; 256];
        loop {
            let written = self.fetch_values(blob.len(), &mut chunk);
            blob.extend_from_slice(&chunk[..written]);
            if written < chunk.len() {
                return blob;
            }
        }
    }

    /// The value as text. Byte-valued nodes (files) are decoded as a whole,
    /// everything else yields its first value as a string.
    pub fn get_string(&self) -> Option<String> {
        match self.canonical_type() {
            ValueKind::Byte if self.value_count() > 0 => {
                Some(self.get_all::<char>().into_iter().collect())
            }
            _ => self.get::<String>(),
        }
    }

    /// Resolve `path` and fetch its first value.
    pub fn get_at<T: FetchValue>(&self, path: &TreePath, tags: &[&str]) -> Option<T> {
        self.find(path, tags)?.get()
    }
}

impl Clone for Attribute {
    fn clone(&self) -> Self {
        self.owner.add_ref(self.id);
        Attribute {
            owner: Rc::clone(&self.owner),
            id: self.id,
        }
    }
}

impl Drop for Attribute {
    fn drop(&mut self) {
        self.owner.release(self.id);
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.owner, &other.owner) && self.id == other.id
    }
}

impl Eq for Attribute {}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("type_id", &self.owner.type_id())
            .field("id", &self.id)
            .field("name", &self.name())
            .finish()
    }
}

/// A whole value tree.
///
/// Cheap to clone; clones share the same node table.
#[derive(Clone)]
pub struct Compound {
    inner: Rc<dyn CompoundImpl>,
}

impl Compound {
    pub fn new<C: CompoundImpl + 'static>(implementation: C) -> Self {
        Compound {
            inner: Rc::new(implementation),
        }
    }

    pub fn from_rc(inner: Rc<dyn CompoundImpl>) -> Self {
        Compound { inner }
    }

    pub fn type_id(&self) -> &'static str {
        self.inner.type_id()
    }

    /// The root attribute of the tree.
    pub fn structure(&self) -> Attribute {
        Attribute::adopt(&self.inner, self.inner.structure())
    }

    /// Number of distinct nodes currently referenced by live attributes.
    pub fn interned_count(&self) -> usize {
        self.inner.interned_count()
    }

    pub fn owns(&self, attribute: &Attribute) -> bool {
        attribute.belongs_to(self)
    }

    pub fn ptr_eq(&self, other: &Compound) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn checked<'a>(&self, attribute: &'a Attribute) -> Option<&'a Attribute> {
        if self.owns(attribute) {
            Some(attribute)
        } else {
            tracing::debug!(
                compound = self.type_id(),
                attribute_owner = attribute.type_id(),
                "attribute does not belong to this compound"
            );
            None
        }
    }

    pub fn attribute_name(&self, attribute: &Attribute) -> Option<String> {
        self.checked(attribute)?.name()
    }

    pub fn attribute_preview(&self, attribute: &Attribute) -> Option<String> {
        self.checked(attribute)?.preview()
    }

    pub fn canonical_type(&self, attribute: &Attribute) -> ValueKind {
        self.checked(attribute)
            .map_or(ValueKind::Unknown, Attribute::canonical_type)
    }

    pub fn is_immutable(&self, attribute: &Attribute) -> bool {
        self.checked(attribute).is_some_and(Attribute::is_immutable)
    }

    pub fn is_link(&self, attribute: &Attribute) -> bool {
        self.checked(attribute).is_some_and(Attribute::is_link)
    }

    pub fn nested_count(&self, attribute: &Attribute) -> usize {
        self.checked(attribute).map_or(0, Attribute::nested_count)
    }

    pub fn nested_at(&self, attribute: &Attribute, index: usize) -> Option<Attribute> {
        self.checked(attribute)?.nested_at(index)
    }

    pub fn nested_named(&self, attribute: &Attribute, name: &str) -> Option<Attribute> {
        self.checked(attribute)?.nested_named(name)
    }

    pub fn find(&self, attribute: &Attribute, path: &TreePath, tags: &[&str]) -> Option<Attribute> {
        self.checked(attribute)?.find(path, tags)
    }

    pub fn value_count(&self, attribute: &Attribute) -> usize {
        self.checked(attribute).map_or(0, Attribute::value_count)
    }

    pub fn fetch_values<T: FetchValue>(
        &self,
        attribute: &Attribute,
        offset: usize,
        dest: &mut [T],
    ) -> usize {
        self.checked(attribute)
            .map_or(0, |attribute| attribute.fetch_values(offset, dest))
    }

    /// Resolve `path` from the root.
    pub fn find_path(&self, path: &TreePath, tags: &[&str]) -> Option<Attribute> {
        self.structure().find(path, tags)
    }

    pub fn nested_in_root(&self, name: &str) -> Option<Attribute> {
        self.structure().nested_named(name)
    }

    /// Resolve a dotted key from the root and fetch its first value.
    pub fn get<T: FetchValue>(&self, key: &str, tags: &[&str]) -> Option<T> {
        self.structure().get_at(&TreePath::from_dotted(key), tags)
    }

    /// Whether `key` resolves to a node holding at least one value.
    pub fn has_value(&self, key: &str, tags: &[&str]) -> bool {
        self.find_path(&TreePath::from_dotted(key), tags)
            .is_some_and(|attribute| attribute.value_count() > 0)
    }
}

impl fmt::Debug for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compound")
            .field("type_id", &self.type_id())
            .field("interned", &self.interned_count())
            .finish()
    }
}

/// Navigation over attributes, so the generic resolver also runs on the
/// public handle level.
pub struct AttributeNav;

impl Navigate for AttributeNav {
    type Node = Attribute;

    fn is_list(&self, node: &Attribute) -> bool {
        node.is_list()
    }

    fn child_at(&self, node: &Attribute, index: usize) -> Option<Attribute> {
        node.nested_at(index)
    }

    fn child_named(&self, node: &Attribute, name: &str) -> Option<Attribute> {
        node.nested_named(name)
    }
}
