//! Reference-counted interning of backend nodes.
//!
//! Every compound keeps one [`NodeInterner`] for its backend's node type.
//! Structurally equal nodes share one entry, so looking the same node up
//! twice yields the same [`NodeId`], and the entry's reference count says
//! how many attribute handles currently point at it. Entries disappear as
//! soon as their count drops to zero.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Stable identity of an interned node.
///
/// Ids are never reused within one interner, so a stale id can only miss,
/// never alias a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Entry<N> {
    id: NodeId,
    ref_count: usize,
    node: Rc<N>,
}

#[derive(Debug)]
pub struct NodeInterner<N> {
    entries: RefCell<Vec<Entry<N>>>,
    next_id: Cell<u64>,
}

impl<N> Default for NodeInterner<N> {
    fn default() -> Self {
        NodeInterner {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<N: PartialEq> NodeInterner<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `candidate` and take one reference on the resulting entry.
    ///
    /// If an equal node is already interned, its count is incremented and
    /// the candidate is discarded.
    pub fn make_node(&self, candidate: N) -> NodeId {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.iter_mut().find(|entry| *entry.node == candidate) {
            entry.ref_count += 1;
            return entry.id;
        }
        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        entries.push(Entry {
            id,
            ref_count: 1,
            node: Rc::new(candidate),
        });
        id
    }

    /// Take another reference on an interned node. Returns `false` for
    /// unknown ids.
    pub fn add_ref(&self, id: NodeId) -> bool {
        match self.entries.borrow_mut().iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.ref_count += 1;
                true
            }
            None => false,
        }
    }

    /// Drop one reference, erasing the entry once none remain. Returns
    /// `false` for unknown ids.
    pub fn release(&self, id: NodeId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let entry = &mut entries[position];
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            entries.remove(position);
        }
        true
    }

    pub fn get(&self, id: NodeId) -> Option<Rc<N>> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| Rc::clone(&entry.node))
    }

    /// Live reference count of `id`, zero once it is gone.
    pub fn ref_count(&self, id: NodeId) -> usize {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.id == id)
            .map_or(0, |entry| entry.ref_count)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_nodes_share_an_entry() {
        let interner = NodeInterner::new();
        let a = interner.make_node(vec![0, 1]);
        let b = interner.make_node(vec![0, 1]);
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
        assert_eq!(interner.ref_count(a), 2);
    }

    #[test]
    fn test_distinct_nodes_get_distinct_ids() {
        let interner = NodeInterner::new();
        let a = interner.make_node("a".to_string());
        let b = interner.make_node("b".to_string());
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.get(b).as_deref().map(String::as_str), Some("b"));
    }

    #[test]
    fn test_release_erases_at_zero() {
        let interner = NodeInterner::new();
        let id = interner.make_node(7);
        assert!(interner.add_ref(id));
        assert!(interner.release(id));
        assert_eq!(interner.ref_count(id), 1);
        assert!(interner.release(id));
        assert!(interner.is_empty());
        assert_eq!(interner.get(id), None);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let interner = NodeInterner::new();
        let id = interner.make_node(1);
        assert!(interner.release(id));
        assert!(!interner.release(id));
        assert!(!interner.add_ref(id));
        assert_eq!(interner.ref_count(id), 0);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let interner = NodeInterner::new();
        let first = interner.make_node(1);
        interner.release(first);
        let second = interner.make_node(1);
        assert_ne!(first, second);
        assert_eq!(interner.ref_count(first), 0);
        assert_eq!(interner.ref_count(second), 1);
    }
}
