//! A compound with nothing in it.

use super::{Backend, make_compound};
use crate::compound::Compound;
use crate::kind::ValueKind;
use crate::values::ValueSpan;

pub struct EmptyBackend;

impl Backend for EmptyBackend {
    type Node = ();

    fn type_id(&self) -> &'static str {
        "empty"
    }

    fn root(&self) {}

    fn name(&self, _node: &()) -> Option<String> {
        None
    }

    fn canonical_type(&self, _node: &()) -> ValueKind {
        ValueKind::Unknown
    }

    fn is_list(&self, _node: &()) -> bool {
        false
    }

    fn nested_count(&self, _node: &()) -> usize {
        0
    }

    fn nested_at(&self, _node: &(), _index: usize) -> Option<()> {
        None
    }

    fn nested_named(&self, _node: &(), _name: &str) -> Option<()> {
        None
    }

    fn value_count(&self, _node: &()) -> usize {
        0
    }

    fn fetch_values(&self, _node: &(), _offset: usize, _dest: ValueSpan<'_>) -> usize {
        0
    }
}

/// A tree with a bare root: no children, no values.
pub fn empty() -> Compound {
    make_compound(EmptyBackend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::TreePath;

    #[test]
    fn test_empty_compound() {
        let tree = empty();
        let root = tree.structure();
        assert_eq!(root.nested_count(), 0);
        assert_eq!(root.value_count(), 0);
        assert_eq!(root.get::<i32>(), None);
        assert!(tree.find_path(&TreePath::from_dotted("a"), &[]).is_none());
        assert_eq!(tree.find_path(&TreePath::new(), &[]), Some(root));
    }
}
