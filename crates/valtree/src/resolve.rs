//! Path and tag resolution.
//!
//! One algorithm locates a node given a [`TreePath`] and an ordered tag
//! list. For every segment it prefers a tagged variant `segment@tag`
//! (trying tags in order, most specific first) over the bare segment.
//! Segments applied to list nodes must be numeric indices instead.
//!
//! The algorithm is written against [`Navigate`], so it serves both
//! backend nodes (inside a compound) and attributes (across the public
//! API) without being duplicated.

use crate::path::TreePath;

/// Separator between a segment and its variant tag.
pub const TAG_SEPARATOR: char = '@';

/// One-level navigation needed by [`resolve`].
pub trait Navigate {
    type Node;

    fn is_list(&self, node: &Self::Node) -> bool;

    fn child_at(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

    fn child_named(&self, node: &Self::Node, name: &str) -> Option<Self::Node>;
}

/// The name of the variant of `segment` for `tag`.
pub fn tagged_name(segment: &str, tag: &str) -> String {
    format!("{segment}{TAG_SEPARATOR}{tag}")
}

/// Resolve `path` starting at `start`, preferring tagged variants in the
/// order of `tags`. The empty path resolves to `start` itself.
pub fn resolve<N>(nav: &N, start: N::Node, path: &TreePath, tags: &[&str]) -> Option<N::Node>
where
    N: Navigate + ?Sized,
{
    let mut current = start;
    for segment in path.iter() {
        current = step(nav, &current, segment, tags)?;
    }
    Some(current)
}

fn step<N>(nav: &N, current: &N::Node, segment: &str, tags: &[&str]) -> Option<N::Node>
where
    N: Navigate + ?Sized,
{
    if nav.is_list(current) {
        let index = segment.parse::<usize>().ok()?;
        return nav.child_at(current, index);
    }
    tags.iter()
        .filter(|tag| !tag.is_empty())
        .find_map(|tag| nav.child_named(current, &tagged_name(segment, tag)))
        .or_else(|| nav.child_named(current, segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::marker::PhantomData;

    #[derive(Debug, PartialEq)]
    enum Toy {
        Map(BTreeMap<&'static str, Toy>),
        List(Vec<Toy>),
        Leaf(i32),
    }

    struct ToyNav<'t>(PhantomData<&'t Toy>);

    impl<'t> Navigate for ToyNav<'t> {
        type Node = &'t Toy;

        fn is_list(&self, node: &Self::Node) -> bool {
            matches!(*node, Toy::List(_))
        }

        fn child_at(&self, node: &Self::Node, index: usize) -> Option<Self::Node> {
            match *node {
                Toy::List(items) => items.get(index),
                _ => None,
            }
        }

        fn child_named(&self, node: &Self::Node, name: &str) -> Option<Self::Node> {
            match *node {
                Toy::Map(entries) => entries.get(name),
                _ => None,
            }
        }
    }

    fn sample() -> Toy {
        let mut a = BTreeMap::new();
        a.insert("b", Toy::Leaf(1));
        a.insert("b@prod", Toy::Leaf(2));
        a.insert("b@test", Toy::Leaf(3));
        a.insert("list", Toy::List(vec![Toy::Leaf(10), Toy::Leaf(11)]));
        let mut root = BTreeMap::new();
        root.insert("a", Toy::Map(a));
        Toy::Map(root)
    }

    fn find<'t>(tree: &'t Toy, path: &str, tags: &[&str]) -> Option<&'t Toy> {
        resolve(&ToyNav(PhantomData), tree, &TreePath::from_dotted(path), tags)
    }

    #[test]
    fn test_tag_precedence() {
        let tree = sample();
        assert_eq!(find(&tree, "a.b", &["prod"]), Some(&Toy::Leaf(2)));
        assert_eq!(find(&tree, "a.b", &["test", "prod"]), Some(&Toy::Leaf(3)));
        assert_eq!(find(&tree, "a.b", &["prod", "test"]), Some(&Toy::Leaf(2)));
        assert_eq!(find(&tree, "a.b", &["dev"]), Some(&Toy::Leaf(1)));
        assert_eq!(find(&tree, "a.b", &[]), Some(&Toy::Leaf(1)));
        assert_eq!(find(&tree, "a.c", &[]), None);
    }

    #[test]
    fn test_empty_path_is_identity() {
        let tree = sample();
        assert_eq!(find(&tree, "", &["prod"]), Some(&tree));
    }

    #[test]
    fn test_list_segments_must_be_indices() {
        let tree = sample();
        assert_eq!(find(&tree, "a.list.1", &[]), Some(&Toy::Leaf(11)));
        assert_eq!(find(&tree, "a.list.2", &[]), None);
        assert_eq!(find(&tree, "a.list.first", &[]), None);
    }

    #[test]
    fn test_empty_tags_are_skipped() {
        let tree = sample();
        assert_eq!(find(&tree, "a.b", &["", "prod"]), Some(&Toy::Leaf(2)));
    }
}
