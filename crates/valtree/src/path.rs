//! Paths addressing nodes inside a value tree.
//!
//! A [`TreePath`] is an ordered list of segments. Its textual form joins the
//! segments with `.`, which is how configuration keys are written:
//!
//! ```rust
//! use valtree::TreePath;
//!
//! let path = TreePath::from_dotted("server.listen.port");
//! assert_eq!(path.len(), 3);
//! assert_eq!(path.to_string(), "server.listen.port");
//! assert!(path.like(&["server", "_", "port"]));
//! ```

use std::fmt;

/// Segment matching any single segment in [`TreePath::like`].
pub const WILDCARD: &str = "_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreePath {
    segments: Vec<String>,
}

impl TreePath {
    /// The empty path, denoting the starting node itself.
    pub fn new() -> Self {
        TreePath {
            segments: Vec::new(),
        }
    }

    /// Split a dotted key into segments. The empty string is the empty path.
    pub fn from_dotted(text: &str) -> Self {
        if text.is_empty() {
            return TreePath::new();
        }
        TreePath {
            segments: text.split('.').map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// A new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> TreePath {
        let mut result = self.clone();
        result.push(segment);
        result
    }

    /// The path without its last segment, `None` for the empty path.
    pub fn parent(&self) -> Option<TreePath> {
        let (_, rest) = self.segments.split_last()?;
        Some(TreePath {
            segments: rest.to_vec(),
        })
    }

    pub fn starts_with(&self, prefix: &TreePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Match against a pattern of the same length, where [`WILDCARD`]
    /// matches any segment.
    pub fn like(&self, pattern: &[&str]) -> bool {
        self.segments.len() == pattern.len()
            && self
                .segments
                .iter()
                .zip(pattern)
                .all(|(segment, expected)| *expected == WILDCARD || segment == expected)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for TreePath {
    fn from(text: &str) -> Self {
        TreePath::from_dotted(text)
    }
}

impl<S: Into<String>> FromIterator<S> for TreePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TreePath {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_empty_path() {
        let path = TreePath::from_dotted("");
        assert!(path.is_empty());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn test_push_pop_and_display() {
        let mut path = TreePath::new();
        path.push("a");
        path.push("0");
        assert_eq!(path.to_string(), "a.0");
        assert_eq!(path.pop().as_deref(), Some("0"));
        assert_eq!(path, TreePath::from_dotted("a"));
    }

    #[test]
    fn test_like_with_wildcard() {
        let path = TreePath::from_dotted("base.b.y");
        assert!(path.like(&["base", "_", "y"]));
        assert!(path.like(&["_", "_", "_"]));
        assert!(!path.like(&["base", "_"]));
        assert!(!path.like(&["apex", "_", "y"]));
    }

    #[test]
    fn test_parent_and_prefix() {
        let path: TreePath = ["a", "b", "c"].into_iter().collect();
        assert_eq!(path.parent(), Some(TreePath::from_dotted("a.b")));
        assert!(path.starts_with(&TreePath::from_dotted("a")));
        assert!(!path.starts_with(&TreePath::from_dotted("b")));
        assert_eq!(TreePath::new().parent(), None);
    }
}
