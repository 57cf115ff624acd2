//! Value trees over parsed YAML documents.
//!
//! The document is loaded with `yaml-rust2` once and kept in memory. A
//! node is the list of child indices leading to it from the document root,
//! so equal locations intern to the same attribute. YAML scalars are text:
//! they report [`ValueKind::String`] and convert on fetch.

use super::{Backend, make_compound};
use crate::compound::Compound;
use crate::error::Result;
use crate::kind::ValueKind;
use crate::values::{ValueSpan, copy_chars};
use std::borrow::Cow;
use yaml_rust2::{Yaml, YamlLoader};

pub struct YamlBackend {
    document: Yaml,
}

impl YamlBackend {
    pub fn new(document: Yaml) -> Self {
        YamlBackend { document }
    }

    fn lookup(&self, node: &[usize]) -> Option<&Yaml> {
        node.iter()
            .try_fold(&self.document, |current, &index| entry_at(current, index).map(|(_, value)| value))
    }
}

fn entry_at(yaml: &Yaml, index: usize) -> Option<(Option<&Yaml>, &Yaml)> {
    match yaml {
        Yaml::Array(items) => items.get(index).map(|item| (None, item)),
        Yaml::Hash(entries) => entries.iter().nth(index).map(|(key, value)| (Some(key), value)),
        _ => None,
    }
}

/// Text of a scalar; `None` for containers and nulls.
fn scalar_text(yaml: &Yaml) -> Option<Cow<'_, str>> {
    match yaml {
        Yaml::String(text) | Yaml::Real(text) => Some(Cow::Borrowed(text)),
        Yaml::Integer(value) => Some(Cow::Owned(value.to_string())),
        Yaml::Boolean(value) => Some(Cow::Owned(value.to_string())),
        _ => None,
    }
}

impl Backend for YamlBackend {
    type Node = Vec<usize>;

    fn type_id(&self) -> &'static str {
        "yaml"
    }

    fn root(&self) -> Vec<usize> {
        Vec::new()
    }

    fn name(&self, node: &Vec<usize>) -> Option<String> {
        let (&last, parent) = node.split_last()?;
        let (key, _) = entry_at(self.lookup(parent)?, last)?;
        key.and_then(scalar_text).map(Cow::into_owned)
    }

    fn preview(&self, node: &Vec<usize>) -> Option<String> {
        self.lookup(node)
            .and_then(scalar_text)
            .map(Cow::into_owned)
    }

    fn canonical_type(&self, node: &Vec<usize>) -> ValueKind {
        match self.lookup(node) {
            Some(Yaml::Array(_) | Yaml::Hash(_)) => ValueKind::Composite,
            Some(Yaml::String(_) | Yaml::Real(_) | Yaml::Integer(_) | Yaml::Boolean(_)) => {
                ValueKind::String
            }
            _ => ValueKind::Unknown,
        }
    }

    fn is_list(&self, node: &Vec<usize>) -> bool {
        matches!(self.lookup(node), Some(Yaml::Array(_)))
    }

    fn nested_count(&self, node: &Vec<usize>) -> usize {
        match self.lookup(node) {
            Some(Yaml::Array(items)) => items.len(),
            Some(Yaml::Hash(entries)) => entries.len(),
            _ => 0,
        }
    }

    fn nested_at(&self, node: &Vec<usize>, index: usize) -> Option<Vec<usize>> {
        (index < self.nested_count(node)).then(|| {
            let mut child = node.clone();
            child.push(index);
            child
        })
    }

    fn nested_named(&self, node: &Vec<usize>, name: &str) -> Option<Vec<usize>> {
        let index = match self.lookup(node)? {
            Yaml::Hash(entries) => entries
                .keys()
                .position(|key| scalar_text(key).is_some_and(|key| key == name))?,
            Yaml::Array(_) => name.parse().ok()?,
            _ => return None,
        };
        self.nested_at(node, index)
    }

    fn value_count(&self, node: &Vec<usize>) -> usize {
        match self.lookup(node) {
            Some(Yaml::Array(items)) => items.len(),
            Some(yaml) if scalar_text(yaml).is_some() => 1,
            _ => 0,
        }
    }

    fn fetch_values(&self, node: &Vec<usize>, offset: usize, mut dest: ValueSpan<'_>) -> usize {
        let Some(yaml) = self.lookup(node) else {
            return 0;
        };
        if let Yaml::Array(items) = yaml {
            return dest.fill_from_text(items.iter().skip(offset).map_while(scalar_text));
        }
        let Some(text) = scalar_text(yaml) else {
            return 0;
        };
        match dest {
            ValueSpan::Char(chars) => copy_chars(&text, offset, chars),
            mut other if offset == 0 => usize::from(other.set_text(0, &text)),
            _ => 0,
        }
    }
}

/// Parse YAML text into a compound.
///
/// Only the first document is used. Text without any document yields a
/// tree with a bare root.
pub fn parse(text: &str) -> Result<Compound> {
    let mut documents = YamlLoader::load_from_str(text)?;
    let document = if documents.is_empty() {
        Yaml::Null
    } else {
        documents.swap_remove(0)
    };
    Ok(make_compound(YamlBackend::new(document)))
}

/// Parse YAML text into a compound, logging parse errors and falling back
/// to the empty tree.
pub fn from_yaml_text(text: &str) -> Compound {
    parse(text).unwrap_or_else(|error| {
        tracing::error!(%error, "failed to parse YAML value tree");
        super::empty::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::TreePath;
    use std::time::Duration;

    const SAMPLE: &str = r#"
name: sample
version: 3
enabled: yes
timeout: 250ms
ports: [80, 443, 8080]
a:
  b: 1
  b@prod: 2
mixed: [1, two, 3]
"#;

    fn find(tree: &Compound, key: &str, tags: &[&str]) -> Option<crate::Attribute> {
        tree.find_path(&TreePath::from_dotted(key), tags)
    }

    #[test]
    fn test_scalars_are_text() {
        let tree = from_yaml_text(SAMPLE);
        let version = find(&tree, "version", &[]).unwrap();
        assert_eq!(version.canonical_type(), ValueKind::String);
        assert_eq!(version.get::<i32>(), Some(3));
        assert_eq!(version.get::<String>().as_deref(), Some("3"));
        assert_eq!(tree.get::<bool>("enabled", &[]), Some(true));
        assert_eq!(
            tree.get::<Duration>("timeout", &[]),
            Some(Duration::from_millis(250))
        );
        assert_eq!(version.name().as_deref(), Some("version"));
    }

    #[test]
    fn test_sequence_values() {
        let tree = from_yaml_text(SAMPLE);
        let ports = find(&tree, "ports", &[]).unwrap();
        assert!(ports.is_list());
        assert_eq!(ports.value_count(), 3);
        let mut dest = [0u16; 5];
        assert_eq!(ports.fetch_values(1, &mut dest), 2);
        assert_eq!(&dest[..2], &[443, 8080]);
        assert_eq!(find(&tree, "ports.2", &[]).unwrap().get::<u16>(), Some(8080));
    }

    #[test]
    fn test_sequence_conversion_stops_at_mismatch() {
        let tree = from_yaml_text(SAMPLE);
        let mixed = find(&tree, "mixed", &[]).unwrap();
        let mut dest = [0i64; 3];
        assert_eq!(mixed.fetch_values(0, &mut dest), 1);
        let mut names = vec![String::new(); 3];
        assert_eq!(mixed.fetch_values(0, &mut names), 3);
        assert_eq!(names[1], "two");
    }

    #[test]
    fn test_char_fetch_uses_offset() {
        let tree = from_yaml_text(SAMPLE);
        let name = find(&tree, "name", &[]).unwrap();
        let mut chars = ['\0'; 10];
        assert_eq!(name.fetch_values(2, &mut chars), 4);
        assert_eq!(&chars[..4], &['m', 'p', 'l', 'e']);
    }

    #[test]
    fn test_tagged_variants() {
        let tree = from_yaml_text(SAMPLE);
        assert_eq!(tree.get::<i32>("a.b", &["prod"]), Some(2));
        assert_eq!(tree.get::<i32>("a.b", &[]), Some(1));
        assert!(find(&tree, "a.c", &[]).is_none());
    }

    #[test]
    fn test_parse_error_yields_empty_tree() {
        assert!(parse("a: [1, 2").is_err());
        let tree = from_yaml_text("a: [1, 2");
        assert_eq!(tree.type_id(), "empty");
        assert_eq!(tree.structure().nested_count(), 0);
    }

    #[test]
    fn test_empty_text_is_bare_root() {
        let tree = from_yaml_text("");
        assert_eq!(tree.type_id(), "yaml");
        assert_eq!(tree.structure().nested_count(), 0);
        assert_eq!(tree.structure().value_count(), 0);
    }
}
