//! Find command implementation

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use valtree::{Attribute, TreePath, ValueKind};

use super::open_tree;

/// Resolve `key` in the tree at `path` and print its values, one per line.
///
/// Nodes without values print the names of their children instead.
pub fn execute<W: Write>(path: &Path, key: &str, tags: &[String], out: &mut W) -> Result<()> {
    let tree = open_tree(path)?;
    let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
    let Some(attribute) = tree.find_path(&TreePath::from_dotted(key), &tags) else {
        anyhow::bail!("no value at '{key}' in {}", path.display());
    };

    let values = value_strings(&attribute);
    if values.is_empty() {
        for child in attribute.children() {
            writeln!(out, "{}", child.name().unwrap_or_default())?;
        }
    } else {
        for value in values {
            writeln!(out, "{value}")?;
        }
    }
    Ok(())
}

/// Every value of `attribute` as text. Files are read as a whole, without
/// their final newline. Values that do not convert to strings, such as JSON
/// numbers, print their preview.
pub fn value_strings(attribute: &Attribute) -> Vec<String> {
    if attribute.canonical_type() == ValueKind::Byte {
        return attribute
            .get_string()
            .map(|text| text.trim_end_matches('\n').to_string())
            .into_iter()
            .collect();
    }
    let strings = attribute.get_all::<String>();
    if strings.len() == attribute.value_count() {
        strings
    } else if attribute.is_list() {
        attribute
            .children()
            .filter_map(|item| item.preview())
            .collect()
    } else {
        attribute.preview().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn find(path: &Path, key: &str, tags: &[&str]) -> Result<String> {
        let tags: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
        let mut out = Vec::new();
        execute(path, key, &tags, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_find_with_tags() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.yaml");
        fs::write(&file, "server:\n  port: 80\n  port@prod: 443\n  hosts: [a, b]\n").unwrap();

        assert_eq!(find(&file, "server.port", &[]).unwrap(), "80\n");
        assert_eq!(find(&file, "server.port", &["prod"]).unwrap(), "443\n");
        assert_eq!(find(&file, "server.hosts", &[]).unwrap(), "a\nb\n");
        assert_eq!(find(&file, "server", &[]).unwrap(), "port\nport@prod\nhosts\n");
    }

    #[test]
    fn test_find_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("db")).unwrap();
        fs::write(dir.path().join("db").join("url"), "postgres://localhost/app\n").unwrap();

        assert_eq!(
            find(dir.path(), "db.url", &[]).unwrap(),
            "postgres://localhost/app\n"
        );
    }

    #[test]
    fn test_find_json_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.json");
        fs::write(
            &file,
            r#"{"port": 8080, "debug": false, "mixed": [1, "two", null], "name": "web"}"#,
        )
        .unwrap();

        assert_eq!(find(&file, "port", &[]).unwrap(), "8080\n");
        assert_eq!(find(&file, "debug", &[]).unwrap(), "false\n");
        assert_eq!(find(&file, "mixed", &[]).unwrap(), "1\ntwo\nnull\n");
        assert_eq!(find(&file, "name", &[]).unwrap(), "web\n");
    }

    #[test]
    fn test_find_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.json");
        fs::write(&file, r#"{"a": 1}"#).unwrap();

        let error = find(&file, "b", &[]).unwrap_err();
        assert!(error.to_string().starts_with("no value at 'b'"));
    }

    #[test]
    fn test_find_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let error = find(&dir.path().join("missing"), "a", &[]).unwrap_err();
        assert!(error.to_string().starts_with("cannot access"));
    }
}
