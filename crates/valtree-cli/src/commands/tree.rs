//! Tree command implementation

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use super::open_tree;

/// Print the path and canonical type of every attribute below the root.
pub fn execute<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let tree = open_tree(path)?;
    let mut result = Ok(());
    tree.traverse(|attribute, at| {
        if at.is_empty() {
            return true;
        }
        let line = if attribute.is_link() {
            writeln!(out, "{at}: {} (link)", attribute.canonical_type())
        } else {
            writeln!(out, "{at}: {}", attribute.canonical_type())
        };
        match line {
            Ok(()) => true,
            Err(error) => {
                result = Err(error);
                false
            }
        }
    });
    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree(path: &Path) -> String {
        let mut out = Vec::new();
        execute(path, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_tree_of_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.yaml");
        fs::write(&file, "server:\n  port: 80\n  hosts:\n    - a\n    - b\nname: demo\n").unwrap();

        insta::assert_snapshot!(tree(&file).trim_end(), @r"
        server: composite
        server.port: string
        server.hosts: composite
        server.hosts.0: string
        server.hosts.1: string
        name: string
        ");
    }

    #[test]
    fn test_tree_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("db")).unwrap();
        fs::write(dir.path().join("db").join("user"), "app").unwrap();
        fs::write(dir.path().join("db").join("password"), "secret").unwrap();

        insta::assert_snapshot!(tree(dir.path()).trim_end(), @r"
        db: byte
        db.password: byte
        db.user: byte
        ");
    }
}
