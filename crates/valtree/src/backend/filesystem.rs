//! Value trees over a directory hierarchy.
//!
//! Directories are composite nodes whose children are their entries,
//! ordered by file name. Files hold their contents as bytes: `u8` and
//! `char` fetches read the file starting at the offset, while other types
//! parse the first whitespace-delimited token of the file.
//!
//! The tree is live: every query goes to the filesystem, and failures are
//! logged at debug level and reported as empty results.

use super::{Backend, make_compound};
use crate::compound::Compound;
use crate::error::{Error, Result};
use crate::kind::ValueKind;
use crate::values::{ValueSpan, copy_chars};
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Longest token read for typed (non-byte) values.
const MAX_TOKEN_LEN: u64 = 64;

#[derive(Debug, Clone)]
pub struct FsNode {
    /// Path as navigated, below the root path given by the caller.
    pub path: PathBuf,
    /// Canonical path with symbolic links resolved.
    pub real_path: PathBuf,
}

impl PartialEq for FsNode {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl FsNode {
    fn new(path: PathBuf) -> Self {
        let real_path = fs::canonicalize(&path).unwrap_or_else(|error| {
            tracing::debug!(path = %path.display(), %error, "cannot canonicalize path");
            path.clone()
        });
        FsNode { path, real_path }
    }
}

pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FilesystemBackend { root: root.into() }
    }

    fn entries(&self, node: &FsNode) -> Vec<PathBuf> {
        let reader = match fs::read_dir(&node.path) {
            Ok(reader) => reader,
            Err(error) => {
                tracing::debug!(path = %node.path.display(), %error, "cannot list directory");
                return Vec::new();
            }
        };
        let mut entries: Vec<PathBuf> = reader
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(error) => {
                    tracing::debug!(path = %node.path.display(), %error, "cannot read directory entry");
                    None
                }
            })
            .collect();
        entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        entries
    }

    fn read_at(&self, node: &FsNode, offset: u64, limit: u64) -> Option<Vec<u8>> {
        let result = fs::File::open(&node.real_path).and_then(|mut file| {
            file.seek(SeekFrom::Start(offset))?;
            let mut data = Vec::new();
            file.take(limit).read_to_end(&mut data)?;
            Ok(data)
        });
        match result {
            Ok(data) => Some(data),
            Err(error) => {
                tracing::debug!(path = %node.real_path.display(), %error, "cannot read file");
                None
            }
        }
    }
}

impl Backend for FilesystemBackend {
    type Node = FsNode;

    fn type_id(&self) -> &'static str {
        "filesystem"
    }

    fn root(&self) -> FsNode {
        FsNode::new(self.root.clone())
    }

    fn name(&self, node: &FsNode) -> Option<String> {
        node.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn preview(&self, node: &FsNode) -> Option<String> {
        Some(node.real_path.display().to_string())
    }

    fn canonical_type(&self, _node: &FsNode) -> ValueKind {
        ValueKind::Byte
    }

    fn is_immutable(&self, _node: &FsNode) -> bool {
        false
    }

    fn is_link(&self, node: &FsNode) -> bool {
        node.path.is_symlink()
    }

    fn is_list(&self, _node: &FsNode) -> bool {
        false
    }

    fn nested_count(&self, node: &FsNode) -> usize {
        if node.path.is_dir() {
            self.entries(node).len()
        } else {
            0
        }
    }

    fn nested_at(&self, node: &FsNode, index: usize) -> Option<FsNode> {
        if !node.path.is_dir() {
            return None;
        }
        self.entries(node).into_iter().nth(index).map(FsNode::new)
    }

    fn nested_named(&self, node: &FsNode, name: &str) -> Option<FsNode> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return None;
        }
        let path = node.path.join(name);
        fs::symlink_metadata(&path).ok()?;
        Some(FsNode::new(path))
    }

    fn value_count(&self, node: &FsNode) -> usize {
        match fs::metadata(&node.real_path) {
            Ok(metadata) if metadata.is_file() => {
                usize::try_from(metadata.len()).unwrap_or(usize::MAX)
            }
            Ok(_) => 0,
            Err(error) => {
                tracing::debug!(path = %node.real_path.display(), %error, "cannot stat file");
                0
            }
        }
    }

    fn fetch_values(&self, node: &FsNode, offset: usize, mut dest: ValueSpan<'_>) -> usize {
        if dest.is_empty() || !node.real_path.is_file() {
            return 0;
        }
        let offset = offset as u64;
        match dest {
            ValueSpan::Byte(bytes) => {
                let Some(data) = self.read_at(node, offset, bytes.len() as u64) else {
                    return 0;
                };
                bytes[..data.len()].copy_from_slice(&data);
                data.len()
            }
            ValueSpan::Char(chars) => {
                let limit = (chars.len() as u64).saturating_mul(4);
                let Some(data) = self.read_at(node, offset, limit) else {
                    return 0;
                };
                copy_chars(&String::from_utf8_lossy(&data), 0, chars)
            }
            _ if dest.len() == 1 && offset == 0 => {
                let Some(data) = self.read_at(node, 0, MAX_TOKEN_LEN) else {
                    return 0;
                };
                let text = String::from_utf8_lossy(&data);
                match text.split_whitespace().next() {
                    Some(token) => usize::from(dest.set_text(0, token)),
                    None => 0,
                }
            }
            _ => 0,
        }
    }
}

/// Like [`from_filesystem_path`], but fails when `root` cannot be accessed.
pub fn open(root: impl AsRef<Path>) -> Result<Compound> {
    let root = root.as_ref();
    fs::metadata(root).map_err(|source| Error::Io {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(make_compound(FilesystemBackend::new(root)))
}

/// A live view of the directory tree rooted at `root`.
pub fn from_filesystem_path(root: impl AsRef<Path>) -> Compound {
    let root = root.as_ref();
    if fs::symlink_metadata(root).is_err() {
        tracing::debug!(path = %root.display(), "filesystem root does not exist");
    }
    make_compound(FilesystemBackend::new(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::TreePath;

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("server")).unwrap();
        fs::write(dir.path().join("server/port"), "8080\n").unwrap();
        fs::write(dir.path().join("server/port@prod"), "80\n").unwrap();
        fs::write(dir.path().join("server/name"), "alpha beta").unwrap();
        fs::write(dir.path().join("motd"), "hello, world").unwrap();
        dir
    }

    #[test]
    fn test_directory_structure() {
        let dir = sample_tree();
        let tree = from_filesystem_path(dir.path());
        let root = tree.structure();
        assert_eq!(root.nested_count(), 2);
        let names: Vec<String> = root.children().filter_map(|child| child.name()).collect();
        assert_eq!(names, vec!["motd", "server"]);
        assert_eq!(root.canonical_type(), ValueKind::Byte);
        assert!(!root.is_immutable());
    }

    #[test]
    fn test_typed_values_parse_first_token() {
        let dir = sample_tree();
        let tree = from_filesystem_path(dir.path());
        assert_eq!(tree.get::<u16>("server.port", &[]), Some(8080));
        assert_eq!(tree.get::<u16>("server.port", &["prod"]), Some(80));
        assert_eq!(tree.get::<String>("server.name", &[]).as_deref(), Some("alpha"));
        let port = tree.find_path(&TreePath::from_dotted("server.port"), &[]).unwrap();
        let mut two = [0u16; 2];
        assert_eq!(port.fetch_values(0, &mut two), 0);
    }

    #[test]
    fn test_bytes_and_chars_from_offset() {
        let dir = sample_tree();
        let tree = from_filesystem_path(dir.path());
        let motd = tree.nested_in_root("motd").unwrap();
        assert_eq!(motd.value_count(), 12);
        let mut bytes = [0u8; 5];
        assert_eq!(motd.fetch_values(7, &mut bytes), 5);
        assert_eq!(&bytes, b"world");
        assert_eq!(motd.fetch_values(10, &mut bytes), 2);
        assert_eq!(motd.fetch_values(20, &mut bytes), 0);
        assert_eq!(motd.get_string().as_deref(), Some("hello, world"));
        assert_eq!(motd.fetch_blob(), b"hello, world".to_vec());
    }

    #[test]
    fn test_missing_entries() {
        let dir = sample_tree();
        let tree = from_filesystem_path(dir.path());
        assert!(tree.nested_in_root("absent").is_none());
        assert!(tree.nested_in_root("..").is_none());
        assert!(tree.find_path(&TreePath::from_dotted("server.port.x"), &[]).is_none());
        let missing = from_filesystem_path(dir.path().join("nope"));
        assert_eq!(missing.structure().nested_count(), 0);
    }

    #[test]
    fn test_open_requires_existing_root() {
        let dir = sample_tree();
        let tree = open(dir.path()).unwrap();
        assert_eq!(tree.get::<u16>("server.port", &[]), Some(8080));

        let missing = dir.path().join("nope");
        match open(&missing) {
            Err(Error::Io { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected an I/O error, got {:?}", other.map(|_| ())),
        }
    }
}
