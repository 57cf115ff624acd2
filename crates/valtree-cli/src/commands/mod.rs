//! Command implementations for the valtree CLI
//!
//! Each command writes its result to the given output so that it can be
//! checked in tests.

use std::path::Path;

use anyhow::{Context, Result};
use valtree::Compound;

pub mod config;
pub mod find;
pub mod print;
pub mod tree;

/// Document formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        match path.extension()?.to_str()? {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Open `path` as a value tree: documents by their extension, anything
/// else as a filesystem tree.
pub fn open_tree(path: &Path) -> Result<Compound> {
    let format = match Format::from_path(path) {
        Some(format) if !path.is_dir() => format,
        _ => return Ok(valtree::filesystem::open(path)?),
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let tree = match format {
        Format::Json => valtree::json::parse(&text),
        Format::Yaml => valtree::yaml::parse(&text),
    };
    tree.with_context(|| format!("failed to parse {}", path.display()))
}
