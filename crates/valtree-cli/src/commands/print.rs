//! Print command implementation

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use valtree::{StreamInput, make_printing_visitor, traverse_json_stream, traverse_yaml_stream};

use super::Format;

const CHUNK_SIZE: usize = 4096;
const MAX_TOKEN_SIZE: usize = 256;

/// Stream `file` through a printing visitor.
pub fn execute<W: Write>(file: &Path, out: &mut W) -> Result<()> {
    let format = Format::from_path(file)
        .with_context(|| format!("unsupported document type: {}", file.display()))?;
    let mut reader =
        File::open(file).with_context(|| format!("failed to open {}", file.display()))?;

    let visitor = make_printing_visitor(out);
    let mut input = match format {
        Format::Json => traverse_json_stream(visitor, MAX_TOKEN_SIZE),
        Format::Yaml => traverse_yaml_stream(visitor),
    };
    let bytes = feed(&mut reader, &mut input)
        .with_context(|| format!("failed to read {}", file.display()))?;
    debug!(file = %file.display(), bytes, "streamed document");

    if !input.finish() {
        anyhow::bail!("failed to parse {}", file.display());
    }
    Ok(())
}

/// Push everything `reader` yields into `input`, stopping early when the
/// parser stops accepting data. Returns the number of bytes read.
fn feed<R: Read>(reader: &mut R, input: &mut StreamInput<'_>) -> std::io::Result<usize> {
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total = 0;
    loop {
        let count = reader.read(&mut buffer)?;
        if count == 0 {
            return Ok(total);
        }
        total += count;
        if !input.consume_data(&buffer[..count]) {
            return Ok(total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn print(name: &str, content: &str) -> Result<String> {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(name);
        fs::write(&file, content).unwrap();
        let mut out = Vec::new();
        execute(&file, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_print_json() {
        let output = print("doc.json", r#"{"name": "box", "size": [2, 3]}"#).unwrap();
        insta::assert_snapshot!(output.trim_end(), @r#"
        begin
        {
          "name":
            string: "box"
          "size":
            [
              uint: 2
              uint: 3
            ]
        }
        finish
        "#);
    }

    #[test]
    fn test_print_yaml() {
        let output = print("doc.yml", "name: box\nempty:\n").unwrap();
        insta::assert_snapshot!(output.trim_end(), @r#"
        begin
        {
          "name":
            string: "box"
          "empty":
            nil: null
        }
        finish
        "#);
    }

    #[test]
    fn test_print_rejects_broken_document() {
        let error = print("doc.json", r#"{"name": }"#).unwrap_err();
        assert!(error.to_string().starts_with("failed to parse"));
    }

    #[test]
    fn test_print_rejects_unknown_extension() {
        let error = print("doc.toml", "a = 1").unwrap_err();
        assert!(error.to_string().starts_with("unsupported document type"));
    }

    #[test]
    fn test_feed_chunks() {
        let data = vec![b' '; CHUNK_SIZE * 2 + 10];
        let mut reader = &data[..];
        let mut out = Vec::new();
        let mut input = traverse_json_stream(make_printing_visitor(&mut out), 16);
        assert_eq!(feed(&mut reader, &mut input).unwrap(), data.len());
    }
}
