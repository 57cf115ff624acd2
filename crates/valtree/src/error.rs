//! Error types for building value trees from documents and streams.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for valtree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while opening a backend.
///
/// Lookups never fail with an error; these only surface from the fallible
/// constructors such as [`crate::yaml::parse`], [`crate::json::parse`] and
/// [`crate::filesystem::open`].
/// The infallible constructors log them and fall back to an empty tree.
#[derive(Debug, Error)]
pub enum Error {
    /// YAML syntax error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] yaml_rust2::ScanError),

    /// JSON syntax error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem root cannot be accessed
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the incremental JSON parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// A byte that cannot start or continue the current token
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    /// A token that is valid but not allowed at this point of the document
    #[error("unexpected {token} at offset {offset}")]
    UnexpectedToken { token: &'static str, offset: usize },

    /// Malformed escape sequence inside a string
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    /// Malformed number literal
    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    /// String content that is not UTF-8
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Input ended before the document was complete
    #[error("unexpected end of input")]
    UnexpectedEof,
}
