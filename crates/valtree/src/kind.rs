//! Canonical value kinds reported by attributes.

use std::fmt;

/// The kind of value an attribute stores natively.
///
/// Values can usually be fetched as other, related types too; the canonical
/// kind only says which one needs no conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    #[default]
    Unknown,
    Bool,
    Byte,
    Int16,
    Int32,
    Int64,
    Float,
    Duration,
    String,
    /// A node made of nested attributes rather than values.
    Composite,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Unknown => "unknown",
            ValueKind::Bool => "bool",
            ValueKind::Byte => "byte",
            ValueKind::Int16 => "int16",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Float => "float",
            ValueKind::Duration => "duration",
            ValueKind::String => "string",
            ValueKind::Composite => "composite",
        }
    }

    /// Whether values of this kind can be fetched directly.
    pub fn is_scalar(self) -> bool {
        !matches!(self, ValueKind::Unknown | ValueKind::Composite)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
