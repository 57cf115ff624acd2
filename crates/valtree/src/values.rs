//! Typed value transfer in both directions.
//!
//! [`ValueSpan`] is the destination of `fetch_values`: a mutable slice of
//! one of the supported element types. [`Values`] is the payload of
//! visitor `consume` and builder `add` calls: an immutable slice of one
//! primitive kind.

use crate::convert::FromText;
use std::fmt;
use std::time::Duration;

/// A destination buffer for fetched values.
#[derive(Debug)]
pub enum ValueSpan<'a> {
    Bool(&'a mut [bool]),
    Tribool(&'a mut [Option<bool>]),
    Char(&'a mut [char]),
    Byte(&'a mut [u8]),
    I16(&'a mut [i16]),
    I32(&'a mut [i32]),
    I64(&'a mut [i64]),
    U16(&'a mut [u16]),
    U32(&'a mut [u32]),
    U64(&'a mut [u64]),
    Float(&'a mut [f32]),
    Duration(&'a mut [Duration]),
    String(&'a mut [String]),
}

macro_rules! each_span {
    ($span:expr, $slice:ident => $body:expr) => {
        match $span {
            ValueSpan::Bool($slice) => $body,
            ValueSpan::Tribool($slice) => $body,
            ValueSpan::Char($slice) => $body,
            ValueSpan::Byte($slice) => $body,
            ValueSpan::I16($slice) => $body,
            ValueSpan::I32($slice) => $body,
            ValueSpan::I64($slice) => $body,
            ValueSpan::U16($slice) => $body,
            ValueSpan::U32($slice) => $body,
            ValueSpan::U64($slice) => $body,
            ValueSpan::Float($slice) => $body,
            ValueSpan::Duration($slice) => $body,
            ValueSpan::String($slice) => $body,
        }
    };
}

impl ValueSpan<'_> {
    pub fn len(&self) -> usize {
        each_span!(self, slice => slice.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store the value read from `text` at `index`. Returns `false` if the
    /// index is out of bounds or the text does not convert.
    pub fn set_text(&mut self, index: usize, text: &str) -> bool {
        each_span!(self, slice => store(&mut **slice, index, FromText::from_text(text)))
    }

    /// Convert `items` one by one into the span, stopping at the first item
    /// that does not convert or when the span is full. Returns the number of
    /// stored values.
    pub fn fill_from_text<S: AsRef<str>>(&mut self, items: impl IntoIterator<Item = S>) -> usize {
        let mut written = 0;
        for text in items {
            if written >= self.len() || !self.set_text(written, text.as_ref()) {
                break;
            }
            written += 1;
        }
        written
    }
}

pub(crate) fn store<T>(slice: &mut [T], index: usize, value: Option<T>) -> bool {
    match (slice.get_mut(index), value) {
        (Some(slot), Some(value)) => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// Copy the characters of `text` starting at character `offset`.
pub(crate) fn copy_chars(text: &str, offset: usize, dest: &mut [char]) -> usize {
    let mut written = 0;
    for (slot, c) in dest.iter_mut().zip(text.chars().skip(offset)) {
        *slot = c;
        written += 1;
    }
    written
}

/// Copy the bytes of `data` starting at `offset`.
pub(crate) fn copy_bytes(data: &[u8], offset: usize, dest: &mut [u8]) -> usize {
    let source = data.get(offset..).unwrap_or_default();
    let count = source.len().min(dest.len());
    dest[..count].copy_from_slice(&source[..count]);
    count
}

mod sealed {
    pub trait Sealed {}
}

/// Element types accepted by `fetch_values`.
pub trait FetchValue: sealed::Sealed + Default + Sized {
    fn span(dest: &mut [Self]) -> ValueSpan<'_>;
}

macro_rules! fetch_value_types {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl FetchValue for $ty {
                fn span(dest: &mut [Self]) -> ValueSpan<'_> {
                    ValueSpan::$variant(dest)
                }
            }
        )*
    };
}

fetch_value_types!(
    bool => Bool,
    Option<bool> => Tribool,
    char => Char,
    u8 => Byte,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => Float,
    Duration => Duration,
    String => String,
);

/// A run of primitive values handed to visitors and builders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Values<'a> {
    /// `n` null values
    Nil(usize),
    Bool(&'a [bool]),
    Int(&'a [i64]),
    UInt(&'a [u64]),
    Float(&'a [f32]),
    Double(&'a [f64]),
    Str(&'a [&'a str]),
}

impl Values<'_> {
    pub fn len(&self) -> usize {
        match self {
            Values::Nil(count) => *count,
            Values::Bool(values) => values.len(),
            Values::Int(values) => values.len(),
            Values::UInt(values) => values.len(),
            Values::Float(values) => values.len(),
            Values::Double(values) => values.len(),
            Values::Str(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Values::Nil(_) => "nil",
            Values::Bool(_) => "bool",
            Values::Int(_) => "int",
            Values::UInt(_) => "uint",
            Values::Float(_) => "float",
            Values::Double(_) => "double",
            Values::Str(_) => "string",
        }
    }

    /// Textual form of the value at `index`.
    pub fn text_at(&self, index: usize) -> Option<String> {
        match self {
            Values::Nil(count) => (index < *count).then(|| "null".to_string()),
            Values::Bool(values) => values.get(index).map(ToString::to_string),
            Values::Int(values) => values.get(index).map(ToString::to_string),
            Values::UInt(values) => values.get(index).map(ToString::to_string),
            Values::Float(values) => values.get(index).map(ToString::to_string),
            Values::Double(values) => values.get(index).map(ToString::to_string),
            Values::Str(values) => values.get(index).map(|s| (*s).to_string()),
        }
    }
}

impl fmt::Display for Values<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.len() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match self {
                Values::Str(values) => write!(f, "{:?}", values[index])?,
                other => f.write_str(&other.text_at(index).unwrap_or_default())?,
            }
        }
        Ok(())
    }
}
