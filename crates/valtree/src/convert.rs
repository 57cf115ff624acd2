//! Text to value conversions shared by the backends.
//!
//! Text-based trees (YAML, files on disk, strings inside JSON) store every
//! value as text; these functions decide how that text reads as a typed
//! value. A conversion that does not apply yields `None`, never an error.

use std::time::Duration;

const TRUE_WORDS: &[&str] = &["true", "True", "TRUE", "1", "t", "T", "yes", "on"];
const FALSE_WORDS: &[&str] = &["false", "False", "FALSE", "0", "f", "F", "no", "off"];
const INDETERMINATE_WORDS: &[&str] = &["indeterminate", "null", "~"];

const NANOS_PER_SEC: f64 = 1e9;

/// Duration suffixes and their length in nanoseconds, tried in this order.
const DURATION_UNITS: &[(&str, f64)] = &[
    ("s", NANOS_PER_SEC),
    ("ms", 1e6),
    ("us", 1e3),
    ("μs", 1e3),
    ("ns", 1.0),
    ("min", 60.0 * NANOS_PER_SEC),
    ("hr", 3_600.0 * NANOS_PER_SEC),
    ("dy", 86_400.0 * NANOS_PER_SEC),
    ("yr", 31_556_952.0 * NANOS_PER_SEC),
    ("a", 31_556_952.0 * NANOS_PER_SEC),
];

pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if TRUE_WORDS.contains(&text) {
        Some(true)
    } else if FALSE_WORDS.contains(&text) {
        Some(false)
    } else {
        None
    }
}

/// Like [`parse_bool`], with an explicit "unknown" state as `Some(None)`.
pub fn parse_tribool(text: &str) -> Option<Option<bool>> {
    if INDETERMINATE_WORDS.contains(&text.trim()) {
        return Some(None);
    }
    parse_bool(text).map(Some)
}

/// Parse `"1.5s"`, `"250ms"`, `"2min"` and friends. A bare number counts
/// as seconds.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    for (suffix, nanos) in DURATION_UNITS {
        if let Some(count) = text.strip_suffix(suffix) {
            if let Ok(count) = count.trim_end().parse::<f64>() {
                return duration_from_nanos(count * nanos);
            }
        }
    }
    text.parse::<f64>()
        .ok()
        .and_then(|seconds| duration_from_nanos(seconds * NANOS_PER_SEC))
}

/// Seconds as a duration, `None` for negative or non-finite input.
pub(crate) fn duration_from_secs(seconds: f64) -> Option<Duration> {
    duration_from_nanos(seconds * NANOS_PER_SEC)
}

fn duration_from_nanos(nanos: f64) -> Option<Duration> {
    if nanos.is_finite() && nanos >= 0.0 && nanos < u64::MAX as f64 {
        Some(Duration::from_nanos(nanos.round() as u64))
    } else {
        None
    }
}

/// Types that can be read from the textual form of a value, such as a
/// YAML scalar, a file, a command line argument or an environment variable.
pub trait FromText: Sized {
    fn from_text(text: &str) -> Option<Self>;
}

impl FromText for bool {
    fn from_text(text: &str) -> Option<Self> {
        parse_bool(text)
    }
}

impl FromText for Option<bool> {
    fn from_text(text: &str) -> Option<Self> {
        parse_tribool(text)
    }
}

impl FromText for char {
    fn from_text(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

macro_rules! from_text_via_parse {
    ($($ty:ty),*) => {
        $(
            impl FromText for $ty {
                fn from_text(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }
            }
        )*
    };
}

from_text_via_parse!(u8, i16, i32, i64, u16, u32, u64, f32);

impl FromText for Duration {
    fn from_text(text: &str) -> Option<Self> {
        parse_duration(text)
    }
}

impl FromText for String {
    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_words() {
        for word in ["true", "True", "1", "t", "T"] {
            assert_eq!(parse_bool(word), Some(true), "{word}");
        }
        for word in ["false", "False", "0", "f", "F"] {
            assert_eq!(parse_bool(word), Some(false), "{word}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_tribool() {
        assert_eq!(parse_tribool("indeterminate"), Some(None));
        assert_eq!(parse_tribool("T"), Some(Some(true)));
        assert_eq!(parse_tribool("x"), None);
    }

    #[test]
    fn test_duration_suffixes() {
        assert_eq!(parse_duration("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("40ns"), Some(Duration::from_nanos(40)));
        assert_eq!(parse_duration("3min"), Some(Duration::from_secs(180)));
        assert_eq!(parse_duration("1hr"), Some(Duration::from_secs(3_600)));
        assert_eq!(parse_duration("2dy"), Some(Duration::from_secs(172_800)));
        assert_eq!(parse_duration("1.5"), Some(Duration::from_millis(1_500)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("-1s"), None);
    }

    #[test]
    fn test_from_text_numbers() {
        assert_eq!(i16::from_text(" 42 "), Some(42));
        assert_eq!(u8::from_text("300"), None);
        assert_eq!(f32::from_text("2.5"), Some(2.5));
        assert_eq!(char::from_text("x"), Some('x'));
        assert_eq!(char::from_text("xy"), None);
    }
}
