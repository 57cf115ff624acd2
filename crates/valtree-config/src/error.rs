//! Error types for configuration lookups.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrigin {
    Argument,
    Environment,
}

impl std::fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValueOrigin::Argument => "command line argument",
            ValueOrigin::Environment => "environment variable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A textual value that does not convert to the requested type
    #[error("cannot convert {origin} value {value:?} for '{key}'")]
    Convert {
        key: String,
        origin: ValueOrigin,
        value: String,
    },

    /// A tree value that does not convert to the requested type
    #[error("configuration value for '{key}' has the wrong type")]
    Fetch { key: String },

    /// An argument given without the value it needs
    #[error("missing value after '{arg}'")]
    MissingArgument { arg: String },
}
