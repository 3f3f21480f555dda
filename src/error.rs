//! Error types for SetuRelay

use std::net::SocketAddr;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SetuRelay error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Listener failed to bind its address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address the listener tried to bind
        addr: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// Setting name not present in the descriptor table
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// Behavior name not present in the behavior set
    #[error("Unknown behavior: {0}")]
    UnknownBehavior(String),

    /// Value outside a descriptor's declared range
    #[error("Value {value} for {setting} outside [{min}, {max}]")]
    InvalidValue {
        /// Setting the value was meant for
        setting: &'static str,
        /// Rejected value
        value: i64,
        /// Lower bound (inclusive)
        min: i64,
        /// Upper bound (inclusive)
        max: i64,
    },

    /// Value not in an enumerated command's valid set
    #[error("Invalid {command} value: {value}")]
    InvalidChoice {
        /// Command the value was meant for
        command: &'static str,
        /// Rejected value
        value: u8,
    },

    /// Batch update rejected; nothing was encoded or sent
    #[error("Batch value at index {index} out of range: {value}")]
    RangeViolation {
        /// Index of the offending value in the batch
        index: usize,
        /// Rejected value
        value: i64,
    },

    /// Batch update with the wrong number of values
    #[error("Batch expects {expected} values, got {actual}")]
    BatchArity {
        /// Number of descriptors in the table
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// Connection identifier already registered
    #[error("Duplicate connection: {0}")]
    DuplicateConnection(SocketAddr),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
