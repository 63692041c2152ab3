//! Common error types for the analytics core

use thiserror::Error;

/// Common result type for analytics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds shared by the analytics crates
///
/// Unresolvable media periods and stale timelines are deliberately not represented
/// here: they resolve to "unknown attribution" instead of failing.
#[derive(Error, Debug)]
pub enum Error {
    /// A collaborator broke a precondition (programming error, not recoverable locally)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Confined component used from a thread other than the one it is bound to
    #[error("Wrong thread: bound to {expected}, called from {actual}")]
    WrongThread { expected: String, actual: String },

    /// Listener deliveries panicked while strict checking was enabled
    #[error("Listener delivery failed {failures} time(s)")]
    ListenerFailure { failures: u64 },

    /// Invalid user input or malformed model value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML document could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
