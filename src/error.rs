//! Unified error type.

use thiserror::Error;

/// The error type returned by worldbench's fallible setup operations.
///
/// Request-level failures (a failed update batch, a missing row in strict
/// mode) are expressed as HTTP [`Response`](crate::Response) values, not as
/// `Error`s. This type surfaces infrastructure failures: reading
/// configuration, binding a port, accepting connections.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {var}: {message}")]
    Config { var: &'static str, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
