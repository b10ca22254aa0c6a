//! Error taxonomy for the protocol engine.

use std::time::Duration;

use thiserror::Error;

use crate::types::{ResponseCode, Status};

/// Errors that can occur while driving the protocol engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level I/O failure (socket read/write, TLS handshake).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name supplied for TLS SNI.
    #[error("invalid DNS name for TLS: {0}")]
    InvalidDnsName(String),

    /// The byte stream, tokenizer, or response parser encountered data
    /// that does not conform to the wire grammar.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A command completed with a tagged NO or BAD response, or was
    /// abandoned because the server sent BYE before replying.
    #[error("command {command} failed ({status:?}): {text}")]
    CommandError {
        /// The IMAP command keyword that failed (e.g. `"SELECT"`).
        command: String,
        /// The tagged status: `No`, `Bad`, or `Bye` (untagged BYE arrived
        /// before the tagged reply).
        status: Status,
        /// The bracketed response code, if the server sent one.
        code: Option<ResponseCode>,
        /// The human-readable response text.
        text: String,
    },

    /// SASL/LOGIN authentication did not succeed.
    #[error("authentication failed: {0}")]
    AuthenticationError(String),

    /// The requested operation is not valid in the engine's current state
    /// (e.g. issuing a selected-state command while not authenticated).
    #[error("invalid state for operation: {0}")]
    InvalidState(String),

    /// A pending operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// The server does not advertise the capability an operation requires.
    #[error("not supported by server: {0}")]
    NotSupported(String),

    /// Operation timed out.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
