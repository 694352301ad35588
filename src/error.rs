//! Crate error type.
//!
//! Only startup failures surface here. Per-tick geometry problems resolve
//! locally (rollback, skipped settle) and broadcast failures are logged.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {timeout:?} connecting to {addr}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("handshake read failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("timed out after {0:?} waiting for the handshake greeting")]
    HandshakeTimeout(Duration),

    #[error("peer closed the connection before sending a greeting")]
    HandshakeClosed,

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
