//! Error types for qsobridge.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! configuration errors are all captured here.

/// The error type for all qsobridge operations.
///
/// Variants cover the failure modes of an unattended protocol bridge:
/// socket-level transport failures, malformed peer data, timeouts, and
/// startup configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (TCP session, UDP socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed command block, unexpected payload).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for data from the peer.
    ///
    /// During the read loop this is routine -- the supervisor polls with a
    /// short receive timeout and simply reads again.
    #[error("timeout waiting for data")]
    Timeout,

    /// No connection to the peer has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the peer was lost unexpectedly.
    ///
    /// On TCP a zero-length read means the logger closed its end; the
    /// supervisor reacts by reconnecting with backoff.
    #[error("connection lost")]
    ConnectionLost,

    /// Invalid or unusable configuration discovered at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
