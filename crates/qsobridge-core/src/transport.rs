//! Transport trait for the logger session.
//!
//! The [`Transport`] trait abstracts over the byte stream to the logging
//! peer. The production implementation is a TCP client socket in
//! `qsobridge-transport`; the test harness provides a scripted in-process
//! mock so the session machinery can be exercised deterministically without
//! a network.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to the logging peer.
///
/// Implementations handle connection state and error mapping at the socket
/// layer. Protocol concerns (command framing, CR+LF termination) live in the
/// protocol crate that consumes this trait.
#[async_trait]
pub trait Transport: Send {
    /// Send raw bytes to the peer, blocking until all bytes are written.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the peer into `buf`, waiting up to `timeout`.
    ///
    /// Returns the number of bytes read.
    /// Returns [`Error::Timeout`](crate::Error::Timeout) when no data arrives
    /// within the deadline (routine -- the read loop polls), and
    /// [`Error::ConnectionLost`](crate::Error::ConnectionLost) when the peer
    /// closes its end.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport. Subsequent `send`/`receive` calls return
    /// [`Error::NotConnected`](crate::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
