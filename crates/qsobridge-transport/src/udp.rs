//! UDP socket for the destination broadcast.
//!
//! [`UdpTransport`] is the datagram side of the bridge: each completed
//! contact becomes exactly one datagram to the configured destination. It
//! does **not** implement the [`Transport`](qsobridge_core::Transport) trait
//! because UDP is connectionless and datagram-based rather than
//! stream-oriented.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

use qsobridge_core::error::{Error, Result};

/// UDP socket wrapper with error mapping consistent with the TCP transport.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    /// The local address the socket is bound to.
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind to a local address.
    ///
    /// The announcer uses `"0.0.0.0:0"` -- any interface, ephemeral port.
    pub async fn bind(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| {
            tracing::warn!(addr = %addr, error = %e, "failed to bind UDP socket");
            Error::Io(e)
        })?;
        let local_addr = socket.local_addr().map_err(Error::Io)?;

        tracing::debug!(local_addr = %local_addr, "UDP socket bound");
        Ok(Self { socket, local_addr })
    }

    /// The local address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Send one datagram to `addr`. The whole slice goes out atomically;
    /// delivery is not guaranteed (fire-and-forget by design).
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<()> {
        self.socket.send_to(data, addr).await.map_err(|e| {
            tracing::warn!(remote = %addr, error = %e, "failed to send datagram");
            Error::Io(e)
        })?;
        tracing::trace!(remote = %addr, bytes = data.len(), "datagram sent");
        Ok(())
    }

    /// Receive a datagram with timeout. Returns `(bytes_read, source_addr)`.
    ///
    /// Only used by tests that stand in for the destination listener.
    pub async fn recv_from(&self, buf: &mut [u8], timeout: Duration) -> Result<(usize, SocketAddr)> {
        match tokio::time::timeout(timeout, self.socket.recv_from(buf)).await {
            Ok(Ok((n, src))) => Ok((n, src)),
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Err(Error::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_assigns_port() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        assert_ne!(transport.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn send_recv_loopback() {
        let sender = UdpTransport::bind("127.0.0.1:0").await.unwrap();
        let receiver = UdpTransport::bind("127.0.0.1:0").await.unwrap();

        let data = b"<contactinfo></contactinfo>";
        sender.send_to(data, receiver.local_addr()).await.unwrap();

        let mut buf = [0u8; 256];
        let (n, src) = receiver
            .recv_from(&mut buf, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(&buf[..n], data);
        assert_eq!(src, sender.local_addr());
    }

    #[tokio::test]
    async fn recv_timeout() {
        let transport = UdpTransport::bind("127.0.0.1:0").await.unwrap();

        let mut buf = [0u8; 256];
        let result = transport.recv_from(&mut buf, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }
}
