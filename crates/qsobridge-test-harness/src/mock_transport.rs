//! Mock transport for deterministic session testing.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs, so the session machinery can be exercised
//! without a socket.
//!
//! # Example
//!
//! ```
//! use qsobridge_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the engine sends the readback query, answer with a response block.
//! mock.expect(
//!     b"<CMD><READBMF></CMD>\r\n",
//!     b"<CMD><READBMFRESPONSE><BAND>40</BAND><FREQ>7.188</FREQ></CMD>",
//! );
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use qsobridge_core::error::{Error, Result};
use qsobridge_core::transport::Transport;

/// A pre-loaded request/response pair.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes to return from subsequent `receive()` calls.
    response: Vec<u8>,
}

/// A scripted [`Transport`] for testing without a network.
///
/// Expectations are consumed in order: each `send()` is matched against the
/// next expectation and queues its response bytes, which `receive()` then
/// hands out (possibly across multiple reads, so buffer-split behavior is
/// exercised too). With no response pending, `receive()` waits out the
/// caller's timeout and returns [`Error::Timeout`], mirroring a quiet
/// socket.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Response bytes pending for `receive()`.
    pending: Vec<u8>,
    /// Whether the transport is "connected".
    closed: bool,
    /// Every `send()` payload, in order.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a connected mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected request/response pair.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// All data sent through this transport, one entry per `send()`.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::NotConnected);
        }
        self.sent_log.push(data.to_vec());

        let Some(expectation) = self.expectations.pop_front() else {
            return Err(Error::Protocol("no more expectations in mock".into()));
        };
        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data),
            )));
        }
        self.pending.extend_from_slice(&expectation.response);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if self.closed {
            return Err(Error::NotConnected);
        }
        if self.pending.is_empty() {
            // Behave like a quiet socket: yield for the poll interval.
            tokio::time::sleep(timeout).await;
            return Err(Error::Timeout);
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matched_send_queues_response() {
        let mut mock = MockTransport::new();
        mock.expect(b"ping", b"pong");

        mock.send(b"ping").await.unwrap();
        let mut buf = [0u8; 16];
        let n = mock.receive(&mut buf, Duration::from_millis(1)).await.unwrap();
        assert_eq!(&buf[..n], b"pong");
        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.sent_data(), &[b"ping".to_vec()]);
    }

    #[tokio::test]
    async fn mismatched_send_is_protocol_error() {
        let mut mock = MockTransport::new();
        mock.expect(b"ping", b"pong");

        let result = mock.send(b"pong").await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn quiet_mock_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 16];
        let result = mock.receive(&mut buf, Duration::from_millis(1)).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn response_split_across_small_reads() {
        let mut mock = MockTransport::new();
        mock.expect(b"q", b"0123456789");
        mock.send(b"q").await.unwrap();

        let mut buf = [0u8; 4];
        let mut collected = Vec::new();
        while let Ok(n) = mock.receive(&mut buf, Duration::from_millis(1)).await {
            collected.extend_from_slice(&buf[..n]);
        }
        assert_eq!(collected, b"0123456789");
    }

    #[tokio::test]
    async fn closed_mock_is_not_connected() {
        let mut mock = MockTransport::new();
        mock.close().await.unwrap();
        assert!(!mock.is_connected());
        assert!(matches!(mock.send(b"x").await, Err(Error::NotConnected)));
    }
}
