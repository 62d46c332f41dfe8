//! Scripted TCP stand-in for the logging peer.
//!
//! [`ScriptedPeer`] listens on a random localhost port and plays back one or
//! more scripted *sessions*: within a session, each expected request is read
//! from the client and answered with the scripted response; at the end of a
//! session the connection is dropped and the next session (if any) waits for
//! a fresh connection. That drop-and-reaccept shape is exactly what the
//! connection supervisor's reconnect logic needs to be tested against.
//!
//! # Example
//!
//! ```no_run
//! use qsobridge_test_harness::ScriptedPeer;
//!
//! # async fn example() -> qsobridge_core::Result<()> {
//! let mut peer = ScriptedPeer::new().await?;
//! peer.expect(b"<CMD><READBMF></CMD>\r\n", b"<CMD><READBMFRESPONSE></CMD>");
//! let addr = peer.addr().to_string();
//! peer.start();
//! // ... connect the supervisor to `addr` ...
//! peer.wait().await.unwrap();
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use qsobridge_core::error::{Error, Result};

/// One expected request and its scripted answer.
#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    response: Vec<u8>,
}

/// A scripted TCP peer playing back sessions of request/response pairs.
pub struct ScriptedPeer {
    addr: String,
    /// Held until `start()` so clients never race the bind.
    listener: Option<TcpListener>,
    /// Sessions in playback order; each is an ordered expectation queue.
    sessions: Vec<VecDeque<Expectation>>,
    handle: Option<JoinHandle<std::result::Result<(), String>>>,
}

impl ScriptedPeer {
    /// Bind to a random localhost port with one (empty) session scripted.
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("failed to bind scripted peer: {}", e)))?;
        let addr = listener.local_addr().map_err(Error::Io)?.to_string();

        Ok(Self {
            addr,
            listener: Some(listener),
            sessions: vec![VecDeque::new()],
            handle: None,
        })
    }

    /// The address the peer is listening on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Add a request/response pair to the current session.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.sessions
            .last_mut()
            .expect("sessions is never empty")
            .push_back(Expectation {
                request: request.to_vec(),
                response: response.to_vec(),
            });
    }

    /// Close the current session script and begin a new one. The connection
    /// serving the previous session is dropped once its expectations are
    /// exhausted, and the new session waits for a fresh connection.
    pub fn next_session(&mut self) {
        self.sessions.push(VecDeque::new());
    }

    /// Start playback in a background task.
    pub fn start(&mut self) {
        let listener = self.listener.take().expect("start() called twice");
        let sessions = std::mem::take(&mut self.sessions);

        self.handle = Some(tokio::spawn(async move {
            for (s, expectations) in sessions.into_iter().enumerate() {
                let (mut stream, _) = listener
                    .accept()
                    .await
                    .map_err(|e| format!("session {s}: accept failed: {e}"))?;

                for (i, expectation) in expectations.iter().enumerate() {
                    let mut buf = vec![0u8; expectation.request.len()];
                    stream
                        .read_exact(&mut buf)
                        .await
                        .map_err(|e| format!("session {s} expectation {i}: read error: {e}"))?;

                    if buf != expectation.request {
                        return Err(format!(
                            "session {s} expectation {i}: request mismatch: expected {:?}, got {:?}",
                            String::from_utf8_lossy(&expectation.request),
                            String::from_utf8_lossy(&buf),
                        ));
                    }

                    stream
                        .write_all(&expectation.response)
                        .await
                        .map_err(|e| format!("session {s} expectation {i}: write error: {e}"))?;
                    stream
                        .flush()
                        .await
                        .map_err(|e| format!("session {s} expectation {i}: flush error: {e}"))?;
                }
                // Session over: drop the connection so the client sees EOF.
            }
            Ok(())
        }));
    }

    /// Wait for playback to finish and surface any script violations.
    pub async fn wait(self) -> std::result::Result<(), String> {
        match self.handle {
            Some(handle) => handle
                .await
                .map_err(|e| format!("scripted peer task panicked: {e}"))?,
            None => Ok(()),
        }
    }
}
