//! Connection supervisor: keep one live session to the logger, forever.
//!
//! The supervisor owns the TCP socket lifecycle. It connects with a bounded
//! timeout, sends the session-initialization command, then runs a
//! short-timeout read loop that feeds the [`StreamParser`] and dispatches
//! every yielded block to a fresh [`Session`]. Any failure -- connect error,
//! peer close, socket error -- tears the session down, waits out an
//! exponential backoff, and reconnects. There is no retry limit: the loop
//! runs until the cancellation token fires.
//!
//! The read timeout is a polling interval, not a correctness boundary; a
//! timeout just means "nothing new yet", and partial blocks stay buffered in
//! the parser across reads.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use qsobridge_core::error::{Error, Result};
use qsobridge_core::{ContactPublisher, Transport};
use qsobridge_transport::TcpTransport;

use crate::commands;
use crate::protocol::StreamParser;
use crate::session::{Session, SessionOutput};

/// Socket read chunk size. Command blocks are tiny; this is generous.
const RECV_CHUNK: usize = 8192;

/// Tunables for the supervisor loop.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Logger endpoint, `host:port`.
    pub addr: String,
    /// Bound on each connection attempt.
    pub connect_timeout: Duration,
    /// Receive poll interval; timing out here is routine.
    pub read_timeout: Duration,
    /// Delay before the first reconnect attempt.
    pub backoff_floor: Duration,
    /// Backoff doubles per failed cycle up to this ceiling.
    pub backoff_ceiling: Duration,
}

impl SupervisorConfig {
    /// Config with production defaults for the given endpoint.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(1),
            backoff_floor: Duration::from_secs(2),
            backoff_ceiling: Duration::from_secs(30),
        }
    }
}

/// Owns the connect/read/reconnect loop and the per-session machinery.
pub struct Supervisor {
    config: SupervisorConfig,
    /// Contacts published over the process lifetime.
    published: u64,
    /// Armed cycles dropped for missing mandatory fields.
    skipped: u64,
}

impl Supervisor {
    /// Create a supervisor. Call [`run`](Supervisor::run) to start it.
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            published: 0,
            skipped: 0,
        }
    }

    /// Contacts published so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Cycles skipped for missing mandatory fields so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Run until `cancel` fires. Never returns an error: every connectivity
    /// and protocol failure is logged and answered with a reconnect.
    pub async fn run(&mut self, publisher: &mut dyn ContactPublisher, cancel: CancellationToken) {
        let mut backoff = self.config.backoff_floor;

        loop {
            if cancel.is_cancelled() {
                return;
            }

            info!(addr = %self.config.addr, "connecting to logger");
            match TcpTransport::connect(&self.config.addr, self.config.connect_timeout).await {
                Ok(mut transport) => {
                    // A successful connect resets the backoff to its floor.
                    backoff = self.config.backoff_floor;

                    let result = self.drive_session(&mut transport, publisher, &cancel).await;
                    let _ = transport.close().await;

                    match result {
                        Ok(()) => return, // cancelled
                        Err(e) => {
                            warn!(addr = %self.config.addr, error = %e, "session ended")
                        }
                    }
                }
                Err(e) => warn!(addr = %self.config.addr, error = %e, "connect failed"),
            }

            info!(
                delay_ms = backoff.as_millis(),
                published = self.published,
                skipped = self.skipped,
                "waiting before reconnect"
            );
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(self.config.backoff_ceiling);
        }
    }

    /// Drive one connected session: handshake, then read/dispatch until the
    /// transport fails or `cancel` fires.
    ///
    /// `Ok(())` means cancelled; every other exit is a transport error the
    /// caller answers with a reconnect. Public so tests can drive a mock
    /// transport without a network.
    pub async fn drive_session(
        &mut self,
        transport: &mut dyn Transport,
        publisher: &mut dyn ContactPublisher,
        cancel: &CancellationToken,
    ) -> Result<()> {
        // Subscribe to unsolicited field-update events.
        transport.send(&commands::set_update_state(true)).await?;
        debug!("sent update-state subscription");

        let mut parser = StreamParser::new();
        let mut session = Session::new();
        let mut buf = [0u8; RECV_CHUNK];

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            match transport.receive(&mut buf, self.config.read_timeout).await {
                Ok(n) => {
                    for block in parser.feed(&buf[..n]) {
                        self.dispatch(&block, &mut session, transport, publisher)
                            .await?;
                    }
                }
                Err(Error::Timeout) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Act on one parsed command block.
    async fn dispatch(
        &mut self,
        block: &crate::protocol::CommandBlock,
        session: &mut Session,
        transport: &mut dyn Transport,
        publisher: &mut dyn ContactPublisher,
    ) -> Result<()> {
        match session.on_command(block) {
            SessionOutput::None => {}
            SessionOutput::RequestReadback => {
                transport.send(&commands::read_bmf()).await?;
            }
            SessionOutput::Complete(contact) => {
                self.published += 1;
                info!(
                    call = %contact.call,
                    band = %contact.band,
                    freq_mhz = contact.freq_mhz,
                    mode = %contact.mode,
                    published = self.published,
                    "contact completed, publishing"
                );
                // Publication is best-effort; a failed publish never tears
                // down the session or re-enters the state machine.
                if let Err(e) = publisher.publish(&contact).await {
                    warn!(call = %contact.call, error = %e, "publish failed");
                }
            }
            SessionOutput::Skip { call, band, freq_mhz } => {
                self.skipped += 1;
                warn!(
                    call = %call,
                    band = ?band,
                    freq_mhz = freq_mhz,
                    skipped = self.skipped,
                    "skipping contact with missing fields"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use qsobridge_core::ContactRecord;
    use qsobridge_test_harness::{MockTransport, ScriptedPeer};

    const HANDSHAKE: &[u8] = b"<CMD><SETUPDATESTATE><VALUE>TRUE</VALUE></CMD>\r\n";
    const READBMF: &[u8] = b"<CMD><READBMF></CMD>\r\n";

    /// Publisher that records contacts and cancels the supervisor once it
    /// has seen the expected number.
    struct RecordingPublisher {
        contacts: Vec<ContactRecord>,
        expected: usize,
        cancel: CancellationToken,
    }

    impl RecordingPublisher {
        fn new(expected: usize, cancel: CancellationToken) -> Self {
            Self {
                contacts: Vec::new(),
                expected,
                cancel,
            }
        }
    }

    #[async_trait]
    impl ContactPublisher for RecordingPublisher {
        async fn publish(&mut self, contact: &ContactRecord) -> qsobridge_core::Result<()> {
            self.contacts.push(contact.clone());
            if self.contacts.len() >= self.expected {
                self.cancel.cancel();
            }
            Ok(())
        }
    }

    fn test_config(addr: &str) -> SupervisorConfig {
        SupervisorConfig {
            addr: addr.to_string(),
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_millis(20),
            backoff_floor: Duration::from_millis(10),
            backoff_ceiling: Duration::from_millis(40),
        }
    }

    #[tokio::test]
    async fn session_publishes_logged_contact() {
        let mut mock = MockTransport::new();
        mock.expect(
            HANDSHAKE,
            b"<CMD><SETUPDATESTATERESPONSE><VALUE>TRUE</VALUE></CMD>\
              <CMD><UPDATERESPONSE><CONTROL>TXTENTRYCALL</CONTROL><VALUE>W1AW</VALUE></CMD>\
              <CMD><ENTEREVENT></CMD>",
        );
        mock.expect(
            READBMF,
            b"<CMD><READBMFRESPONSE><BAND>40</BAND><MODE>PH</MODE><FREQ>7.188</FREQ></CMD>",
        );

        let cancel = CancellationToken::new();
        let mut publisher = RecordingPublisher::new(1, cancel.clone());
        let mut supervisor = Supervisor::new(test_config("mock"));

        supervisor
            .drive_session(&mut mock, &mut publisher, &cancel)
            .await
            .unwrap();

        assert_eq!(publisher.contacts.len(), 1);
        let contact = &publisher.contacts[0];
        assert_eq!(contact.call, "W1AW");
        assert_eq!(contact.band.rep_freq_mhz(), 7.0);
        assert_eq!(contact.mode, "SSB");
        assert_eq!(supervisor.published(), 1);
        assert_eq!(supervisor.skipped(), 0);
    }

    #[tokio::test]
    async fn session_counts_skip_for_zero_frequency() {
        let mut mock = MockTransport::new();
        mock.expect(
            HANDSHAKE,
            b"<CMD><UPDATERESPONSE><CONTROL>TXTENTRYCALL</CONTROL><VALUE>W1AW</VALUE></CMD>\
              <CMD><ENTEREVENT></CMD>",
        );
        mock.expect(
            READBMF,
            b"<CMD><READBMFRESPONSE><BAND>40</BAND><MODE>PH</MODE><FREQ>0</FREQ></CMD>",
        );

        let cancel = CancellationToken::new();
        let mut publisher = RecordingPublisher::new(1, cancel.clone());
        let mut supervisor = Supervisor::new(test_config("mock"));

        // Nothing publishes, so cancel manually once the mock goes quiet.
        let cancel_after = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel_after.cancel();
        });

        supervisor
            .drive_session(&mut mock, &mut publisher, &cancel)
            .await
            .unwrap();

        assert!(publisher.contacts.is_empty());
        assert_eq!(supervisor.published(), 0);
        assert_eq!(supervisor.skipped(), 1);
    }

    #[tokio::test]
    async fn publish_failure_does_not_end_session() {
        struct FailingPublisher {
            attempts: usize,
            cancel: CancellationToken,
        }

        #[async_trait]
        impl ContactPublisher for FailingPublisher {
            async fn publish(&mut self, _: &ContactRecord) -> qsobridge_core::Result<()> {
                self.attempts += 1;
                if self.attempts >= 2 {
                    self.cancel.cancel();
                }
                Err(qsobridge_core::Error::Transport("udp down".into()))
            }
        }

        let mut mock = MockTransport::new();
        mock.expect(
            HANDSHAKE,
            b"<CMD><UPDATERESPONSE><CONTROL>TXTENTRYCALL</CONTROL><VALUE>W1AW</VALUE></CMD>\
              <CMD><ENTEREVENT></CMD>",
        );
        mock.expect(
            READBMF,
            b"<CMD><READBMFRESPONSE><BAND>40</BAND><MODE>PH</MODE><FREQ>7.188</FREQ></CMD>\
              <CMD><ENTEREVENT></CMD>",
        );
        mock.expect(
            READBMF,
            b"<CMD><READBMFRESPONSE><BAND>40</BAND><MODE>PH</MODE><FREQ>7.188</FREQ></CMD>",
        );

        let cancel = CancellationToken::new();
        let mut publisher = FailingPublisher {
            attempts: 0,
            cancel: cancel.clone(),
        };
        let mut supervisor = Supervisor::new(test_config("mock"));

        supervisor
            .drive_session(&mut mock, &mut publisher, &cancel)
            .await
            .unwrap();

        // Both cycles completed despite the failing publisher.
        assert_eq!(publisher.attempts, 2);
        assert_eq!(supervisor.published(), 2);
    }

    #[tokio::test]
    async fn reconnects_after_peer_drop_and_resends_handshake() {
        let mut peer = ScriptedPeer::new().await.unwrap();

        // Session 1: handshake acknowledged, then the peer drops.
        peer.expect(
            HANDSHAKE,
            b"<CMD><SETUPDATESTATERESPONSE><VALUE>TRUE</VALUE></CMD>",
        );

        // Session 2: a full logged-contact cycle.
        peer.next_session();
        peer.expect(
            HANDSHAKE,
            b"<CMD><UPDATERESPONSE><CONTROL>TXTENTRYCALL</CONTROL><VALUE>K1ABC</VALUE></CMD>\
              <CMD><ENTEREVENT></CMD>",
        );
        peer.expect(
            READBMF,
            b"<CMD><READBMFRESPONSE><BAND>20</BAND><MODE>CW</MODE><FREQ>14.025</FREQ></CMD>",
        );

        let addr = peer.addr().to_string();
        peer.start();

        let cancel = CancellationToken::new();
        let mut publisher = RecordingPublisher::new(1, cancel.clone());
        let mut supervisor = Supervisor::new(test_config(&addr));

        supervisor.run(&mut publisher, cancel).await;

        assert_eq!(publisher.contacts.len(), 1);
        assert_eq!(publisher.contacts[0].call, "K1ABC");
        assert_eq!(publisher.contacts[0].mode, "CW");
        peer.wait().await.unwrap();
    }

    #[tokio::test]
    async fn run_retries_until_peer_appears() {
        // Reserve a port, then drop the listener so the first attempts are
        // refused.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let cancel = CancellationToken::new();
        let cancel_after = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            cancel_after.cancel();
        });

        let mut publisher = RecordingPublisher::new(1, cancel.clone());
        let mut supervisor = Supervisor::new(test_config(&addr));

        // Must keep retrying (never panic, never return early) until cancelled.
        supervisor.run(&mut publisher, cancel).await;
        assert!(publisher.contacts.is_empty());
    }
}
