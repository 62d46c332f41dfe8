//! UDP announcer: one datagram per completed contact.

use std::net::SocketAddr;

use async_trait::async_trait;
use chrono::Local;

use qsobridge_core::error::Result;
use qsobridge_core::{ContactPublisher, ContactRecord};
use qsobridge_transport::UdpTransport;

use crate::packet;

/// Publishes completed contacts as `<contactinfo>` datagrams.
///
/// Fire-and-forget: the announcer neither retries nor waits for any
/// acknowledgement, and a send failure is surfaced to the caller purely for
/// logging.
pub struct UdpAnnouncer {
    socket: UdpTransport,
    dest: SocketAddr,
    my_call: String,
}

impl UdpAnnouncer {
    /// Bind an ephemeral local socket aimed at `dest`.
    ///
    /// `my_call` is the operator call carried in every packet (may be empty).
    pub async fn bind(dest: SocketAddr, my_call: impl Into<String>) -> Result<Self> {
        let socket = UdpTransport::bind("0.0.0.0:0").await?;
        Ok(Self {
            socket,
            dest,
            my_call: my_call.into(),
        })
    }

    /// The destination this announcer sends to.
    pub fn dest(&self) -> SocketAddr {
        self.dest
    }
}

#[async_trait]
impl ContactPublisher for UdpAnnouncer {
    async fn publish(&mut self, contact: &ContactRecord) -> Result<()> {
        let datagram = packet::contact_info(&self.my_call, contact, Local::now().naive_local());
        self.socket.send_to(&datagram, self.dest).await?;
        tracing::info!(
            dest = %self.dest,
            call = %contact.call,
            band = %contact.band,
            freq_mhz = contact.freq_mhz,
            mode = %contact.mode,
            "sent contactinfo datagram"
        );
        Ok(())
    }
}
