//! Publication seam for completed contacts.
//!
//! The session machinery decides *when* a notification happens; a
//! [`ContactPublisher`] decides *where* it goes (UDP datagram, optional HTTP
//! side-channel, a recording stub in tests). Publishers run strictly after a
//! transaction has completed, and nothing they do feeds back into the
//! session state machine.

use async_trait::async_trait;

use crate::contact::ContactRecord;
use crate::error::Result;

/// Consumer of completed [`ContactRecord`]s.
///
/// A publisher failure is logged by the caller and never terminates the
/// session -- delivery is best-effort by design.
#[async_trait]
pub trait ContactPublisher: Send {
    /// Publish one completed contact.
    async fn publish(&mut self, contact: &ContactRecord) -> Result<()>;
}
