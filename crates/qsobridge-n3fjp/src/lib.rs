//! qsobridge-n3fjp: protocol engine for the N3FJP logger's TCP API.
//!
//! Everything needed to hold a session against the logger lives here:
//!
//! - [`protocol`] -- incremental `<CMD>...</CMD>` stream decoding and tag
//!   extraction
//! - [`commands`] -- outbound command encoding (CR+LF terminated)
//! - [`session`] -- the IDLE/ARMED state machine that turns unrelated
//!   command events into at most one [`ContactRecord`](qsobridge_core::ContactRecord)
//!   per logged contact
//! - [`supervisor`] -- the connect / read / reconnect-with-backoff loop
//!
//! The session and parser are pure (no sockets, no clock) and are exercised
//! directly in unit tests; the supervisor is tested against the scripted
//! transports in `qsobridge-test-harness`.

pub mod commands;
pub mod protocol;
pub mod session;
pub mod supervisor;

pub use protocol::{CommandBlock, StreamParser};
pub use session::{Session, SessionOutput};
pub use supervisor::{Supervisor, SupervisorConfig};
