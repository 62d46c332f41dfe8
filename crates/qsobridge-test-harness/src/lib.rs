//! qsobridge-test-harness: scripted stand-ins for the network.
//!
//! Two tools for deterministic protocol testing:
//!
//! - [`MockTransport`] -- an in-process [`Transport`](qsobridge_core::Transport)
//!   with an expectation queue, for driving the session machinery without a
//!   socket.
//! - [`ScriptedPeer`] -- a real localhost TCP listener playing back scripted
//!   sessions, for exercising the connection supervisor end to end,
//!   including reconnects.

pub mod mock_transport;
pub mod scripted_peer;

pub use mock_transport::MockTransport;
pub use scripted_peer::ScriptedPeer;
