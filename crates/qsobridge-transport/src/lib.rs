//! qsobridge-transport: socket transports for the bridge.
//!
//! Two concrete transports, one per side of the bridge:
//!
//! - [`TcpTransport`] -- client session to the N3FJP API server, implements
//!   the [`Transport`](qsobridge_core::Transport) trait consumed by the
//!   connection supervisor.
//! - [`UdpTransport`] -- datagram socket the announcer uses to emit one
//!   `<contactinfo>` packet per logged contact.

pub mod tcp;
pub mod udp;

pub use tcp::TcpTransport;
pub use udp::UdpTransport;
