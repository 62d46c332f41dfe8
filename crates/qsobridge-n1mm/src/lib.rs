//! qsobridge-n1mm: the destination side of the bridge.
//!
//! Serializes completed contacts into N1MM-style `<contactinfo>` XML
//! ([`packet`]) and broadcasts them as UDP datagrams ([`UdpAnnouncer`]).

pub mod announce;
pub mod packet;

pub use announce::UdpAnnouncer;
pub use packet::contact_info;
