//! qsobridge-core: Core types, traits, and error definitions for qsobridge.
//!
//! This crate defines the protocol-agnostic abstractions shared by the
//! source-protocol (N3FJP) and destination-format (N1MM) crates and by the
//! bridge daemon. Nothing here touches a socket.
//!
//! # Key types
//!
//! - [`ContactRecord`] -- one translated, completed contact
//! - [`Band`] / [`normalize_mode`] -- field translation primitives
//! - [`Transport`] -- byte-level channel to the logging peer
//! - [`ContactPublisher`] -- sink for completed contacts
//! - [`Error`] / [`Result`] -- error handling

pub mod band;
pub mod contact;
pub mod error;
pub mod mode;
pub mod publish;
pub mod transport;

// Re-export key types at crate root for ergonomic `use qsobridge_core::*`.
pub use band::{Band, ParseBandError};
pub use contact::{ContactRecord, mhz_to_khz, mhz_to_ten_hz};
pub use error::{Error, Result};
pub use mode::{MODE_UNKNOWN, normalize_mode};
pub use publish::ContactPublisher;
pub use transport::Transport;
