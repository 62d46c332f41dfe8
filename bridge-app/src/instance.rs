//! Single-instance guard.
//!
//! Two bridges feeding the same destination would double every
//! notification, so startup claims a fixed loopback port and holds it for
//! the life of the process. A failed bind means another instance already
//! owns the port -- the only fatal startup condition in the bridge.

use std::net::TcpListener;

use anyhow::{Context, Result};
use tracing::debug;

/// Loopback port claimed as the instance lock.
pub const GUARD_PORT: u16 = 56789;

/// Holds the guard port until dropped (process exit).
#[derive(Debug)]
pub struct InstanceGuard {
    _listener: TcpListener,
}

/// Claim the guard port, failing if another instance holds it.
pub fn acquire(port: u16) -> Result<InstanceGuard> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .with_context(|| format!("failed to bind instance guard port {port}"))?;
    debug!(port, "instance guard acquired");
    Ok(InstanceGuard {
        _listener: listener,
    })
}
