//! Per-connection session state machine.
//!
//! The N3FJP API never says "here is a finished QSO" in one message. A
//! logged contact has to be assembled from three unrelated events:
//!
//! 1. `UPDATERESPONSE` updates trickle in as the operator types -- the last
//!    non-empty call-sign field is cached.
//! 2. `ENTEREVENT` announces that a contact was just logged. The session
//!    snapshots the cached call, *arms*, and asks the caller to issue a
//!    frequency readback.
//! 3. `READBMFRESPONSE` answers the readback with band/mode/frequency. If
//!    the session was armed, the transaction completes: either a
//!    [`ContactRecord`] is emitted (all mandatory fields present) or the
//!    cycle is skipped, and the session disarms either way.
//!
//! At most one transaction is armed at a time. A second `ENTEREVENT` while
//! armed silently re-arms with a fresh snapshot -- no queue, no arm timeout.
//! The machine is a pure function of its inputs (no sockets, no clock),
//! which is what makes the transition table directly unit-testable.

use tracing::{debug, info, warn};

use qsobridge_core::{Band, ContactRecord, normalize_mode};

use crate::protocol::CommandBlock;

/// Inbound command names recognized by the session.
mod command {
    pub const SET_UPDATE_STATE_RESPONSE: &str = "SETUPDATESTATERESPONSE";
    pub const UPDATE_RESPONSE: &str = "UPDATERESPONSE";
    pub const ENTER_EVENT: &str = "ENTEREVENT";
    pub const READ_BMF_RESPONSE: &str = "READBMFRESPONSE";
}

/// Field-update control ids the session acts on.
mod control {
    pub const CALL: &str = "TXTENTRYCALL";
    pub const GRID: &str = "TXTENTRYGRID";
}

/// What the caller must do after dispatching one command block.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    /// Nothing externally visible.
    None,
    /// Send a band/mode/frequency readback request to the peer.
    RequestReadback,
    /// A transaction completed with all mandatory fields; publish this.
    Complete(ContactRecord),
    /// A transaction completed with mandatory fields missing; counted as a
    /// skip, not an error.
    Skip {
        /// The call snapshotted at arm time (possibly empty).
        call: String,
        /// The band from the readback, if the code was known.
        band: Option<Band>,
        /// The frequency from the readback (0.0 when absent/unparseable).
        freq_mhz: f64,
    },
}

/// Session state for one TCP connection attempt.
///
/// Created fresh at every (re)connect; never reused across connections.
#[derive(Debug, Default)]
pub struct Session {
    /// Most recent non-empty call sign from an unsolicited field update.
    /// Survives across contacts until overwritten.
    last_call: String,
    /// Most recent grid locator; cleared after each completed transaction.
    last_grid: String,
    /// True between a contact-logged event and its completing readback.
    armed: bool,
    /// Call snapshotted at the moment the transaction armed.
    pending_call: String,
    /// Latest readback values; reset to unknown when a transaction arms.
    last_mode: String,
    last_freq_mhz: f64,
    last_band: Option<Band>,
}

impl Session {
    /// New idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Dispatch one inbound command block.
    pub fn on_command(&mut self, block: &CommandBlock) -> SessionOutput {
        let name = block.name();
        match name.as_str() {
            command::SET_UPDATE_STATE_RESPONSE => {
                debug!(value = %block.tag("VALUE"), "update-state acknowledged");
                SessionOutput::None
            }
            command::UPDATE_RESPONSE => self.on_update(block),
            command::ENTER_EVENT => self.on_enter_event(),
            command::READ_BMF_RESPONSE => self.on_readback(block),
            "" => SessionOutput::None,
            other => {
                debug!(command = other, "ignoring unrecognized command");
                SessionOutput::None
            }
        }
    }

    /// Unsolicited field update: cache the call-sign and grid fields, ignore
    /// every other control id.
    fn on_update(&mut self, block: &CommandBlock) -> SessionOutput {
        let control = block.tag("CONTROL").to_ascii_uppercase();
        let value = block.tag("VALUE");
        match control.as_str() {
            control::CALL => {
                let call = value.trim().to_ascii_uppercase();
                debug!(call = %call, "call field update");
                if !call.is_empty() {
                    self.last_call = call;
                }
            }
            control::GRID => {
                let grid = value.trim().to_string();
                debug!(grid = %grid, "grid field update");
                if !grid.is_empty() {
                    self.last_grid = grid;
                }
            }
            _ => {}
        }
        SessionOutput::None
    }

    /// Contact logged: snapshot the cached call and arm. Re-arming while
    /// already armed discards the previous snapshot.
    fn on_enter_event(&mut self) -> SessionOutput {
        if self.armed {
            warn!(
                discarded = %self.pending_call,
                "contact logged while a transaction was still armed, re-arming"
            );
        }
        self.pending_call = self.last_call.clone();
        self.armed = true;
        self.last_band = None;
        self.last_freq_mhz = 0.0;
        self.last_mode.clear();

        info!(call = %self.pending_call, "contact logged, requesting readback");
        SessionOutput::RequestReadback
    }

    /// Frequency readback: update the cached values, and complete the armed
    /// transaction if one is in flight.
    fn on_readback(&mut self, block: &CommandBlock) -> SessionOutput {
        let band_code = block.tag("BAND");
        // Some logger versions report the mode in MODETEST instead of MODE.
        let mode = {
            let test = block.tag("MODETEST");
            if test.is_empty() { block.tag("MODE") } else { test }
        };
        let freq_text = block.tag("FREQ");

        self.last_freq_mhz = freq_text.trim().parse::<f64>().unwrap_or(0.0);
        if !mode.trim().is_empty() {
            self.last_mode = mode.trim().to_ascii_uppercase();
        }
        self.last_band = Band::from_code(&band_code);

        debug!(
            band = %band_code,
            mode = %self.last_mode,
            freq_mhz = self.last_freq_mhz,
            "readback response"
        );

        if !self.armed {
            return SessionOutput::None;
        }

        let output = match (self.pending_call.is_empty(), self.last_band) {
            (false, Some(band)) if self.last_freq_mhz != 0.0 => {
                SessionOutput::Complete(ContactRecord {
                    call: std::mem::take(&mut self.pending_call),
                    grid: (!self.last_grid.is_empty()).then(|| std::mem::take(&mut self.last_grid)),
                    band,
                    freq_mhz: self.last_freq_mhz,
                    mode: normalize_mode(&self.last_mode),
                })
            }
            _ => SessionOutput::Skip {
                call: std::mem::take(&mut self.pending_call),
                band: self.last_band,
                freq_mhz: self.last_freq_mhz,
            },
        };

        // One output per armed cycle, then back to idle.
        self.armed = false;
        self.pending_call.clear();
        self.last_grid.clear();
        output
    }
}
