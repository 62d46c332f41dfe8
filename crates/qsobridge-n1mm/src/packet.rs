//! N1MM-style `<contactinfo>` packet serialization.
//!
//! Downstream tools in the N1MM ecosystem (spot aggregators, dashboards,
//! antenna rotators) listen for a small XML document broadcast over UDP
//! once per logged contact. The schema here is the minimal set of fields
//! those consumers read:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <contactinfo>
//!   <app>QSOBRIDGE</app>
//!   <contestname>N3FJP</contestname>
//!   <contestnr>1</contestnr>
//!   <timestamp>2026-08-06 14:02:11</timestamp>
//!   <mycall>AB1CD</mycall>
//!   <band>7.0</band>
//!   <rxfreq>718800</rxfreq>
//!   <txfreq>718800</txfreq>
//!   <operator></operator>
//!   <mode>SSB</mode>
//!   <call>W1AW</call>
//! </contactinfo>
//! ```
//!
//! (shown pretty-printed; the wire form is a single line). Frequencies are
//! integers in 10 Hz units, rx and tx identical -- the source protocol does
//! not report split. Field absence is never permitted: emission is gated
//! upstream, so every [`ContactRecord`] arriving here is complete.

use bytes::{BufMut, BytesMut};
use chrono::NaiveDateTime;

use qsobridge_core::{ContactRecord, mhz_to_ten_hz};

/// Value of the `<app>` tag identifying this bridge as the packet source.
pub const APP_NAME: &str = "QSOBRIDGE";

/// Value of the `<contestname>` tag naming the originating logger.
pub const CONTEST_NAME: &str = "N3FJP";

/// Serialize one completed contact as a `<contactinfo>` datagram body.
///
/// `my_call` is the operator's own call sign from configuration (may be
/// empty -- the field is emitted either way). `timestamp` is stamped by the
/// caller so the serializer stays clock-free and testable.
pub fn contact_info(my_call: &str, contact: &ContactRecord, timestamp: NaiveDateTime) -> Vec<u8> {
    let freq_ten_hz = mhz_to_ten_hz(contact.freq_mhz);
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <contactinfo>\
         <app>{APP_NAME}</app>\
         <contestname>{CONTEST_NAME}</contestname>\
         <contestnr>1</contestnr>\
         <timestamp>{}</timestamp>\
         <mycall>{}</mycall>\
         <band>{:.1}</band>\
         <rxfreq>{}</rxfreq>\
         <txfreq>{}</txfreq>\
         <operator></operator>\
         <mode>{}</mode>\
         <call>{}</call>\
         </contactinfo>",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        my_call,
        contact.band.rep_freq_mhz(),
        freq_ten_hz,
        freq_ten_hz,
        contact.mode,
        contact.call,
    );

    let mut buf = BytesMut::with_capacity(body.len());
    buf.put_slice(body.as_bytes());
    buf.to_vec()
}
