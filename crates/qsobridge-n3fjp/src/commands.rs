//! Outbound N3FJP command encoding.
//!
//! The API requires every command to be CR+LF terminated. The bridge only
//! ever sends two commands: the session-initialization request that enables
//! unsolicited update events, and the frequency/band/mode readback query
//! issued after each contact-logged event.

use bytes::{BufMut, BytesMut};

/// Command terminator required by the N3FJP API.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Encode a raw command body, appending the CR+LF terminator.
///
/// # Example
///
/// ```
/// use qsobridge_n3fjp::commands::encode_command;
///
/// let cmd = encode_command("<CMD><READBMF></CMD>");
/// assert_eq!(cmd, b"<CMD><READBMF></CMD>\r\n");
/// ```
pub fn encode_command(body: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(body.len() + TERMINATOR.len());
    buf.put_slice(body.as_bytes());
    buf.put_slice(TERMINATOR);
    buf.to_vec()
}

/// Session initialization: subscribe to unsolicited field-update events.
///
/// The wire format is the literal the API expects (no inner closing tag).
pub fn set_update_state(enabled: bool) -> Vec<u8> {
    let value = if enabled { "TRUE" } else { "FALSE" };
    encode_command(&format!("<CMD><SETUPDATESTATE><VALUE>{value}</VALUE></CMD>"))
}

/// Query the current band, mode, and frequency.
pub fn read_bmf() -> Vec<u8> {
    encode_command("<CMD><READBMF></CMD>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_appends_crlf() {
        assert_eq!(encode_command("<CMD><X></CMD>"), b"<CMD><X></CMD>\r\n");
    }

    #[test]
    fn set_update_state_wire_format() {
        assert_eq!(
            set_update_state(true),
            b"<CMD><SETUPDATESTATE><VALUE>TRUE</VALUE></CMD>\r\n"
        );
        assert_eq!(
            set_update_state(false),
            b"<CMD><SETUPDATESTATE><VALUE>FALSE</VALUE></CMD>\r\n"
        );
    }

    #[test]
    fn read_bmf_wire_format() {
        assert_eq!(read_bmf(), b"<CMD><READBMF></CMD>\r\n");
    }
}
