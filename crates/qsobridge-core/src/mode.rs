//! Operating-mode normalization.
//!
//! N3FJP reports modes as short codes (`PH`, `CW`, `DI`, `FM`, ...), and
//! operators' rigs report sideband variants (`USB`, `LSB`). Downstream
//! consumers want one vocabulary, so the phone synonyms collapse to `SSB`
//! and the generic digital code becomes `DIGI`. Everything else passes
//! through upper-cased; an empty mode becomes the explicit `UNKNOWN`
//! sentinel rather than vanishing from the packet.

/// Sentinel used when the logger never reported a mode.
pub const MODE_UNKNOWN: &str = "UNKNOWN";

/// Normalize a raw mode code to the bridge's canonical vocabulary.
///
/// Idempotent: normalizing an already-normalized label returns it unchanged.
///
/// # Example
///
/// ```
/// use qsobridge_core::normalize_mode;
///
/// assert_eq!(normalize_mode("PH"), "SSB");
/// assert_eq!(normalize_mode("lsb"), "SSB");
/// assert_eq!(normalize_mode("DI"), "DIGI");
/// assert_eq!(normalize_mode("cw"), "CW");
/// assert_eq!(normalize_mode(""), "UNKNOWN");
/// ```
pub fn normalize_mode(raw: &str) -> String {
    let mode = raw.trim().to_ascii_uppercase();
    match mode.as_str() {
        "PH" | "USB" | "LSB" | "SSB" => "SSB".to_string(),
        "DI" => "DIGI".to_string(),
        "" => MODE_UNKNOWN.to_string(),
        _ => mode,
    }
}
