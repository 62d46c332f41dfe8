//! The completed-contact record and frequency conversions.
//!
//! A [`ContactRecord`] is produced once per successfully completed logging
//! transaction and never mutated afterwards. It deliberately carries no
//! timestamp -- the serializers stamp the record at emission time, which
//! keeps the session state machine clock-free and directly unit-testable.

use crate::band::Band;

/// One logged contact, translated and ready for publication.
///
/// Constructed by the session state machine only when all mandatory fields
/// are present (non-empty call, known band, non-zero frequency), so
/// serializers may assume every field is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecord {
    /// Call sign of the contacted station.
    pub call: String,
    /// Grid locator of the contacted station, when the logger reported one.
    pub grid: Option<String>,
    /// Band the contact was logged on.
    pub band: Band,
    /// Operating frequency in MHz.
    pub freq_mhz: f64,
    /// Normalized operating mode (see [`crate::normalize_mode`]).
    pub mode: String,
}

/// Convert a frequency in MHz to the destination packet's integer 10 Hz
/// units, rounding to nearest.
///
/// Unrepresentable inputs (NaN, negative) yield 0 rather than failing;
/// emission is gated on a non-zero frequency upstream.
///
/// # Example
///
/// ```
/// use qsobridge_core::mhz_to_ten_hz;
///
/// assert_eq!(mhz_to_ten_hz(7.188), 718_800);
/// assert_eq!(mhz_to_ten_hz(14.074), 1_407_400);
/// ```
pub fn mhz_to_ten_hz(mhz: f64) -> u64 {
    (mhz * 100_000.0).round().max(0.0) as u64
}

/// Convert a frequency in MHz to integer kHz, rounding to nearest.
///
/// Used by the HTTP notification payload. Same failure policy as
/// [`mhz_to_ten_hz`]: bad input yields 0.
///
/// # Example
///
/// ```
/// use qsobridge_core::mhz_to_khz;
///
/// assert_eq!(mhz_to_khz(7.188), 7188);
/// ```
pub fn mhz_to_khz(mhz: f64) -> u64 {
    (mhz * 1_000.0).round().max(0.0) as u64
}
