//! Amateur radio band identification.
//!
//! The N3FJP API reports the band of a logged QSO as a bare code like `"40"`
//! or `"40M"`. Downstream consumers of the translated notification want a
//! frequency, so each [`Band`] carries a representative frequency in MHz
//! (the low phone/CW edge the original ecosystem uses for band labeling).
//!
//! Unknown codes map to `None` -- absence, not a default band -- which gates
//! packet emission upstream.
//!
//! # Example
//!
//! ```
//! use qsobridge_core::Band;
//!
//! let band = Band::from_code("40").unwrap();
//! assert_eq!(band, Band::B40m);
//! assert_eq!(band.rep_freq_mhz(), 7.0);
//! assert_eq!(band.to_string(), "40m");
//! ```

use std::fmt;
use std::str::FromStr;

/// Amateur band as reported by the logger, 160 meters through 2 meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// 160 meters.
    B160m,
    /// 80 meters.
    B80m,
    /// 60 meters.
    B60m,
    /// 40 meters.
    B40m,
    /// 30 meters.
    B30m,
    /// 20 meters.
    B20m,
    /// 17 meters.
    B17m,
    /// 15 meters.
    B15m,
    /// 12 meters.
    B12m,
    /// 10 meters.
    B10m,
    /// 6 meters.
    B6m,
    /// 2 meters.
    B2m,
}

/// All bands in frequency order, lowest first.
const ALL_BANDS: &[Band] = &[
    Band::B160m,
    Band::B80m,
    Band::B60m,
    Band::B40m,
    Band::B30m,
    Band::B20m,
    Band::B17m,
    Band::B15m,
    Band::B12m,
    Band::B10m,
    Band::B6m,
    Band::B2m,
];

impl Band {
    /// Parse a band code as the logger reports it (`"40"`, `"40M"`, `"40m"`,
    /// with surrounding whitespace tolerated).
    ///
    /// Returns `None` for codes outside the table; callers must treat that
    /// as "no band", never substitute a default.
    pub fn from_code(code: &str) -> Option<Band> {
        let code = code.trim().trim_end_matches(['m', 'M']);
        match code {
            "160" => Some(Band::B160m),
            "80" => Some(Band::B80m),
            "60" => Some(Band::B60m),
            "40" => Some(Band::B40m),
            "30" => Some(Band::B30m),
            "20" => Some(Band::B20m),
            "17" => Some(Band::B17m),
            "15" => Some(Band::B15m),
            "12" => Some(Band::B12m),
            "10" => Some(Band::B10m),
            "6" => Some(Band::B6m),
            "2" => Some(Band::B2m),
            _ => None,
        }
    }

    /// Representative frequency for this band in MHz.
    ///
    /// This is the value carried in the destination packet's band field and
    /// in the HTTP notification's `band_mhz`.
    pub fn rep_freq_mhz(&self) -> f64 {
        match self {
            Band::B160m => 1.8,
            Band::B80m => 3.5,
            Band::B60m => 5.3,
            Band::B40m => 7.0,
            Band::B30m => 10.1,
            Band::B20m => 14.0,
            Band::B17m => 18.1,
            Band::B15m => 21.0,
            Band::B12m => 24.9,
            Band::B10m => 28.0,
            Band::B6m => 50.0,
            Band::B2m => 144.0,
        }
    }

    /// Short band name (e.g. "40m").
    pub fn name(&self) -> &'static str {
        match self {
            Band::B160m => "160m",
            Band::B80m => "80m",
            Band::B60m => "60m",
            Band::B40m => "40m",
            Band::B30m => "30m",
            Band::B20m => "20m",
            Band::B17m => "17m",
            Band::B15m => "15m",
            Band::B12m => "12m",
            Band::B10m => "10m",
            Band::B6m => "6m",
            Band::B2m => "2m",
        }
    }

    /// All bands in frequency order (lowest first).
    pub fn all() -> &'static [Band] {
        ALL_BANDS
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a string cannot be parsed into a [`Band`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBandError(String);

impl fmt::Display for ParseBandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown band: '{}'", self.0)
    }
}

impl std::error::Error for ParseBandError {}

impl FromStr for Band {
    type Err = ParseBandError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Band::from_code(s).ok_or_else(|| ParseBandError(s.to_string()))
    }
}
