//! Layered bridge configuration.
//!
//! The effective configuration is built exactly once at startup and passed
//! into the supervisor and publishers by value -- no component reads ambient
//! global state. Three layers, later layers winning:
//!
//! 1. Compiled-in defaults.
//! 2. `config.json` -- the path given on the command line, else the first of
//!    `./config.json` and `config.json` next to the executable. UTF-8 with
//!    or without a BOM. Keys use the SCREAMING_SNAKE_CASE names the original
//!    operator config files already use (`N3FJP_HOST`, ...).
//! 3. Environment variables with the same names.
//!
//! A malformed or missing discovered file falls back to defaults with a
//! warning; only an explicitly given `--config` path that cannot be loaded
//! is fatal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Immutable bridge configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct BridgeConfig {
    /// N3FJP API server host.
    pub n3fjp_host: String,
    /// N3FJP API server port.
    pub n3fjp_port: u16,
    /// Destination host for the contactinfo datagrams.
    pub udp_dest_ip: String,
    /// Destination port for the contactinfo datagrams.
    pub udp_dest_port: u16,
    /// Operator call sign carried in outbound packets (may be empty).
    pub mycall_fallback: String,
    /// Log file path; `None` logs to stdout only.
    pub log_path: Option<PathBuf>,
    /// Whether to POST each contact to OpenHamClock as well.
    pub enable_ohc_http: bool,
    /// OpenHamClock base URL.
    pub ohc_base_url: String,
    /// Optional OpenHamClock API key.
    pub ohc_api_key: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            n3fjp_host: "127.0.0.1".into(),
            n3fjp_port: 1100,
            udp_dest_ip: "127.0.0.1".into(),
            udp_dest_port: 12060,
            mycall_fallback: String::new(),
            log_path: None,
            enable_ohc_http: false,
            ohc_base_url: "http://localhost:3000".into(),
            ohc_api_key: String::new(),
        }
    }
}

impl BridgeConfig {
    /// N3FJP endpoint as a `host:port` string.
    pub fn n3fjp_addr(&self) -> String {
        format!("{}:{}", self.n3fjp_host, self.n3fjp_port)
    }

    /// Parse a config file, tolerating a UTF-8 BOM.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        serde_json::from_str(text).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Apply environment-style overrides from `lookup`.
    ///
    /// Unparseable numeric or boolean values are warned about and skipped;
    /// the layered value stands.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("N3FJP_HOST").filter(|v| !v.trim().is_empty()) {
            self.n3fjp_host = v.trim().to_string();
        }
        if let Some(v) = lookup("N3FJP_PORT") {
            match v.trim().parse() {
                Ok(port) => self.n3fjp_port = port,
                Err(_) => warn!(value = %v, "ignoring invalid N3FJP_PORT override"),
            }
        }
        if let Some(v) = lookup("UDP_DEST_IP").filter(|v| !v.trim().is_empty()) {
            self.udp_dest_ip = v.trim().to_string();
        }
        if let Some(v) = lookup("UDP_DEST_PORT") {
            match v.trim().parse() {
                Ok(port) => self.udp_dest_port = port,
                Err(_) => warn!(value = %v, "ignoring invalid UDP_DEST_PORT override"),
            }
        }
        if let Some(v) = lookup("MYCALL_FALLBACK") {
            self.mycall_fallback = v.trim().to_string();
        }
        if let Some(v) = lookup("LOG_PATH").filter(|v| !v.trim().is_empty()) {
            self.log_path = Some(PathBuf::from(v.trim()));
        }
        if let Some(v) = lookup("ENABLE_OHC_HTTP") {
            match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => self.enable_ohc_http = true,
                "false" | "0" => self.enable_ohc_http = false,
                _ => warn!(value = %v, "ignoring invalid ENABLE_OHC_HTTP override"),
            }
        }
        if let Some(v) = lookup("OHC_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.ohc_base_url = v.trim().to_string();
        }
        if let Some(v) = lookup("OHC_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.ohc_api_key = v.trim().to_string();
        }
    }
}

/// Paths searched for `config.json` when none is given explicitly.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("config.json")];
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join("config.json"));
        }
    }
    paths
}

/// Build the effective configuration.
///
/// Returns the config and the file it was loaded from, if any.
pub fn load(explicit: Option<&Path>) -> Result<(BridgeConfig, Option<PathBuf>)> {
    let (mut config, source) = match explicit {
        // An explicitly requested file must load.
        Some(path) => (BridgeConfig::from_file(path)?, Some(path.to_path_buf())),
        None => {
            let mut loaded = None;
            for path in candidate_paths() {
                if !path.exists() {
                    continue;
                }
                match BridgeConfig::from_file(&path) {
                    Ok(config) => {
                        loaded = Some((config, path));
                        break;
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "ignoring unreadable config file"),
                }
            }
            match loaded {
                Some((config, path)) => (config, Some(path)),
                None => (BridgeConfig::default(), None),
            }
        }
    };

    config.apply_overrides(|name| std::env::var(name).ok());
    Ok((config, source))
}
