//! Optional OpenHamClock notification.
//!
//! When enabled, each completed contact is also POSTed to an OpenHamClock
//! instance as JSON. This is strictly a side output: failures of any kind
//! (unreachable host, non-2xx status) are logged and swallowed, the main
//! transaction is never retried, and nothing here feeds back into the
//! session state machine. The one concession to convenience, carried over
//! from operator setups where OpenHamClock moves between its two stock
//! ports, is a single same-process retry against `:3001` when a base URL on
//! `:3000` refuses the connection.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{info, warn};

use qsobridge_core::{ContactRecord, mhz_to_khz};

/// Fixed path the OpenHamClock QSO endpoint lives at.
const QSO_PATH: &str = "/api/n3fjp/qso";

/// `source` tag identifying this bridge in the payload.
const SOURCE_TAG: &str = "qsobridge";

/// Bound on each POST, fallback attempt included.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Best-effort OpenHamClock QSO notifier.
pub struct OhcNotifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    my_call: String,
}

impl OhcNotifier {
    /// Create a notifier for the given base URL (trailing slash tolerated).
    pub fn new(base_url: &str, api_key: &str, my_call: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            my_call: my_call.trim().to_string(),
        }
    }

    /// Notify OpenHamClock of one completed contact. Never fails: every
    /// outcome is reduced to a log line.
    pub async fn notify(&self, contact: &ContactRecord) {
        let payload = build_payload(contact, &self.my_call, Utc::now());
        let url = format!("{}{}", self.base_url, QSO_PATH);

        match self.post(&url, &payload).await {
            Ok(()) => {}
            Err(e) => {
                warn!(url = %url, error = %e, "OHC POST failed");
                // OpenHamClock installs commonly sit on :3001 instead.
                if self.base_url.contains(":3000") {
                    let alt_url =
                        format!("{}{}", self.base_url.replace(":3000", ":3001"), QSO_PATH);
                    if let Err(e) = self.post(&alt_url, &payload).await {
                        warn!(url = %alt_url, error = %e, "OHC POST failed (fallback)");
                    }
                }
            }
        }
    }

    /// One POST attempt. A non-2xx status is logged here and treated as
    /// delivered (no fallback), matching the "never retry the transaction"
    /// contract.
    async fn post(&self, url: &str, payload: &Value) -> reqwest::Result<()> {
        let mut request = self.client.post(url).json(payload);
        if !self.api_key.is_empty() {
            request = request.header("X-API-Key", &self.api_key);
        }
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            info!(url = %url, "OHC POST ok");
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, body = %body, "OHC rejected notification");
        }
        Ok(())
    }
}

/// Build the notification payload.
///
/// `de_call` and `dx_grid` are only present when known, and a zero
/// frequency becomes a JSON null rather than a bogus 0.
fn build_payload(contact: &ContactRecord, my_call: &str, now: DateTime<Utc>) -> Value {
    let freq_khz = mhz_to_khz(contact.freq_mhz);
    let mut payload = json!({
        "ts_utc": now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "dx_call": contact.call,
        "band_mhz": contact.band.rep_freq_mhz(),
        "freq_khz": if freq_khz > 0 { json!(freq_khz) } else { Value::Null },
        "mode": contact.mode,
        "source": SOURCE_TAG,
    });

    if !my_call.is_empty() {
        payload["de_call"] = json!(my_call.to_ascii_uppercase());
    }
    if let Some(grid) = &contact.grid {
        payload["dx_grid"] = json!(grid);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use qsobridge_core::Band;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn sample_contact() -> ContactRecord {
        ContactRecord {
            call: "W1AW".into(),
            grid: Some("FN31".into()),
            band: Band::B40m,
            freq_mhz: 7.188,
            mode: "SSB".into(),
        }
    }

    fn sample_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 14, 2, 11).unwrap()
    }

    #[test]
    fn payload_mandatory_fields() {
        let payload = build_payload(&sample_contact(), "ab1cd", sample_now());
        assert_eq!(payload["ts_utc"], "2026-08-06T14:02:11Z");
        assert_eq!(payload["dx_call"], "W1AW");
        assert_eq!(payload["band_mhz"], 7.0);
        assert_eq!(payload["freq_khz"], 7188);
        assert_eq!(payload["mode"], "SSB");
        assert_eq!(payload["source"], "qsobridge");
        assert_eq!(payload["de_call"], "AB1CD");
        assert_eq!(payload["dx_grid"], "FN31");
    }

    #[test]
    fn payload_omits_unknown_operator_and_grid() {
        let mut contact = sample_contact();
        contact.grid = None;
        let payload = build_payload(&contact, "", sample_now());
        assert!(payload.get("de_call").is_none());
        assert!(payload.get("dx_grid").is_none());
    }

    #[test]
    fn payload_zero_frequency_is_null() {
        let mut contact = sample_contact();
        contact.freq_mhz = 0.0;
        let payload = build_payload(&contact, "", sample_now());
        assert_eq!(payload["freq_khz"], Value::Null);
    }

    /// Minimal HTTP server: accept one connection, read the request head,
    /// reply with the given status line, and hand back the request text.
    async fn one_shot_http(listener: TcpListener, status_line: &'static str) -> String {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            // Headers end; the body follows within the same segment for a
            // payload this small, so one more bounded read settles it.
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!("{status_line}\r\ncontent-length: 0\r\n\r\n");
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
        String::from_utf8_lossy(&request).to_string()
    }

    #[tokio::test]
    async fn notify_posts_to_qso_path() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(one_shot_http(listener, "HTTP/1.1 200 OK"));

        let notifier = OhcNotifier::new(&format!("http://{addr}/"), "secret", "AB1CD");
        notifier.notify(&sample_contact()).await;

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/n3fjp/qso HTTP/1.1"));
        assert!(request.contains("x-api-key: secret") || request.contains("X-API-Key: secret"));
    }

    #[tokio::test]
    async fn notify_swallows_server_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(one_shot_http(listener, "HTTP/1.1 500 Internal Server Error"));

        let notifier = OhcNotifier::new(&format!("http://{addr}"), "", "");
        // Must not panic or error.
        notifier.notify(&sample_contact()).await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn notify_swallows_unreachable_endpoint() {
        // Reserve a port and close it again so the connect is refused.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = OhcNotifier::new(&format!("http://{addr}"), "", "");
        notifier.notify(&sample_contact()).await;
    }
}
