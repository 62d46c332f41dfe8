// qsobridge-bridge -- unattended daemon bridging the N3FJP logger's TCP API
// to an N1MM-style <contactinfo> UDP broadcast, with an optional
// OpenHamClock HTTP notification per logged contact.
//
// Usage:
//   qsobridge-bridge
//   qsobridge-bridge --config /path/to/config.json
//
// Configuration is layered (defaults, config.json, environment); see
// config.rs for the recognized keys. The process runs until killed; the
// only fatal startup error is a second instance already holding the guard
// port.

mod config;
mod instance;
mod notify;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use qsobridge_core::{ContactPublisher, ContactRecord};
use qsobridge_n1mm::UdpAnnouncer;
use qsobridge_n3fjp::{Supervisor, SupervisorConfig};

use crate::config::BridgeConfig;
use crate::notify::OhcNotifier;

/// N3FJP to N1MM-style UDP bridge daemon.
#[derive(Parser)]
#[command(name = "qsobridge-bridge", version, about)]
struct Cli {
    /// Path to config.json. Defaults to ./config.json, then config.json
    /// next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// The daemon's publisher stack: the UDP announcement always, the
/// OpenHamClock notification when enabled. The HTTP side never produces an
/// error and never delays the UDP packet.
struct BridgePublisher {
    udp: UdpAnnouncer,
    ohc: Option<OhcNotifier>,
}

#[async_trait]
impl ContactPublisher for BridgePublisher {
    async fn publish(&mut self, contact: &ContactRecord) -> qsobridge_core::Result<()> {
        let sent = self.udp.publish(contact).await;
        if let Some(ohc) = &self.ohc {
            ohc.notify(contact).await;
        }
        sent
    }
}

/// Install the tracing subscriber: stdout always, plus a non-blocking file
/// writer when a log path is configured. The returned guard must live for
/// the life of the process so buffered lines are flushed.
fn init_logging(log_path: Option<&Path>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(dir) = dir {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            }
            let file_name = path
                .file_name()
                .context("log path has no file name")?
                .to_owned();
            let appender = tracing_appender::rolling::never(
                dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, source) = config::load(cli.config.as_deref())?;
    let _log_guard = init_logging(config.log_path.as_deref())?;

    match &source {
        Some(path) => info!(path = %path.display(), "loaded config.json"),
        None => info!("no config.json found, using defaults"),
    }
    info!(
        n3fjp = %config.n3fjp_addr(),
        udp_dest = %format!("{}:{}", config.udp_dest_ip, config.udp_dest_port),
        mycall = %config.mycall_fallback,
        ohc_enabled = config.enable_ohc_http,
        "effective configuration"
    );

    let _instance = instance::acquire(instance::GUARD_PORT)
        .context("another bridge instance is already running")?;

    let dest: SocketAddr =
        tokio::net::lookup_host((config.udp_dest_ip.as_str(), config.udp_dest_port))
            .await
            .with_context(|| format!("failed to resolve {}", config.udp_dest_ip))?
            .next()
            .with_context(|| format!("no address for {}", config.udp_dest_ip))?;

    let udp = UdpAnnouncer::bind(dest, config.mycall_fallback.clone()).await?;
    let ohc = config.enable_ohc_http.then(|| {
        info!(base_url = %config.ohc_base_url, "OpenHamClock notifications enabled");
        OhcNotifier::new(
            &config.ohc_base_url,
            &config.ohc_api_key,
            &config.mycall_fallback,
        )
    });
    let mut publisher = BridgePublisher { udp, ohc };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    let mut supervisor = Supervisor::new(SupervisorConfig::new(config.n3fjp_addr()));
    supervisor.run(&mut publisher, cancel).await;

    info!(
        published = supervisor.published(),
        skipped = supervisor.skipped(),
        "bridge stopped"
    );
    Ok(())
}
