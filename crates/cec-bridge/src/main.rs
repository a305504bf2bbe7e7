//! CEC bridge daemon entry point.
//!
//! # Usage
//!
//! ```text
//! cec-bridge [OPTIONS]
//!
//! Options:
//!   --config <PATH>           TOML configuration file [env: CEC_BRIDGE_CONFIG]
//!   --event-server <ADDR>     Override [event_server] address [env: CEC_BRIDGE_EVENT_SERVER]
//! ```
//!
//! # Startup
//!
//! ```text
//! main()
//!  └─ load_config()             -- defaults when no file is given
//!  └─ tracing init              -- RUST_LOG overrides [bridge] log_level
//!  └─ EventServerClient         -- UDP socket, ping task
//!  └─ NegotiateIdentityUseCase  -- addresses, vendor, hello
//!  └─ stdin frame pump ─► HandleNotificationUseCase loop (until Ctrl-C)
//!  └─ BYE
//! ```
//!
//! A fatal startup failure exits with status 255.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cec_bridge::application::handle_notification::HandleNotificationUseCase;
use cec_bridge::application::negotiate::NegotiateIdentityUseCase;
use cec_bridge::application::ports::{CecService, RemoteEventSink};
use cec_bridge::infrastructure::bus::{pump_frames, SimulatedBus};
use cec_bridge::infrastructure::config::{load_config, BridgeConfig};
use cec_bridge::infrastructure::event_server::{spawn_ping_task, EventServerClient};

/// Exit status for fatal startup failures.
const FATAL_EXIT: u8 = 255;

/// Depth of the queue between the bus service and the notification loop.
const NOTIFICATION_QUEUE: usize = 64;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// HDMI-CEC to media-center remote control bridge.
#[derive(Debug, Parser)]
#[command(
    name = "cec-bridge",
    about = "Forwards TV remote presses from the HDMI-CEC bus to a media center's event server",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    ///
    /// Built-in defaults apply when omitted or when the file does not exist.
    #[arg(long, env = "CEC_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Event server address, overriding `[event_server] address`.
    #[arg(long, env = "CEC_BRIDGE_EVENT_SERVER")]
    event_server: Option<String>,
}

impl Cli {
    /// Loads the configuration file and applies command-line overrides.
    fn resolve_config(&self) -> anyhow::Result<BridgeConfig> {
        let mut config = load_config(self.config.as_deref()).context("failed to load configuration")?;
        if let Some(address) = &self.event_server {
            config.event_server.address = address.clone();
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = cli.resolve_config();
    let level = config
        .as_ref()
        .map(|c| c.bridge.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let result = match config {
        Ok(config) => run(config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            info!("CEC bridge stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(FATAL_EXIT)
        }
    }
}

async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    info!("CEC bridge starting");

    let sim = &config.simulation;
    let bus: Arc<dyn CecService> = Arc::new(SimulatedBus::new(
        sim.physical_address,
        sim.logical_address(),
        sim.tv_vendor_id,
    ));

    let client = Arc::new(
        EventServerClient::connect(&config.event_server.address, config.bridge.device_map.clone())
            .await
            .with_context(|| format!("failed to reach event server {}", config.event_server.address))?,
    );
    let ping = spawn_ping_task(Arc::clone(&client), config.ping_interval());
    let events: Arc<dyn RemoteEventSink> = client;

    // ── Negotiation ───────────────────────────────────────────────────────────
    let negotiate = NegotiateIdentityUseCase::new(
        Arc::clone(&bus),
        Arc::clone(&events),
        config.negotiation_settings(),
    );
    let identity = tokio::select! {
        identity = negotiate.run() => identity?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received during negotiation");
            ping.abort();
            return Ok(());
        }
    };

    // ── Notification loop ─────────────────────────────────────────────────────
    let (tx, mut rx) = mpsc::channel(NOTIFICATION_QUEUE);
    let pump = tokio::spawn(pump_frames(BufReader::new(tokio::io::stdin()), tx));

    let handler = HandleNotificationUseCase::new(identity, bus, Arc::clone(&events));
    info!("CEC bridge ready.  Press Ctrl-C to exit.");
    handler
        .run_until(&mut rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await;

    // ── Shutdown ──────────────────────────────────────────────────────────────
    pump.abort();
    ping.abort();
    if let Err(e) = events.send_bye().await {
        warn!("could not say goodbye to the event server: {e}");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
