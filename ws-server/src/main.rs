//! pulse-remote - stream PulseAudio mixer state over WebSocket

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pulse_server::{init_logging, LoggingMode, PulseServer, ServerConfig};
use pulse_state::BuildInfo;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pulse-remote")]
#[command(about = "Remote control for the local PulseAudio mixer over WebSocket")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "PULSE_REMOTE_ADDR", default_value = "0.0.0.0:8448")]
    addr: SocketAddr,

    /// Broadcast interval in milliseconds
    #[arg(long, env = "PULSE_REMOTE_INTERVAL_MS", default_value = "500")]
    interval_ms: u64,

    /// Per-client send deadline in milliseconds
    #[arg(long, env = "PULSE_REMOTE_SEND_TIMEOUT_MS", default_value = "10000")]
    send_timeout_ms: u64,

    /// pactl binary to invoke
    #[arg(long, env = "PULSE_REMOTE_PACTL", default_value = "pactl")]
    pactl: String,

    /// Log output: silent, development, debug or json
    #[arg(long, env = "PULSE_REMOTE_LOG_MODE", default_value = "development")]
    log_mode: LoggingMode,
}

impl Cli {
    fn config(&self) -> ServerConfig {
        ServerConfig::new()
            .with_bind_addr(self.addr)
            .with_broadcast_interval(Duration::from_millis(self.interval_ms))
            .with_send_timeout(Duration::from_millis(self.send_timeout_ms))
            .with_pactl_binary(self.pactl.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_mode).context("failed to initialise logging")?;

    let build = BuildInfo::current();
    info!(
        version = %build.git_version,
        commit = %build.git_commit,
        built = %build.build_date,
        platform = %build.platform,
        "starting pulse-remote"
    );

    let server = PulseServer::with_pactl(cli.config())
        .await
        .with_context(|| format!("failed to start server on {}", cli.addr))?;
    info!(addr = %server.local_addr(), "websocket endpoint at /api/v1/ws");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    server.shutdown().await;

    Ok(())
}
