//! `wiresession` server binary.
//!
//! Loads configuration, installs logging and runs the TCP echo service until
//! Ctrl-C.

mod cli;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use wiresession::{
    config::{ServerConfig, Settings},
    service::{Service, TcpService, ctrl_c, run_services},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = Settings::load(&cli.config)?;
    let mut config = ServerConfig::from_settings(&settings)?;
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }

    let level = config.log.level.parse().unwrap_or(LevelFilter::DEBUG);
    tracing_subscriber::fmt().with_max_level(level).init();
    tracing::info!(mode = %config.mode, addr = %config.addr, "starting wiresession");

    if let Some(addr) = &config.metrics_addr {
        install_exporter(addr)?;
    }

    let mut services: Vec<Box<dyn Service>> = vec![Box::new(TcpService::new(config))];
    run_services(&mut services, ctrl_c()).await?;
    Ok(())
}

#[cfg(feature = "metrics")]
fn install_exporter(addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: std::net::SocketAddr = addr.parse()?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_exporter(addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::warn!(%addr, "metrics feature disabled; exporter not started");
    Ok(())
}
