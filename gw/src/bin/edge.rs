//! Edge - the kiosk device client
//!
//! Polls the sensor board, watches the consent key, and keeps the link to
//! the brain alive.

use std::path::PathBuf;

use clap::Parser;
use eyre::Result;
use tracing::info;

use greenwall::edge::{run_reader, watch_stdin, ConsentLatch, SensorHub};
use greenwall::{logging, Config, EdgeClient};

#[derive(Parser, Debug)]
#[command(name = "edge")]
#[command(author, version, about = "Greenwall edge device client", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Brain address override
    #[arg(long)]
    host: Option<String>,

    /// Brain port override
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup(cli.verbose)?;

    let mut config = Config::load(cli.config.as_ref())?;
    if let Some(host) = cli.host {
        config.net.host = host;
    }
    if let Some(port) = cli.port {
        config.net.port = port;
    }
    config.ensure_work_dir()?;

    let sensors = SensorHub::new();
    let consent = ConsentLatch::new();

    {
        let hub = sensors.clone();
        let sensor_config = config.sensor.clone();
        tokio::task::spawn_blocking(move || run_reader(hub, sensor_config));
    }
    tokio::spawn(watch_stdin(consent.clone()));

    info!(brain = %config.net.addr(), "edge starting");
    EdgeClient::new(config, sensors, consent).run().await
}
