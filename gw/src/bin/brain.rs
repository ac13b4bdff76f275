//! Brain - the conversation server
//!
//! Listens for the edge device and drives each kiosk conversation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use greenwall::llm::OllamaClient;
use greenwall::speech::{EspeakSynthesizer, WhisperTranscriber};
use greenwall::{logging, BrainServer, Config};

#[derive(Parser, Debug)]
#[command(name = "brain")]
#[command(author, version, about = "Greenwall conversation server", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address override
    #[arg(long)]
    host: Option<String>,

    /// Listen port override
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

    let synth = Arc::new(EspeakSynthesizer::new(&config.speech, &config.audio));
    let transcriber = Arc::new(WhisperTranscriber::new(&config.speech));
    let responder = Arc::new(OllamaClient::from_config(&config.llm).context("Failed to build Ollama client")?);

    info!(addr = %config.net.addr(), model = %config.llm.model, "brain starting");
    BrainServer::new(config, synth, transcriber, responder).run().await
}
