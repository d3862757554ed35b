//! frontdeskd - front-desk agent daemon entry point.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use frontdesk_common::config::AgentConfig;
use frontdeskd::llm::{FallbackProvider, ModelProvider, OllamaProvider};
use frontdeskd::{seed, server, turn::TurnEngine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "frontdeskd", version, about = "Practice front-desk agent daemon")]
struct Args {
    /// Path to the TOML config file.
    #[arg(long, default_value = "/etc/frontdesk/frontdeskd.toml")]
    config: String,

    /// Override the listen address from the config.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AgentConfig::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    info!(
        "frontdeskd v{} starting for {}",
        env!("CARGO_PKG_VERSION"),
        config.practice.name
    );

    let primary: Box<dyn ModelProvider> = Box::new(OllamaProvider::new(
        &config.model.endpoint,
        &config.model.primary,
        config.model.timeout_secs,
    ));
    let secondary: Box<dyn ModelProvider> = Box::new(OllamaProvider::new(
        &config.model.endpoint,
        &config.model.fallback,
        config.model.timeout_secs,
    ));
    let provider: Arc<dyn ModelProvider> = Arc::new(FallbackProvider::new(primary, secondary));

    if !provider.is_available().await {
        warn!(
            "[-]  model endpoint {} not reachable; turns will degrade to scripted fallbacks",
            config.model.endpoint
        );
    }

    let directory = Arc::new(seed::demo_directory());
    let slots = seed::demo_slots();
    info!(
        "directory loaded: {} patients, {} slots",
        directory.patients.len(),
        slots.available().len()
    );

    let listen_addr = config.listen_addr.clone();
    let engine = Arc::new(TurnEngine::new(config, provider, directory, slots));
    info!("{} tools registered", engine.registry().len());

    server::run(engine, &listen_addr).await
}
