//! Binary entry point: parse args, load config, wire capabilities, serve.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use parrot::api::server::{start_server, AppState};
use parrot::cache::MemoryStore;
use parrot::config::Config;
use parrot::engine::OpenAiEngine;
use parrot::service::QueryService;

#[derive(Debug, Parser)]
#[command(name = "parrot", version, about = "Query-answering gateway with response caching")]
struct Args {
    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config.
    #[arg(long)]
    bind: Option<String>,

    /// Override the listen port from the config.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("parrot=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let store = Arc::new(MemoryStore::new(config.cache.max_entries));
    let engine = Arc::new(OpenAiEngine::from_config(&config.engine)?);
    let service = Arc::new(QueryService::new(
        store,
        engine,
        Duration::from_secs(config.cache.ttl_secs),
    ));

    tracing::info!(
        ttl_secs = config.cache.ttl_secs,
        store = service.store_name(),
        "Starting gateway"
    );

    start_server(&config.server, AppState::new(service)).await?;
    Ok(())
}
