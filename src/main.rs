// src/main.rs - localchat entry point

use clap::Parser;
use std::sync::{Arc, Mutex};

use localchat::chat::autosave::PersistScheduler;
use localchat::chat::{ChatController, SessionManager, SessionStore};
use localchat::cli::{Cli, Commands};
use localchat::infra::config::Config;
use localchat::infra::logger;
use localchat::provider::ollama::OllamaClient;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    if let Some(model) = cli.model {
        config.backend.model = model;
    }
    if let Some(backend) = cli.backend {
        config.backend.base_url = backend;
    }

    match cli.command {
        Some(Commands::Relay { port, upstream }) => {
            if let Some(port) = port {
                config.relay.port = port;
            }
            if let Some(upstream) = upstream {
                config.relay.upstream = upstream;
            }
            return localchat::relay::start_server(&config.relay).await;
        }
        Some(Commands::Sessions) => {
            localchat::cli::sessions::list_sessions(&open_store(&config));
            return Ok(());
        }
        Some(Commands::Clear) => {
            let mut manager = SessionManager::open(open_store(&config));
            localchat::cli::sessions::clear_sessions(&mut manager);
            return Ok(());
        }
        Some(Commands::Chat) | None => {}
    }

    let client = OllamaClient::from_config(&config.backend)?;
    if let Err(e) = client.probe().await {
        tracing::warn!("{}", e);
        eprintln!("warning: backend at {} is not answering yet", client.base_url());
    }

    let manager = Arc::new(Mutex::new(SessionManager::open(open_store(&config))));
    let scheduler = PersistScheduler::start(manager.clone(), config.storage.autosave_interval());
    let controller = ChatController::new(manager, Arc::new(client));

    let result = localchat::cli::chat::run_chat(
        &controller,
        &config.backend.model,
        &config.backend.base_url,
    )
    .await;

    scheduler.stop().await;
    controller.flush();
    result
}

fn open_store(config: &Config) -> SessionStore {
    let dir = config.storage.data_dir();
    tracing::debug!("Chat data in {}", dir.display());
    SessionStore::open_dir(dir, config.storage.max_bytes)
}
