use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use kino::backends::{JellyfinAdapter, MediaAdapter, PlexAdapter};
use kino::cache::CacheStore;
use kino::config::{Config, ServerType};
use kino::models::{BackendId, Credentials};
use kino::navigation::ColumnStack;
use kino::player::{PlayerLauncher, StartFlag};
use kino::services::{LibraryService, PlaybackService, PlaylistService, SearchService};
use kino::ui::{spawn_input_pump, Message};

#[derive(Parser, Debug)]
#[command(name = "kino", about = "An offline-first terminal client for Plex and Jellyfin")]
struct Cli {
    /// Override the config file path (defaults to the per-OS location).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Clears the persistent cache for the configured server before starting.
    #[arg(long)]
    clear_cache: bool,
}

fn cache_root() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from).unwrap_or_else(|| dirs::cache_dir().unwrap_or_default())
    } else {
        dirs::home_dir().unwrap_or_default().join(".local").join("share")
    };
    base.join("kino").join("cache")
}

fn init_tracing(config: &kino::config::LoggingConfig) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter, Registry};

    let level = config.level.to_ascii_lowercase();
    let filter = EnvFilter::new(format!("kino={level}"));
    // Human-readable layer for stderr, plus JSON-lines to the configured
    // file when one is set (spec §6.3); failures to open the file fall back
    // to stderr-only rather than aborting startup.
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if config.file.is_empty() {
        Registry::default().with(filter).with(stderr_layer).init();
        return;
    }

    match std::fs::OpenOptions::new().create(true).append(true).open(&config.file) {
        Ok(file) => {
            let file_layer = fmt::layer().json().with_writer(std::sync::Mutex::new(file));
            Registry::default().with(filter).with(file_layer).with(stderr_layer).init();
        }
        Err(err) => {
            Registry::default().with(filter).with(stderr_layer).init();
            error!(file = %config.file, error = %err, "failed to open log file, logging to stderr");
        }
    }
}

/// Builds the credential blob an adapter consumes from the raw config
/// fields, the way the (out-of-scope) auth flow would hand one off after
/// login.
fn build_credentials(config: &Config) -> Credentials {
    match config.server.server_type {
        ServerType::Plex => Credentials::Plex {
            token: config.server.token.clone(),
        },
        ServerType::Jellyfin => Credentials::Jellyfin {
            access_token: config.server.token.clone(),
            user_id: config.server.user_id.clone(),
        },
    }
}

fn build_adapter(config: &Config, cancel: CancellationToken) -> Arc<dyn MediaAdapter> {
    let backend_id = BackendId::new(&config.server.url);
    let credentials = build_credentials(config);
    match &credentials {
        Credentials::Plex { .. } => Arc::new(PlexAdapter::new(
            backend_id,
            config.server.url.clone(),
            credentials.token().to_string(),
            cancel,
        )),
        Credentials::Jellyfin { user_id, .. } => Arc::new(JellyfinAdapter::new(
            backend_id,
            config.server.url.clone(),
            credentials.token().to_string(),
            user_id.clone(),
            cancel,
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path).context("failed to load configuration")?;

    init_tracing(&config.logging);
    info!(configured = config.is_configured(), "starting kino");

    if !config.is_configured() {
        eprintln!("kino is not configured: set server.url and server.token in {}", config_path.display());
        return Ok(());
    }

    let store = Arc::new(CacheStore::open(Some(&cache_root()), &config.server.url).await?);
    if cli.clear_cache {
        store.invalidate_all().await?;
    }

    let cancel = CancellationToken::new();
    let adapter = build_adapter(&config, cancel.clone());

    let library_service = LibraryService::new(adapter.clone(), store.clone());
    let playlist_service = PlaylistService::new(adapter.clone(), store.clone());
    let search_service = SearchService::new(store.clone());

    let start_flag = if config.player.start_flag.is_empty() {
        None
    } else {
        Some(StartFlag::new(config.player.start_flag.clone()))
    };
    let launcher = PlayerLauncher::new(
        if config.player.command.is_empty() { None } else { Some(config.player.command.clone()) },
        config.player.args.clone(),
        start_flag,
    );
    let playback_service = PlaybackService::new(adapter.clone(), launcher);

    let libraries = library_service.get_libraries().await.context("failed to load libraries")?;
    info!(count = libraries.len(), "loaded libraries");

    let mut stack = ColumnStack::new();
    let _ = search_service.search(&libraries, "").await;
    let _ = playlist_service.get_cached_playlists().await;
    let _ = stack.depth();
    let _ = &playback_service;

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    spawn_input_pump(tx);

    // Rendering is out of scope (spec §1): this loop owns message dispatch
    // only. A real terminal frontend consumes `stack` and the service
    // layer read-only and renders on every message.
    while let Some(message) = rx.recv().await {
        match message {
            Message::Input(kino::ui::InputEvent::Quit) => break,
            other => {
                tracing::trace!(?other, "dispatched message");
            }
        }
    }

    cancel.cancel();
    Ok(())
}
