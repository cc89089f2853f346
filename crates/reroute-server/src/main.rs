//! reroute server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and fronts the configured origin: requests that
//! resolve to a redirect get one, everything else is declined so the origin's
//! own not-found handling applies. The management API is nested under
//! `/api`, lifecycle events arrive on `POST /events`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use reroute_core::{
  resolve::{Resolver, ResolverConfig},
  watcher::Watcher,
};
use reroute_server::{AppState, ServerConfig, probe::ProbeOracle};
use reroute_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Reroute redirect server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("REROUTE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  // Existence oracle: HEAD probes against the origin.
  let oracle = Arc::new(ProbeOracle::new(&server_cfg.origin_url));

  let resolver = Arc::new(Resolver::new(
    store.clone(),
    oracle,
    ResolverConfig {
      enable_fallback: server_cfg.enable_fallback,
      fallback_kind:   server_cfg.default_kind,
    },
  ));

  // Build application state.
  let state = AppState {
    store:    store.clone(),
    resolver,
    watcher:  Arc::new(Watcher::new(store)),
    config:   Arc::new(server_cfg.clone()),
  };

  let app = reroute_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
