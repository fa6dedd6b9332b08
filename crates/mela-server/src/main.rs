//! Mela server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens
//! the SQLite store, and serves the discovery API over HTTP.
//!
//! # Token issuance
//!
//! Bearer tokens are normally minted by the identity service; for local
//! use the binary can mint one itself:
//!
//! ```
//! cargo run -p mela-server --bin server -- --issue-token <principal-uuid>
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{Duration, Utc};
use clap::Parser;
use mela_server::ServerConfig;
use mela_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Mela gathering discovery server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Mint a signed bearer token for the given principal id and exit.
  #[arg(long, value_name = "PRINCIPAL_ID")]
  issue_token: Option<Uuid>,

  /// Token lifetime in hours for `--issue-token`.
  #[arg(long, default_value_t = 24)]
  token_ttl_hours: i64,
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
    .add_source(config::Environment::with_prefix("MELA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Helper mode: mint a token and exit.
  if let Some(principal) = cli.issue_token {
    let expires_at = Utc::now() + Duration::hours(cli.token_ttl_hours);
    let token =
      mela_api::auth::issue_token(&server_cfg.auth_token_secret, principal, expires_at);
    println!("{token}");
    return Ok(());
  }

  // Expand `~` in store path and open the store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = mela_server::app_state(&server_cfg, store);
  let app = mela_server::router(state);

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
