//! imob-server binary.
//!
//! Reads `imob.toml` (or the path specified with `--config`), overlays
//! `IMOB_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash`:
//!
//! ```
//! cargo run -p imob-server --bin server -- --hash-password
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use imob_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Imob customer records API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "imob.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    println!("{}", imob_server::hash_password(&password)?);
    return Ok(());
  }

  let config = imob_server::load_config(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
  tracing::debug!(?config, "configuration loaded");

  let store = SqliteStore::open_with_timeout(&config.database_path, config.database_timeout())
    .await
    .with_context(|| format!("failed to open store at {:?}", config.database_path))?;
  tracing::info!(path = ?config.database_path, "database connected");

  let state = imob_server::build_state(&config, store)
    .context("failed to build application state")?;
  let app = imob_server::app(&config, state).context("failed to build router")?;

  let address = config.address();
  tracing::info!(environment = ?config.environment, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to install Ctrl-C handler");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
