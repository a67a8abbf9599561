//! urna-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `URNA_*`
//! environment variables, opens the SQLite store and serves the site over
//! HTTP.
//!
//! # First administrator
//!
//! Either post to `/admin/register` once, or create the account offline:
//!
//! ```sh
//! cargo run -p urna-web --bin urna-server -- --create-admin
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use urna_core::store::BallotStore;
use urna_store_sqlite::SqliteStore;
use urna_web::{AppState, ServerConfig, auth::hash_password};

#[derive(Parser)]
#[command(author, version, about = "Urna voting server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create the first administrator from a username and password read on
  /// stdin, then exit.
  #[arg(long)]
  create_admin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .set_default("host", "0.0.0.0")?
    .set_default("port", 5000)?
    .set_default("base_url", "http://localhost:5000")?
    .set_default("store_path", "db.sqlite3")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("URNA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.create_admin {
    return create_admin(&store).await;
  }

  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
  };

  let app = urna_web::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    base_url = %server_cfg.base_url,
    secure_cookies = server_cfg.secure_cookies,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Interactive counterpart of `POST /admin/register`.
async fn create_admin(store: &SqliteStore) -> anyhow::Result<()> {
  let username = prompt("Username: ")?.trim().to_string();
  let password = prompt("Password: ")?;
  if username.is_empty() || password.is_empty() {
    anyhow::bail!("username and password must not be empty");
  }

  let hash = hash_password(&password)?;
  match store.create_first_admin(username.clone(), hash).await? {
    Some(_) => println!("Administrator {username:?} created."),
    None => println!("An administrator already exists; nothing to do."),
  }
  Ok(())
}

/// Read one line from stdin. Only the line ending is removed; spaces are
/// part of a password.
fn prompt(label: &str) -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("{label}");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(strip_line_ending(&line).to_string())
}

fn strip_line_ending(line: &str) -> &str {
  line.trim_end_matches(['\r', '\n'])
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
