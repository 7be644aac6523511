//! kinroll server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `KINROLL__*` environment variables, opens the SQLite store, and serves the
//! enrollment API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```
//! cargo run -p kinroll-server --bin kinroll -- --hash-password
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use kinroll_server::{
  AppState,
  ServerConfig,
  cloudinary::CloudinaryClient,
  password::hash_password,
};
use kinroll_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Family registry enrollment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let hash = hash_password(&password).context("failed to hash password")?;
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = load_config(cli.config)?;
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = kinroll_server::router(build_state(server_cfg).await?);

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("kinroll listening on http://{address}");

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Layer `KINROLL__*` variables over the optional config file.
fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("KINROLL")
        .prefix_separator("__")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?
    .try_deserialize()
    .context("invalid server configuration")
}

async fn build_state(
  server_cfg: ServerConfig,
) -> anyhow::Result<AppState<SqliteStore, CloudinaryClient>> {
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open member store at {store_path:?}"))?;
  tracing::info!(path = ?store_path, "member store open");

  let photos = CloudinaryClient::new(server_cfg.photos.clone());
  Ok(AppState::new(store, photos, server_cfg))
}

/// Prompt on stderr so stdout carries only the hash.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead as _, Write as _};

  eprint!("Password: ");
  io::stderr().flush().ok();

  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\r', '\n']);
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password.to_owned())
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
