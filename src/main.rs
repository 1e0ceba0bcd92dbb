mod api;
mod app;
mod auth_store;
mod cache;
mod commands;
mod config;
mod debounce;
mod event;
mod logging;
mod pagination;
mod query;
mod session;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dashdeck")]
#[command(about = "A terminal admin dashboard for user and product collections")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/dashdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the collection service
  #[arg(short, long)]
  base_url: Option<String>,

  /// Username to pre-fill on the login screen
  #[arg(short, long)]
  username: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }
  if let Some(username) = args.username {
    config.api.username = Some(username);
  }

  // Flushes buffered log lines on drop
  let _log_guard = logging::init(&config.log)?;
  info!(
    base_url = %config.api.base_url,
    cache_enabled = config.cache.enabled,
    ttl_secs = config.cache.ttl_secs,
    "starting dashdeck"
  );

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
