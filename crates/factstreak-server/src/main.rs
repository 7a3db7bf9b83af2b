//! `factstreak` — operator CLI and JSON API server for the gamification store.
//!
//! Reads `config.toml` (or the path given with `--config`) and opens the
//! SQLite store it names.
//!
//! # Usage
//!
//! ```text
//! factstreak migrate                 # add the gamification columns (safe to re-run)
//! factstreak verify                  # show the live `users` columns
//! factstreak serve                   # migrate, then serve the JSON API
//! factstreak add-user alice
//! factstreak learn alice "Honey never spoils" --date 2024-01-10
//! factstreak progress alice
//! ```

mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use factstreak_core::{
  columns::{ColumnInfo, GAMIFICATION_COLUMNS, USERS_TABLE},
  store::{AccountDirectory, GamificationStore, SchemaEvolver},
};
use factstreak_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Fact-learning streaks over SQLite")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Add the gamification columns to `users`; columns already present are skipped.
  Migrate,
  /// Print the live `users` columns; fails if a gamification column is missing.
  Verify,
  /// Migrate, then serve the JSON API.
  Serve,
  /// Register a user.
  AddUser { username: String },
  /// Record that a user learned a fact.
  Learn {
    username: String,
    fact:     String,
    /// Day the fact was learned (defaults to today, UTC).
    #[arg(long)]
    date:     Option<NaiveDate>,
  },
  /// Print a user's gamification record as JSON.
  Progress { username: String },
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
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  store
    .set_busy_timeout(cfg.busy_timeout())
    .await
    .context("failed to set busy timeout")?;

  match cli.command {
    Command::Migrate => migrate(&store).await,
    Command::Verify => verify(&store).await,
    Command::Serve => serve(store, &cfg).await,
    Command::AddUser { username } => {
      let id = store.create_user(&username).await?;
      println!("created user {username:?} with id {id}");
      Ok(())
    }
    Command::Learn { username, fact, date } => {
      let today = date.unwrap_or_else(|| Utc::now().date_naive());
      let record = store.record_fact_learned(&username, fact, today).await?;
      println!("{}", serde_json::to_string_pretty(&record)?);
      Ok(())
    }
    Command::Progress { username } => {
      let record = store.get_progress(&username).await?;
      println!("{}", serde_json::to_string_pretty(&record)?);
      Ok(())
    }
  }
}

async fn migrate(store: &SqliteStore) -> anyhow::Result<()> {
  let report = store
    .ensure_columns(USERS_TABLE, &GAMIFICATION_COLUMNS)
    .await
    .context("schema evolution failed; fix the cause and re-run")?;

  println!("columns added: {:?}", report.added());
  println!("columns already present: {:?}", report.already_present());
  print_columns(&store.table_columns(USERS_TABLE).await?);
  Ok(())
}

async fn verify(store: &SqliteStore) -> anyhow::Result<()> {
  print_columns(&store.table_columns(USERS_TABLE).await?);

  let report = store.verify_columns(USERS_TABLE, &GAMIFICATION_COLUMNS).await?;
  if !report.is_complete() {
    anyhow::bail!("missing gamification columns: {}", report.missing.join(", "));
  }
  println!("all gamification columns present");
  Ok(())
}

async fn serve(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  store
    .ensure_columns(USERS_TABLE, &GAMIFICATION_COLUMNS)
    .await
    .context("schema evolution failed")?;

  let app = factstreak_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      tracing::info!("shutting down");
    })
    .await
    .context("server error")?;

  Ok(())
}

fn print_columns(columns: &[ColumnInfo]) {
  println!("{} table structure:", USERS_TABLE);
  for col in columns {
    let mut line = format!("  {}: {}", col.name, col.decl_type);
    if let Some(default) = &col.default_value {
      line.push_str(&format!(" DEFAULT {default}"));
    }
    if col.not_null {
      line.push_str(" NOT NULL");
    }
    if col.primary_key {
      line.push_str(" PRIMARY KEY");
    }
    println!("{line}");
  }
}
