//! tally server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the chat webhook over HTTP. The subcommands
//! other than `serve` administer the store and exit.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use tally_bot::{AppState, ServerConfig, local_clock, reminder};
use tally_core::{circle::NewCircle, moment::NewMoment};
use tally_store_sqlite::{SqliteStore, UserFlags};
use tokio::{net::TcpListener, sync::mpsc};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally attendance bot")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  action: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
  /// Serve the webhook and run reminders (the default).
  Serve,
  /// Create the database schema and exit.
  InitDb,
  /// Create a circle.
  AddCircle {
    name:        String,
    /// Refuse `/join` for this circle.
    #[arg(long)]
    closed:      bool,
    /// Code members must give to join.
    #[arg(long)]
    code:        Option<String>,
    /// Line appended to every status report.
    #[arg(long)]
    bottom_line: Option<String>,
  },
  /// Add a moment to an existing circle.
  AddMoment {
    circle:   String,
    name:     String,
    /// Time of day, `HH:MM` or `HH:MM:SS`.
    #[arg(value_parser = parse_time)]
    time:     NaiveTime,
    /// When to remind silent members, `HH:MM` or `HH:MM:SS`.
    #[arg(long, value_parser = parse_time)]
    reminder: NaiveTime,
  },
  /// Create the "Famiglia" circle with its two daily meals.
  SeedDefault,
  /// Change a user's preference flags.
  SetUser {
    tid:      i64,
    #[arg(long)]
    enabled:  Option<bool>,
    #[arg(long)]
    reminder: Option<bool>,
    #[arg(long)]
    loud:     Option<bool>,
  },
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
    .add_source(config::Environment::with_prefix("TALLY"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store; this also creates the schema.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.action.unwrap_or(Action::Serve) {
    Action::Serve => serve(store, server_cfg).await,
    Action::InitDb => {
      tracing::info!("Schema ready at {store_path:?}");
      Ok(())
    }
    Action::AddCircle { name, closed, code, bottom_line } => {
      store
        .create_circle(NewCircle { name, can_join: !closed, join_code: code, bottom_line })
        .await
        .context("failed to create circle")?;
      Ok(())
    }
    Action::AddMoment { circle, name, time, reminder } => {
      add_moment(&store, &circle, name, time, reminder).await
    }
    Action::SeedDefault => seed_default(&store).await,
    Action::SetUser { tid, enabled, reminder, loud } => {
      let user = store
        .update_user_flags(tid, UserFlags { enabled, reminder, loud })
        .await
        .context("failed to update user")?
        .with_context(|| format!("no user with id {tid}"))?;
      tracing::info!(
        tid,
        enabled = user.enabled,
        reminder = user.reminder,
        loud = user.loud,
        "updated user"
      );
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let clock = local_clock();

  if server_cfg.reminders {
    let moments = store.all_moments().await.context("failed to load moments")?;
    let (outbox, mut notifications) = mpsc::unbounded_channel();
    reminder::spawn(store.clone(), moments, clock.clone(), outbox);
    // No chat transport is wired in; deliveries are logged.
    tokio::spawn(async move {
      while let Some(n) = notifications.recv().await {
        tracing::info!(tid = n.tid, text = %n.text, "reminder");
      }
    });
  }

  let state = AppState {
    store,
    config: Arc::new(server_cfg.clone()),
    clock,
  };

  let app = tally_bot::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn add_moment(
  store: &SqliteStore,
  circle: &str,
  name: String,
  time: NaiveTime,
  reminder_time: NaiveTime,
) -> anyhow::Result<()> {
  let circle = store
    .circle_by_name(circle)
    .await?
    .with_context(|| format!("no circle named {circle}"))?;
  store
    .add_moment(NewMoment { circle_id: circle.circle_id, name, time, reminder_time })
    .await
    .context("failed to add moment")?;
  Ok(())
}

/// The household the bot was first written for.
async fn seed_default(store: &SqliteStore) -> anyhow::Result<()> {
  let circle = store
    .create_circle(NewCircle::open("Famiglia"))
    .await
    .context("failed to create circle")?;
  for (name, time, reminder_time) in [("cena", (15, 0), (18, 0)), ("pranzo", (22, 0), (10, 0))] {
    store
      .add_moment(NewMoment {
        circle_id:     circle.circle_id,
        name:          name.to_owned(),
        time:          hm(time)?,
        reminder_time: hm(reminder_time)?,
      })
      .await
      .context("failed to add moment")?;
  }
  Ok(())
}

fn hm((h, m): (u32, u32)) -> anyhow::Result<NaiveTime> {
  NaiveTime::from_hms_opt(h, m, 0).with_context(|| format!("invalid time {h}:{m}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
    .map_err(|e| format!("expected HH:MM or HH:MM:SS: {e}"))
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
