//! Chat front end for Tally.
//!
//! Exposes an axum [`Router`] that accepts chat updates as JSON, runs them
//! through the command [`facade`] against a [`SqliteStore`], and answers with
//! the reply texts. The [`reminder`] jobs run alongside it.

pub mod command;
pub mod facade;
pub mod reminder;
pub mod reply;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::State,
  http::StatusCode,
  routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tally_core::user::Profile;
use tally_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Run the daily reminder jobs.
  #[serde(default = "enabled")]
  pub reminders:  bool,
}

fn enabled() -> bool { true }

// ─── Application state ────────────────────────────────────────────────────────

/// Source of the current local wall-clock time.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// The host's local time.
pub fn local_clock() -> Clock { Arc::new(|| chrono::Local::now().naive_local()) }

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub store:  SqliteStore,
  pub config: Arc<ServerConfig>,
  pub clock:  Clock,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// One incoming chat message.
#[derive(Debug, Deserialize)]
pub struct Update {
  pub from: Profile,
  #[serde(default)]
  pub text: String,
}

/// The texts to send back to the sender, in order.
#[derive(Debug, Serialize, Deserialize)]
pub struct Replies {
  pub replies: Vec<String>,
}

/// Build an axum [`Router`] for the bot.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/updates", post(update_handler))
    .route("/health", get(health_handler))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Route handlers ──────────────────────────────────────────────────────────

async fn update_handler(
  State(state): State<AppState>,
  Json(update): Json<Update>,
) -> Json<Replies> {
  let now = (state.clock)();
  let replies = facade::handle(&state.store, update.from, &update.text, now).await;
  Json(Replies { replies })
}

async fn health_handler() -> StatusCode { StatusCode::NO_CONTENT }

// ─── Integration tests ────────────────────────────────────────────────────────
