//! HTTP surface for discussion resolution.
//!
//! Exposes an axum [`Router`] backed by any [`ForumStore`]. Every route
//! requires HTTP Basic auth; the authenticated login maps to the acting
//! forum user, and capabilities come from the configured user table.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/discussions` | Body: `{"name":…,"body":…,"type":…}` |
//! | `GET`  | `/discussions/{id}` | Discussion plus per-actor presentation flags |
//! | `POST` | `/discussions/{id}/resolve` | Body: `{"resolve":true}` |
//! | `POST` | `/discussions/{id}/comments` | Body: `{"body":…,"resolved":…}` |
//! | `GET`  | `/discussions/unresolved` | `?page=&limit=`, managers only |
//! | `GET`  | `/discussions/unresolved/{page}` | Path form of the page token |
//! | `GET`  | `/discussions/unresolved/count` | Badge count, managers only |

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use resolved_core::{
  authz::{Capability, StaticAuthorizer},
  discussion::UserId,
  engine::ResolutionEngine,
  listing::{DEFAULT_MAX_PER_PAGE, DEFAULT_PER_PAGE, UnresolvedListing},
  store::ForumStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use handlers::{comments, discussions, unresolved};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  #[serde(default = "default_per_page")]
  pub per_page:     usize,
  #[serde(default = "default_max_per_page")]
  pub max_per_page: usize,
  #[serde(default)]
  pub users:        Vec<UserConfig>,
}

/// One login and the forum identity and capabilities behind it.
#[derive(Deserialize, Clone)]
pub struct UserConfig {
  pub username:      String,
  pub password_hash: String,
  pub user_id:       i64,
  #[serde(default)]
  pub capabilities:  Vec<Capability>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/resolved/forum.db") }
fn default_per_page() -> usize { DEFAULT_PER_PAGE }
fn default_max_per_page() -> usize { DEFAULT_MAX_PER_PAGE }

impl ServerConfig {
  /// Capability grants for every configured user.
  pub fn authorizer(&self) -> StaticAuthorizer {
    self
      .users
      .iter()
      .flat_map(|u| u.capabilities.iter().map(move |c| (UserId(u.user_id), *c)))
      .collect()
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub engine:  ResolutionEngine<S, StaticAuthorizer>,
  pub listing: UnresolvedListing<S, StaticAuthorizer>,
  pub auth:    Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      engine:  self.engine.clone(),
      listing: self.listing.clone(),
      auth:    Arc::clone(&self.auth),
    }
  }
}

impl<S: ForumStore> AppState<S> {
  pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
    let authz = Arc::new(config.authorizer());
    Self {
      engine:  ResolutionEngine::new(Arc::clone(&store), Arc::clone(&authz)),
      listing: UnresolvedListing::new(Arc::clone(&store), authz)
        .with_page_sizes(config.per_page, config.max_per_page),
      auth:    Arc::new(AuthConfig::from_users(&config.users)),
      store,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the resolution server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ForumStore + 'static,
{
  Router::new()
    .route("/discussions",                    post(discussions::create::<S>))
    .route("/discussions/unresolved",         get(unresolved::list::<S>))
    .route("/discussions/unresolved/count",   get(unresolved::count::<S>))
    .route("/discussions/unresolved/{page}",  get(unresolved::list_page::<S>))
    .route("/discussions/{id}",               get(discussions::get_one::<S>))
    .route("/discussions/{id}/resolve",       post(discussions::resolve::<S>))
    .route("/discussions/{id}/comments",      post(comments::create::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
