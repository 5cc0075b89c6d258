//! Handlers for the unresolved-discussion listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/discussions/unresolved` | `?page=p2&limit=50` |
//! | `GET`  | `/discussions/unresolved/{page}` | Same, page token in the path |
//! | `GET`  | `/discussions/unresolved/count` | `{"count":3}` |
//!
//! Malformed page or limit values fall back to the first page and the
//! configured page size.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use resolved_core::{
  listing::{PageRequest, UnresolvedPage},
  store::ForumStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Actor, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:  Option<String>,
  pub limit: Option<String>,
}

impl ListParams {
  fn limit(&self) -> Option<usize> {
    self.limit.as_deref().and_then(|l| l.trim().parse().ok())
  }
}

/// `GET /discussions/unresolved[?page=<token>&limit=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<UnresolvedPage>, ApiError>
where
  S: ForumStore + 'static,
{
  let request = PageRequest::parse(params.page.as_deref(), params.limit());
  Ok(Json(state.listing.list_unresolved(actor, request).await?))
}

/// `GET /discussions/unresolved/{page}[?limit=<n>]`
pub async fn list_page<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(page): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<UnresolvedPage>, ApiError>
where
  S: ForumStore + 'static,
{
  let request = PageRequest::parse(Some(&page), params.limit());
  Ok(Json(state.listing.list_unresolved(actor, request).await?))
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
  pub count: u64,
}

/// `GET /discussions/unresolved/count`
///
/// The count is only shown to managers.
pub async fn count<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
) -> Result<Json<CountResponse>, ApiError>
where
  S: ForumStore + 'static,
{
  if !state.engine.can_manage(actor) {
    return Err(ApiError::Forbidden(format!(
      "user {actor} may not view the unresolved count"
    )));
  }
  let count = state.listing.count_unresolved().await?;
  Ok(Json(CountResponse { count }))
}
