//! Handlers for `/discussions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/discussions` | Body: `{"name":"Help","body":"…","type":"Question"}` |
//! | `GET`  | `/discussions/{id}` | 404 if not found |
//! | `POST` | `/discussions/{id}/resolve` | Body: `{"resolve":false}` reopens |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use resolved_core::{
  discussion::{DiscussionType, NewDiscussion},
  store::ForumStore,
  view::DiscussionView,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
  #[serde(default)]
  pub body: String,
  #[serde(rename = "type", default)]
  pub kind: Option<DiscussionType>,
}

/// `POST /discussions`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("name must not be empty".into()));
  }

  let discussion = state
    .store
    .create_discussion(NewDiscussion {
      kind:           body.kind,
      name:           body.name,
      body:           body.body,
      insert_user_id: actor,
    })
    .await
    .map_err(ApiError::store)?;

  info!(discussion_id = %discussion.discussion_id, %actor, "discussion created");
  Ok((StatusCode::CREATED, Json(state.engine.present(discussion, actor))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /discussions/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<DiscussionView>, ApiError>
where
  S: ForumStore + 'static,
{
  Ok(Json(state.engine.view(id, actor).await?))
}

// ─── Resolve / unresolve ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub resolve: bool,
}

/// `POST /discussions/{id}/resolve`
pub async fn resolve<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<DiscussionView>, ApiError>
where
  S: ForumStore + 'static,
{
  let discussion = state.engine.set_resolution(id, body.resolve, actor).await?;
  info!(discussion_id = %id, %actor, resolved = body.resolve, "resolution changed");
  Ok(Json(state.engine.present(discussion, actor)))
}
