//! `POST /discussions/{id}/comments`
//!
//! Admission is checked before the comment is written. A `"resolved"` flag in
//! the body is applied after the write, and only for managers.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use resolved_core::{
  discussion::{Comment, NewComment},
  store::ForumStore,
  view::DiscussionView,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body:     String,
  /// The "Resolved" checkbox under the comment form.
  #[serde(default)]
  pub resolved: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CommentCreated {
  pub comment:    Comment,
  pub discussion: DiscussionView,
}

pub async fn create<S>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ForumStore + 'static,
{
  if body.body.trim().is_empty() {
    return Err(ApiError::BadRequest("comment body must not be empty".into()));
  }

  state.engine.admit_comment(id, actor).await?;

  let comment = state
    .store
    .add_comment(NewComment {
      discussion_id:  id,
      insert_user_id: actor,
      body:           body.body,
    })
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("discussion {id} not found")))?;

  if let Some(d) = state.engine.on_comment_saved(id, body.resolved, actor).await? {
    info!(discussion_id = %id, %actor, resolved = d.is_resolved(), "resolution changed with comment");
  }

  let discussion = state.engine.view(id, actor).await?;
  Ok((StatusCode::CREATED, Json(CommentCreated { comment, discussion })))
}
