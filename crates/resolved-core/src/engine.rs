//! [`ResolutionEngine`]: the resolve/unresolve state machine and the
//! comment-admission policy derived from it.
//!
//! Two guarded transitions exist:
//!
//! | Transition | Allowed for |
//! |------------|-------------|
//! | Unresolved → Resolved | holders of `resolution.manage` (or anything subsuming it) |
//! | Resolved → Unresolved | the same, plus the discussion's original author |
//!
//! Either transition may be re-applied to a discussion already in the target
//! state; the sub-record is rewritten and attribution goes to the last actor.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  authz::{Authorizer, Capability},
  discussion::{Discussion, Resolution, UserId},
  error::Operation,
  store::DiscussionStore,
  view::{DiscussionView, ResolutionToggle},
};

pub struct ResolutionEngine<S, A> {
  store: Arc<S>,
  authz: Arc<A>,
}

impl<S, A> Clone for ResolutionEngine<S, A> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      authz: Arc::clone(&self.authz),
    }
  }
}

impl<S, A> ResolutionEngine<S, A>
where
  S: DiscussionStore,
  A: Authorizer,
{
  pub fn new(store: Arc<S>, authz: Arc<A>) -> Self { Self { store, authz } }

  /// Whether `actor` may toggle resolution on any discussion.
  pub fn can_manage(&self, actor: UserId) -> bool {
    self.authz.holds(actor, Capability::ResolutionManage)
  }

  /// Whether `actor` may move `discussion` towards `resolve`.
  pub fn may_transition(&self, discussion: &Discussion, resolve: bool, actor: UserId) -> bool {
    self.can_manage(actor) || (!resolve && discussion.is_author(actor))
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// Resolve (`resolve == true`) or reopen a discussion.
  ///
  /// Returns the discussion with its new resolution so callers can branch on
  /// it without another read.
  pub async fn set_resolution(
    &self,
    discussion_id: Uuid,
    resolve: bool,
    actor: UserId,
  ) -> Result<Discussion> {
    let mut discussion = self.fetch(discussion_id).await?;

    if !self.may_transition(&discussion, resolve, actor) {
      debug!(%discussion_id, %actor, resolve, "resolution transition refused");
      return Err(Error::Forbidden {
        actor,
        operation: if resolve { Operation::Resolve } else { Operation::Unresolve },
      });
    }

    let resolution = Resolution::transition(resolve, actor, Utc::now());
    let found = self
      .store
      .set_resolution(discussion_id, resolution)
      .await
      .map_err(Error::store)?;
    if !found {
      // Deleted between the read and the write.
      return Err(Error::NotFound(discussion_id));
    }

    discussion.resolution = resolution;
    debug!(%discussion_id, %actor, resolve, "resolution updated");
    Ok(discussion)
  }

  /// Apply the "Resolved" checkbox submitted with a comment.
  ///
  /// Does nothing (`Ok(None)`) when the submission carried no flag or the
  /// actor is not allowed to manage resolution; otherwise behaves exactly
  /// like [`Self::set_resolution`].
  pub async fn on_comment_saved(
    &self,
    discussion_id: Uuid,
    resolved: Option<bool>,
    actor: UserId,
  ) -> Result<Option<Discussion>> {
    let Some(resolve) = resolved else {
      return Ok(None);
    };
    if !self.can_manage(actor) {
      return Ok(None);
    }
    self.set_resolution(discussion_id, resolve, actor).await.map(Some)
  }

  // ── Comment admission ─────────────────────────────────────────────────────

  /// Whether `actor` may add a comment to `discussion`.
  ///
  /// Excluded content types always admit. Otherwise an unresolved discussion
  /// admits everyone; a resolved one admits managers and the author.
  pub fn can_admit_comment(&self, discussion: &Discussion, actor: UserId) -> bool {
    discussion.is_excluded_type()
      || !discussion.is_resolved()
      || discussion.is_author(actor)
      || self.can_manage(actor)
  }

  /// Fallible form of [`Self::can_admit_comment`].
  pub fn check_comment_admission(&self, discussion: &Discussion, actor: UserId) -> Result<()> {
    if self.can_admit_comment(discussion, actor) {
      Ok(())
    } else {
      debug!(discussion_id = %discussion.discussion_id, %actor, "comment rejected: discussion resolved");
      Err(Error::DiscussionClosed(discussion.discussion_id))
    }
  }

  /// Load a discussion and check that `actor` may comment on it. Call before
  /// persisting a comment.
  pub async fn admit_comment(&self, discussion_id: Uuid, actor: UserId) -> Result<Discussion> {
    let discussion = self.fetch(discussion_id).await?;
    self.check_comment_admission(&discussion, actor)?;
    Ok(discussion)
  }

  // ── Presentation ──────────────────────────────────────────────────────────

  /// Compute what `actor` should see for `discussion`.
  ///
  /// `closed` comes from the same predicate as [`Self::admit_comment`], so
  /// the read path never offers a comment form the write path would reject.
  pub fn present(&self, discussion: Discussion, actor: UserId) -> DiscussionView {
    let manager = self.can_manage(actor);
    let resolved = discussion.is_resolved();
    let closed = !self.can_admit_comment(&discussion, actor);
    let unresolved_tag = manager && !resolved && !discussion.is_excluded_type();

    DiscussionView {
      closed,
      unresolved_tag,
      resolved_marker: manager && resolved,
      toggle: manager.then(|| ResolutionToggle::for_state(resolved)),
      resolve_on_reply: manager,
      discussion,
    }
  }

  /// Load a discussion and present it for `actor`.
  pub async fn view(&self, discussion_id: Uuid, actor: UserId) -> Result<DiscussionView> {
    let discussion = self.fetch(discussion_id).await?;
    Ok(self.present(discussion, actor))
  }

  async fn fetch(&self, discussion_id: Uuid) -> Result<Discussion> {
    self
      .store
      .get_discussion(discussion_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(discussion_id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    authz::StaticAuthorizer,
    discussion::{DiscussionType, NewComment},
    store::{DiscussionFilter, DiscussionStore, ForumStore},
    testing::MemoryStore,
  };

  const AUTHOR: UserId = UserId(42);
  const MANAGER: UserId = UserId(7);
  const MODERATOR: UserId = UserId(8);
  const STRANGER: UserId = UserId(99);

  fn engine() -> (Arc<MemoryStore>, ResolutionEngine<MemoryStore, StaticAuthorizer>) {
    let store = Arc::new(MemoryStore::default());
    let authz = StaticAuthorizer::new()
      .grant(MANAGER, Capability::ResolutionManage)
      .grant(MODERATOR, Capability::ModerationManage);
    (store.clone(), ResolutionEngine::new(store, Arc::new(authz)))
  }

  fn assert_consistent(d: &Discussion, resolved: bool) {
    assert_eq!(d.is_resolved(), resolved);
    assert_eq!(d.resolution.date_resolved().is_some(), resolved);
    assert_eq!(d.resolution.resolved_user_id().is_some(), resolved);
  }

  // ─── set_resolution ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn manager_resolves_and_reopens() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    let d = engine.set_resolution(id, true, MANAGER).await.unwrap();
    assert_consistent(&d, true);
    assert_eq!(d.resolution.resolved_user_id(), Some(MANAGER));
    assert_consistent(&store.get(id).unwrap(), true);

    let d = engine.set_resolution(id, false, MANAGER).await.unwrap();
    assert_consistent(&d, false);
    assert_consistent(&store.get(id).unwrap(), false);
  }

  #[tokio::test]
  async fn moderator_capability_satisfies_manage_check() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    let d = engine.set_resolution(id, true, MODERATOR).await.unwrap();
    assert_eq!(d.resolution.resolved_user_id(), Some(MODERATOR));
  }

  #[tokio::test]
  async fn repeated_resolve_reattributes_to_last_actor() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    engine.set_resolution(id, true, MANAGER).await.unwrap();
    let d = engine.set_resolution(id, true, MODERATOR).await.unwrap();

    assert!(d.is_resolved());
    assert_eq!(d.resolution.resolved_user_id(), Some(MODERATOR));
    assert_eq!(
      store.get(id).unwrap().resolution.resolved_user_id(),
      Some(MODERATOR)
    );
  }

  #[tokio::test]
  async fn repeated_unresolve_succeeds() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    engine.set_resolution(id, false, MANAGER).await.unwrap();
    let d = engine.set_resolution(id, false, MANAGER).await.unwrap();
    assert_consistent(&d, false);
  }

  #[tokio::test]
  async fn stranger_is_forbidden_both_ways() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    let err = engine.set_resolution(id, true, STRANGER).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { operation: Operation::Resolve, .. }));

    engine.set_resolution(id, true, MANAGER).await.unwrap();
    let err = engine.set_resolution(id, false, STRANGER).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { operation: Operation::Unresolve, .. }));
    assert!(store.get(id).unwrap().is_resolved());
  }

  #[tokio::test]
  async fn author_may_reopen_but_not_resolve() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    let err = engine.set_resolution(id, true, AUTHOR).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { actor, .. } if actor == AUTHOR));
    assert!(!store.get(id).unwrap().is_resolved());

    engine.set_resolution(id, true, MANAGER).await.unwrap();
    let d = engine.set_resolution(id, false, AUTHOR).await.unwrap();
    assert_consistent(&d, false);
  }

  #[tokio::test]
  async fn unknown_discussion_is_not_found() {
    let (_store, engine) = engine();
    let missing = Uuid::new_v4();
    let err = engine.set_resolution(missing, true, MANAGER).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(id) if id == missing));
  }

  // ─── Comment admission ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn resolved_discussion_rejects_outsiders_only() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);
    let d = engine.set_resolution(id, true, MANAGER).await.unwrap();

    assert!(!engine.can_admit_comment(&d, STRANGER));
    assert!(engine.can_admit_comment(&d, AUTHOR));
    assert!(engine.can_admit_comment(&d, MANAGER));
    assert!(engine.can_admit_comment(&d, MODERATOR));

    let err = engine.admit_comment(id, STRANGER).await.unwrap_err();
    assert!(matches!(err, Error::DiscussionClosed(_)));
  }

  #[tokio::test]
  async fn unresolved_discussion_admits_everyone() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);
    assert!(engine.admit_comment(id, STRANGER).await.is_ok());
  }

  #[tokio::test]
  async fn excluded_types_always_admit() {
    let (store, engine) = engine();
    for kind in [
      DiscussionType::Page,
      DiscussionType::Poll,
      DiscussionType::Report,
      DiscussionType::SimplePage,
    ] {
      let id = store.seed(Some(kind), AUTHOR, 0);
      let d = engine.set_resolution(id, true, MANAGER).await.unwrap();
      assert!(engine.can_admit_comment(&d, STRANGER));
      assert!(!engine.present(d, STRANGER).closed);
    }
  }

  #[tokio::test]
  async fn other_types_are_gated() {
    let (store, engine) = engine();
    let id = store.seed(Some(DiscussionType::Other("Question".into())), AUTHOR, 0);
    let d = engine.set_resolution(id, true, MANAGER).await.unwrap();
    assert!(!engine.can_admit_comment(&d, STRANGER));
  }

  // ─── on_comment_saved ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn comment_flag_from_manager_resolves() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    let d = engine.on_comment_saved(id, Some(true), MANAGER).await.unwrap();
    assert!(d.unwrap().is_resolved());

    let d = engine.on_comment_saved(id, Some(false), MODERATOR).await.unwrap();
    assert!(!d.unwrap().is_resolved());
  }

  #[tokio::test]
  async fn comment_flag_is_ignored_without_capability() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);
    engine.set_resolution(id, true, MANAGER).await.unwrap();

    // Even the author cannot reopen through the comment checkbox.
    assert!(engine.on_comment_saved(id, Some(false), AUTHOR).await.unwrap().is_none());
    assert!(engine.on_comment_saved(id, Some(true), STRANGER).await.unwrap().is_none());
    assert!(store.get(id).unwrap().is_resolved());
  }

  #[tokio::test]
  async fn comment_without_flag_is_a_no_op() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);
    assert!(engine.on_comment_saved(id, None, MANAGER).await.unwrap().is_none());
    assert!(!store.get(id).unwrap().is_resolved());
  }

  // ─── Presentation ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn view_flags_follow_actor_and_state() {
    let (store, engine) = engine();
    let id = store.seed(None, AUTHOR, 0);

    let v = engine.view(id, MANAGER).await.unwrap();
    assert!(v.unresolved_tag);
    assert!(!v.resolved_marker);
    assert_eq!(v.toggle, Some(ResolutionToggle { resolve: true, label: "Resolve" }));
    assert!(v.resolve_on_reply);

    let v = engine.view(id, STRANGER).await.unwrap();
    assert!(!v.unresolved_tag);
    assert!(v.toggle.is_none());
    assert!(!v.closed);

    engine.set_resolution(id, true, MANAGER).await.unwrap();

    let v = engine.view(id, MANAGER).await.unwrap();
    assert!(v.resolved_marker);
    assert!(!v.closed);
    assert_eq!(v.toggle, Some(ResolutionToggle { resolve: false, label: "Unresolve" }));

    assert!(engine.view(id, STRANGER).await.unwrap().closed);
    assert!(!engine.view(id, AUTHOR).await.unwrap().closed);
  }

  // ─── End to end ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn resolve_close_reopen_scenario() {
    let (store, engine) = engine();
    let participant = UserId(5);
    let id = store.seed(None, AUTHOR, 0);

    let err = engine.set_resolution(id, true, AUTHOR).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));

    let d = engine.set_resolution(id, true, MANAGER).await.unwrap();
    assert_consistent(&d, true);
    assert_eq!(d.resolution.resolved_user_id(), Some(MANAGER));

    let err = engine.admit_comment(id, participant).await.unwrap_err();
    assert!(matches!(err, Error::DiscussionClosed(_)));

    engine.set_resolution(id, false, AUTHOR).await.unwrap();

    for actor in [AUTHOR, participant] {
      engine.admit_comment(id, actor).await.unwrap();
      store
        .add_comment(NewComment {
          discussion_id:  id,
          insert_user_id: actor,
          body:           "back again".into(),
        })
        .await
        .unwrap();
    }
    assert_eq!(store.get(id).unwrap().count_comments, 2);
    assert_eq!(
      store.count_discussions(&DiscussionFilter::unresolved()).await.unwrap(),
      1
    );
  }
}
