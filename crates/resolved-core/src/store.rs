//! The `DiscussionStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `resolved-store-sqlite`). The resolution engine and the unresolved listing
//! depend on this abstraction, never on a concrete backend.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::discussion::{Comment, Discussion, NewComment, NewDiscussion, Resolution};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Filter predicate over discussions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscussionFilter {
  /// Restrict to one resolution state.
  pub resolved:       Option<bool>,
  /// Drop pages, polls, reports and simple pages. Untyped (ordinary)
  /// discussions are always kept.
  pub exclude_exempt: bool,
}

impl DiscussionFilter {
  /// The predicate behind both the unresolved badge and the unresolved list.
  pub fn unresolved() -> Self {
    Self {
      resolved:       Some(false),
      exclude_exempt: true,
    }
  }

  /// Evaluate the predicate in memory. Backends that filter in SQL must agree
  /// with this.
  pub fn matches(&self, discussion: &Discussion) -> bool {
    if let Some(resolved) = self.resolved
      && discussion.is_resolved() != resolved
    {
      return false;
    }
    !(self.exclude_exempt && discussion.is_excluded_type())
  }
}

/// Parameters for [`DiscussionStore::query_discussions`].
#[derive(Debug, Clone, Copy)]
pub struct DiscussionQuery {
  pub filter: DiscussionFilter,
  pub limit:  usize,
  pub offset: usize,
}

/// One page of a filtered query plus the total number of matches.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionPage {
  /// Ordered most-recent-activity first.
  pub items: Vec<Discussion>,
  pub total: u64,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// The narrow slice of discussion storage the resolution subsystem needs.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DiscussionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a discussion by UUID. Returns `None` if not found.
  fn get_discussion(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Discussion>, Self::Error>> + Send + '_;

  /// Overwrite the resolution sub-record of a discussion in one write.
  ///
  /// Returns `false` if no discussion has that UUID.
  fn set_resolution(
    &self,
    id: Uuid,
    resolution: Resolution,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Return one page of discussions matching `query.filter`, ordered by most
  /// recent activity, together with the total match count.
  fn query_discussions<'a>(
    &'a self,
    query: &'a DiscussionQuery,
  ) -> impl Future<Output = Result<DiscussionPage, Self::Error>> + Send + 'a;

  /// Count distinct discussions matching `filter`.
  fn count_discussions<'a>(
    &'a self,
    filter: &'a DiscussionFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

/// Host-side writes that the resolution subsystem itself never performs.
pub trait ForumStore: DiscussionStore {
  /// Create and persist a new, unresolved discussion.
  fn create_discussion(
    &self,
    input: NewDiscussion,
  ) -> impl Future<Output = Result<Discussion, Self::Error>> + Send + '_;

  /// Persist a comment and bump the discussion's activity timestamp and
  /// comment count. Returns `None`, writing nothing, if the discussion does
  /// not exist.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;
}
