//! [`UnresolvedListing`]: the badge count and the paginated list of
//! discussions still awaiting resolution.

use std::sync::Arc;

use serde::Serialize;

use crate::{
  Error, Result,
  authz::{Authorizer, Capability},
  discussion::{Discussion, UserId},
  error::Operation,
  store::{DiscussionFilter, DiscussionQuery, DiscussionStore},
};

pub const DEFAULT_PER_PAGE: usize = 30;
pub const DEFAULT_MAX_PER_PAGE: usize = 100;

// ─── Pagination ──────────────────────────────────────────────────────────────

/// A requested page. Construction never fails: malformed input is coerced to
/// the first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
  /// Zero-based page index.
  pub page:  usize,
  /// Requested page size; `None` or `0` means the configured default.
  pub limit: Option<usize>,
}

impl PageRequest {
  pub fn new(page: usize, limit: Option<usize>) -> Self { Self { page, limit } }

  /// Build from a raw page token as it arrives in a URL.
  ///
  /// Accepts a zero-based index (`"2"`) or the pager's one-based `pN` form
  /// (`"p3"` is index 2). Negative, non-numeric or missing input is page 0.
  pub fn parse(raw_page: Option<&str>, limit: Option<usize>) -> Self {
    Self {
      page: raw_page.map(parse_page_token).unwrap_or(0),
      limit,
    }
  }
}

fn parse_page_token(raw: &str) -> usize {
  let raw = raw.trim();
  if let Some(n) = raw.strip_prefix(['p', 'P']) {
    return n.parse::<usize>().map_or(0, |n| n.saturating_sub(1));
  }
  raw
    .parse::<i64>()
    .ok()
    .and_then(|n| usize::try_from(n).ok())
    .unwrap_or(0)
}

/// One page of unresolved discussions, with what a pager needs.
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedPage {
  pub discussions: Vec<Discussion>,
  pub total:       u64,
  pub page:        usize,
  pub limit:       usize,
  pub page_count:  u64,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct UnresolvedListing<S, A> {
  store:        Arc<S>,
  authz:        Arc<A>,
  per_page:     usize,
  max_per_page: usize,
}

impl<S, A> Clone for UnresolvedListing<S, A> {
  fn clone(&self) -> Self {
    Self {
      store:        Arc::clone(&self.store),
      authz:        Arc::clone(&self.authz),
      per_page:     self.per_page,
      max_per_page: self.max_per_page,
    }
  }
}

impl<S, A> UnresolvedListing<S, A>
where
  S: DiscussionStore,
  A: Authorizer,
{
  pub fn new(store: Arc<S>, authz: Arc<A>) -> Self {
    Self {
      store,
      authz,
      per_page: DEFAULT_PER_PAGE,
      max_per_page: DEFAULT_MAX_PER_PAGE,
    }
  }

  /// Override the default and maximum page sizes. Zero values are ignored;
  /// the default never exceeds the maximum.
  pub fn with_page_sizes(mut self, per_page: usize, max_per_page: usize) -> Self {
    if max_per_page > 0 {
      self.max_per_page = max_per_page;
    }
    if per_page > 0 {
      self.per_page = per_page;
    }
    self.per_page = self.per_page.min(self.max_per_page);
    self
  }

  /// The page size actually used for `requested`.
  pub fn effective_limit(&self, requested: Option<usize>) -> usize {
    match requested {
      Some(n) if n > 0 => n.min(self.max_per_page),
      _ => self.per_page,
    }
  }

  /// Number of unresolved ordinary discussions. Read straight from the store
  /// on every call.
  pub async fn count_unresolved(&self) -> Result<u64> {
    self
      .store
      .count_discussions(&DiscussionFilter::unresolved())
      .await
      .map_err(Error::store)
  }

  /// One page of unresolved ordinary discussions, most recent activity first.
  ///
  /// Requires the `resolution.manage` capability.
  pub async fn list_unresolved(&self, actor: UserId, request: PageRequest) -> Result<UnresolvedPage> {
    if !self.authz.holds(actor, Capability::ResolutionManage) {
      return Err(Error::Forbidden {
        actor,
        operation: Operation::ListUnresolved,
      });
    }

    let limit = self.effective_limit(request.limit);
    let query = DiscussionQuery {
      filter: DiscussionFilter::unresolved(),
      limit,
      offset: request.page.saturating_mul(limit),
    };
    let result = self
      .store
      .query_discussions(&query)
      .await
      .map_err(Error::store)?;

    Ok(UnresolvedPage {
      page_count: result.total.div_ceil(limit as u64),
      discussions: result.items,
      total: result.total,
      page: request.page,
      limit,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    authz::StaticAuthorizer, discussion::DiscussionType, engine::ResolutionEngine,
    testing::MemoryStore,
  };

  const MANAGER: UserId = UserId(7);
  const MEMBER: UserId = UserId(3);

  fn services() -> (
    Arc<MemoryStore>,
    ResolutionEngine<MemoryStore, StaticAuthorizer>,
    UnresolvedListing<MemoryStore, StaticAuthorizer>,
  ) {
    let store = Arc::new(MemoryStore::default());
    let authz = Arc::new(StaticAuthorizer::new().grant(MANAGER, Capability::ResolutionManage));
    (
      store.clone(),
      ResolutionEngine::new(store.clone(), authz.clone()),
      UnresolvedListing::new(store, authz),
    )
  }

  #[test]
  fn page_tokens() {
    assert_eq!(PageRequest::parse(None, None).page, 0);
    assert_eq!(PageRequest::parse(Some("3"), None).page, 3);
    assert_eq!(PageRequest::parse(Some(" 2 "), None).page, 2);
    assert_eq!(PageRequest::parse(Some("-4"), None).page, 0);
    assert_eq!(PageRequest::parse(Some("abc"), None).page, 0);
    assert_eq!(PageRequest::parse(Some("p1"), None).page, 0);
    assert_eq!(PageRequest::parse(Some("p3"), None).page, 2);
    assert_eq!(PageRequest::parse(Some("p0"), None).page, 0);
    assert_eq!(PageRequest::parse(Some("px"), None).page, 0);
  }

  #[test]
  fn effective_limit_defaults_and_clamps() {
    let (_, _, listing) = services();
    assert_eq!(listing.effective_limit(None), DEFAULT_PER_PAGE);
    assert_eq!(listing.effective_limit(Some(0)), DEFAULT_PER_PAGE);
    assert_eq!(listing.effective_limit(Some(5)), 5);
    assert_eq!(listing.effective_limit(Some(10_000)), DEFAULT_MAX_PER_PAGE);

    let listing = listing.with_page_sizes(10, 20);
    assert_eq!(listing.effective_limit(None), 10);
    assert_eq!(listing.effective_limit(Some(50)), 20);
  }

  #[test]
  fn lowering_max_clamps_default_page_size() {
    let (_, _, listing) = services();
    let listing = listing.with_page_sizes(0, 5);
    assert_eq!(listing.effective_limit(None), 5);
    assert_eq!(listing.effective_limit(Some(0)), 5);
    assert_eq!(listing.effective_limit(Some(9)), 5);
  }

  #[tokio::test]
  async fn count_skips_resolved_and_excluded() {
    let (store, engine, listing) = services();
    let a = store.seed(None, MEMBER, 3);
    store.seed(Some(DiscussionType::Other("Question".into())), MEMBER, 2);
    let page = store.seed(Some(DiscussionType::Page), MEMBER, 1);
    store.seed(Some(DiscussionType::Poll), MEMBER, 1);
    store.seed(Some(DiscussionType::Report), MEMBER, 1);
    store.seed(Some(DiscussionType::SimplePage), MEMBER, 1);

    assert_eq!(listing.count_unresolved().await.unwrap(), 2);

    engine.set_resolution(a, true, MANAGER).await.unwrap();
    assert_eq!(listing.count_unresolved().await.unwrap(), 1);

    // Transitions on excluded types never move the badge.
    engine.set_resolution(page, true, MANAGER).await.unwrap();
    assert_eq!(listing.count_unresolved().await.unwrap(), 1);
    engine.set_resolution(page, false, MANAGER).await.unwrap();
    assert_eq!(listing.count_unresolved().await.unwrap(), 1);

    engine.set_resolution(a, false, MANAGER).await.unwrap();
    assert_eq!(listing.count_unresolved().await.unwrap(), 2);
  }

  #[tokio::test]
  async fn list_paginates_most_recent_first() {
    let (store, _engine, listing) = services();
    let ids: Vec<_> = (0..5).map(|age| store.seed(None, MEMBER, age)).collect();

    let first = listing
      .list_unresolved(MANAGER, PageRequest::new(0, Some(2)))
      .await
      .unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.page_count, 3);
    assert_eq!(first.limit, 2);
    let got: Vec<_> = first.discussions.iter().map(|d| d.discussion_id).collect();
    assert_eq!(got, &ids[0..2]);

    let last = listing
      .list_unresolved(MANAGER, PageRequest::new(2, Some(2)))
      .await
      .unwrap();
    assert_eq!(last.discussions.len(), 1);
    assert_eq!(last.discussions[0].discussion_id, ids[4]);

    let beyond = listing
      .list_unresolved(MANAGER, PageRequest::new(9, Some(2)))
      .await
      .unwrap();
    assert!(beyond.discussions.is_empty());
    assert_eq!(beyond.total, 5);
  }

  #[tokio::test]
  async fn list_total_matches_count() {
    let (store, engine, listing) = services();
    for age in 0..4 {
      store.seed(None, MEMBER, age);
    }
    let resolved = store.seed(None, MEMBER, 10);
    engine.set_resolution(resolved, true, MANAGER).await.unwrap();
    store.seed(Some(DiscussionType::Poll), MEMBER, 0);

    let page = listing
      .list_unresolved(MANAGER, PageRequest::default())
      .await
      .unwrap();
    assert_eq!(page.total, listing.count_unresolved().await.unwrap());
    assert_eq!(page.total, 4);
    assert!(page.discussions.iter().all(|d| !d.is_resolved() && !d.is_excluded_type()));
  }

  #[tokio::test]
  async fn list_requires_capability() {
    let (_, _, listing) = services();
    let err = listing
      .list_unresolved(MEMBER, PageRequest::default())
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      Error::Forbidden { operation: Operation::ListUnresolved, .. }
    ));
  }
}
