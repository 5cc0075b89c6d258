//! Discussion records and the resolution sub-record.
//!
//! The store owns discussions; this crate only ever writes the three
//! resolution fields, which are modelled together as [`Resolution`] so that
//! "resolved" and "has a date and a resolver" cannot disagree.

use std::fmt;

use chrono::{DateTime, SubsecRound as _, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Numeric identifier of a forum user.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

// ─── Type tag ────────────────────────────────────────────────────────────────

/// Tags of content types that are not ordinary discussions. They are exempt
/// from comment gating and never appear in unresolved listings.
pub const EXCLUDED_TYPE_TAGS: [&str; 4] = ["page", "Report", "poll", "SimplePage"];

/// The content category of a discussion. An ordinary discussion carries no
/// type tag at all (`Option::None` on [`Discussion::kind`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscussionType {
  /// Blog-style static page.
  Page,
  Poll,
  Report,
  SimplePage,
  /// Any other host-defined tag, e.g. `Question` or `Idea`.
  Other(String),
}

impl DiscussionType {
  /// The tag string stored in the `type` column.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Page => "page",
      Self::Poll => "poll",
      Self::Report => "Report",
      Self::SimplePage => "SimplePage",
      Self::Other(tag) => tag,
    }
  }

  pub fn from_tag(tag: &str) -> Self {
    match tag {
      "page" => Self::Page,
      "poll" => Self::Poll,
      "Report" => Self::Report,
      "SimplePage" => Self::SimplePage,
      other => Self::Other(other.to_owned()),
    }
  }

  /// Whether resolution semantics are switched off for this type.
  pub fn is_excluded(&self) -> bool { EXCLUDED_TYPE_TAGS.contains(&self.as_str()) }
}

impl From<String> for DiscussionType {
  fn from(tag: String) -> Self { Self::from_tag(&tag) }
}

impl From<DiscussionType> for String {
  fn from(kind: DiscussionType) -> Self { kind.as_str().to_owned() }
}

impl fmt::Display for DiscussionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// The resolution sub-record of a discussion.
///
/// Stored as three columns (`resolved`, `date_resolved`, `resolved_user_id`)
/// which are always written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
  #[default]
  Unresolved,
  Resolved {
    at: DateTime<Utc>,
    by: UserId,
  },
}

impl Resolution {
  /// The sub-record produced by a transition towards `resolve`.
  ///
  /// `now` is truncated to microseconds, the precision stores persist, so the
  /// returned record equals what a later read yields.
  pub fn transition(resolve: bool, actor: UserId, now: DateTime<Utc>) -> Self {
    if resolve {
      Self::Resolved { at: now.trunc_subsecs(6), by: actor }
    } else {
      Self::Unresolved
    }
  }

  /// Rebuild from the three stored columns. Returns `None` when the flag and
  /// the attribution columns disagree.
  pub fn from_columns(
    resolved: bool,
    date_resolved: Option<DateTime<Utc>>,
    resolved_user_id: Option<UserId>,
  ) -> Option<Self> {
    match (resolved, date_resolved, resolved_user_id) {
      (false, None, None) => Some(Self::Unresolved),
      (true, Some(at), Some(by)) => Some(Self::Resolved { at, by }),
      _ => None,
    }
  }

  pub fn is_resolved(&self) -> bool { matches!(self, Self::Resolved { .. }) }

  pub fn date_resolved(&self) -> Option<DateTime<Utc>> {
    match self {
      Self::Resolved { at, .. } => Some(*at),
      Self::Unresolved => None,
    }
  }

  pub fn resolved_user_id(&self) -> Option<UserId> {
    match self {
      Self::Resolved { by, .. } => Some(*by),
      Self::Unresolved => None,
    }
  }
}

// ─── Discussion ──────────────────────────────────────────────────────────────

/// A discussion thread as seen by the resolution subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
  pub discussion_id:     Uuid,
  /// `None` for an ordinary discussion.
  #[serde(rename = "type")]
  pub kind:              Option<DiscussionType>,
  pub name:              String,
  pub body:              String,
  /// The original author. Never changes after creation.
  pub insert_user_id:    UserId,
  pub date_inserted:     DateTime<Utc>,
  pub date_last_comment: Option<DateTime<Utc>>,
  pub count_comments:    u32,
  pub resolution:        Resolution,
}

impl Discussion {
  pub fn is_resolved(&self) -> bool { self.resolution.is_resolved() }

  pub fn is_author(&self, user: UserId) -> bool { self.insert_user_id == user }

  /// True for pages, polls, reports and simple pages.
  pub fn is_excluded_type(&self) -> bool {
    self.kind.as_ref().is_some_and(DiscussionType::is_excluded)
  }

  /// Timestamp used for "most recent activity first" ordering.
  pub fn last_activity(&self) -> DateTime<Utc> {
    self.date_last_comment.unwrap_or(self.date_inserted)
  }
}

/// Input to [`crate::store::ForumStore::create_discussion`].
#[derive(Debug, Clone)]
pub struct NewDiscussion {
  pub kind:           Option<DiscussionType>,
  pub name:           String,
  pub body:           String,
  pub insert_user_id: UserId,
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:     Uuid,
  pub discussion_id:  Uuid,
  pub insert_user_id: UserId,
  pub body:           String,
  pub date_inserted:  DateTime<Utc>,
}

/// Input to [`crate::store::ForumStore::add_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub discussion_id:  Uuid,
  pub insert_user_id: UserId,
  pub body:           String,
}
