//! Encoding and decoding helpers between domain types and the plain column
//! values stored in SQLite.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order matches chronological order. UUIDs are
//! stored hyphenated and lowercase.

use chrono::{DateTime, SecondsFormat, Utc};
use resolved_core::discussion::{
  Comment, Discussion, DiscussionType, EXCLUDED_TYPE_TAGS, Resolution, UserId,
};
use resolved_core::store::DiscussionFilter;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// The three column values written for a resolution sub-record.
pub fn encode_resolution(r: &Resolution) -> (bool, Option<String>, Option<i64>) {
  (
    r.is_resolved(),
    r.date_resolved().map(encode_dt),
    r.resolved_user_id().map(|u| u.0),
  )
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// Render a filter as a `WHERE` clause over the `d` alias. Only constants are
/// interpolated.
pub fn filter_sql(filter: &DiscussionFilter) -> String {
  let mut conds: Vec<String> = vec![];
  if let Some(resolved) = filter.resolved {
    conds.push(format!("d.resolved = {}", i64::from(resolved)));
  }
  if filter.exclude_exempt {
    let tags = EXCLUDED_TYPE_TAGS
      .iter()
      .map(|t| format!("'{t}'"))
      .collect::<Vec<_>>()
      .join(", ");
    conds.push(format!("(d.type IS NULL OR d.type NOT IN ({tags}))"));
  }

  if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawDiscussion::from_row`].
pub const DISCUSSION_COLUMNS: &str = "d.discussion_id, d.type, d.name, d.body, d.insert_user_id,
  d.date_inserted, d.date_last_comment, d.count_comments,
  d.resolved, d.date_resolved, d.resolved_user_id";

/// Raw values read directly from a `discussions` row.
pub struct RawDiscussion {
  pub discussion_id:     String,
  pub kind:              Option<String>,
  pub name:              String,
  pub body:              String,
  pub insert_user_id:    i64,
  pub date_inserted:     String,
  pub date_last_comment: Option<String>,
  pub count_comments:    u32,
  pub resolved:          bool,
  pub date_resolved:     Option<String>,
  pub resolved_user_id:  Option<i64>,
}

impl RawDiscussion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      discussion_id:     row.get(0)?,
      kind:              row.get(1)?,
      name:              row.get(2)?,
      body:              row.get(3)?,
      insert_user_id:    row.get(4)?,
      date_inserted:     row.get(5)?,
      date_last_comment: row.get(6)?,
      count_comments:    row.get(7)?,
      resolved:          row.get(8)?,
      date_resolved:     row.get(9)?,
      resolved_user_id:  row.get(10)?,
    })
  }

  pub fn into_discussion(self) -> Result<Discussion> {
    let discussion_id = decode_uuid(&self.discussion_id)?;
    let date_resolved = self.date_resolved.as_deref().map(decode_dt).transpose()?;
    let resolution = Resolution::from_columns(
      self.resolved,
      date_resolved,
      self.resolved_user_id.map(UserId),
    )
    .ok_or(Error::CorruptResolution(discussion_id))?;

    Ok(Discussion {
      discussion_id,
      kind: self.kind.map(DiscussionType::from),
      name: self.name,
      body: self.body,
      insert_user_id: UserId(self.insert_user_id),
      date_inserted: decode_dt(&self.date_inserted)?,
      date_last_comment: self
        .date_last_comment
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      count_comments: self.count_comments,
      resolution,
    })
  }
}

/// Encoded values for inserting a comment row.
pub struct CommentRow {
  pub comment_id:     String,
  pub discussion_id:  String,
  pub insert_user_id: i64,
  pub body:           String,
  pub date_inserted:  String,
}

impl From<&Comment> for CommentRow {
  fn from(c: &Comment) -> Self {
    Self {
      comment_id:     encode_uuid(c.comment_id),
      discussion_id:  encode_uuid(c.discussion_id),
      insert_user_id: c.insert_user_id.0,
      body:           c.body.clone(),
      date_inserted:  encode_dt(c.date_inserted),
    }
  }
}
