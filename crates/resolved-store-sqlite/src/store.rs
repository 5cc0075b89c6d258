//! [`SqliteStore`], the SQLite implementation of [`DiscussionStore`] and
//! [`ForumStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use resolved_core::{
  discussion::{Comment, Discussion, NewComment, NewDiscussion, Resolution},
  store::{DiscussionFilter, DiscussionPage, DiscussionQuery, DiscussionStore, ForumStore},
};

use crate::{
  Error, Result,
  encode::{
    CommentRow, DISCUSSION_COLUMNS, RawDiscussion, encode_dt, encode_resolution, encode_uuid,
    filter_sql,
  },
  schema,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A discussion store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::from_connection(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::from_connection(conn).await
  }

  /// Wrap an existing connection, migrating whatever schema it carries.
  pub async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        schema::migrate(conn)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }
}

// ─── DiscussionStore impl ────────────────────────────────────────────────────

impl DiscussionStore for SqliteStore {
  type Error = Error;

  async fn get_discussion(&self, id: Uuid) -> Result<Option<Discussion>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDiscussion> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {DISCUSSION_COLUMNS} FROM discussions d WHERE d.discussion_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawDiscussion::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDiscussion::into_discussion).transpose()
  }

  async fn set_resolution(&self, id: Uuid, resolution: Resolution) -> Result<bool> {
    let id_str = encode_uuid(id);
    let (resolved, date_str, user_id) = encode_resolution(&resolution);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE discussions
             SET resolved = ?2, date_resolved = ?3, resolved_user_id = ?4
           WHERE discussion_id = ?1",
          rusqlite::params![id_str, resolved, date_str, user_id],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn query_discussions(&self, query: &DiscussionQuery) -> Result<DiscussionPage> {
    let where_clause = filter_sql(&query.filter);
    let limit_val = i64::try_from(query.limit).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(query.offset).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<RawDiscussion>) = self
      .conn
      .call(move |conn| {
        // One transaction so the total and the page agree.
        let tx = conn.transaction()?;

        let total: i64 = tx.query_row(
          &format!("SELECT COUNT(DISTINCT d.discussion_id) FROM discussions d {where_clause}"),
          [],
          |row| row.get(0),
        )?;

        let sql = format!(
          "SELECT {DISCUSSION_COLUMNS}
           FROM discussions d
           {where_clause}
           ORDER BY COALESCE(d.date_last_comment, d.date_inserted) DESC, d.discussion_id
           LIMIT ?1 OFFSET ?2"
        );
        let rows = {
          let mut stmt = tx.prepare(&sql)?;
          stmt
            .query_map(rusqlite::params![limit_val, offset_val], RawDiscussion::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok((total, rows))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawDiscussion::into_discussion)
      .collect::<Result<_>>()?;

    Ok(DiscussionPage {
      items,
      total: total.max(0) as u64,
    })
  }

  async fn count_discussions(&self, filter: &DiscussionFilter) -> Result<u64> {
    let sql = format!(
      "SELECT COUNT(DISTINCT d.discussion_id) FROM discussions d {}",
      filter_sql(filter)
    );

    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
      .await?;

    Ok(n.max(0) as u64)
  }
}

// ─── ForumStore impl ─────────────────────────────────────────────────────────

impl ForumStore for SqliteStore {
  async fn create_discussion(&self, input: NewDiscussion) -> Result<Discussion> {
    let discussion = Discussion {
      discussion_id:     Uuid::new_v4(),
      kind:              input.kind,
      name:              input.name,
      body:              input.body,
      insert_user_id:    input.insert_user_id,
      date_inserted:     Utc::now(),
      date_last_comment: None,
      count_comments:    0,
      resolution:        Resolution::Unresolved,
    };

    let id_str   = encode_uuid(discussion.discussion_id);
    let kind_str = discussion.kind.as_ref().map(|k| k.as_str().to_owned());
    let name     = discussion.name.clone();
    let body     = discussion.body.clone();
    let author   = discussion.insert_user_id.0;
    let at_str   = encode_dt(discussion.date_inserted);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO discussions (
             discussion_id, type, name, body, insert_user_id, date_inserted
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, kind_str, name, body, author, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(discussion)
  }

  async fn add_comment(&self, input: NewComment) -> Result<Option<Comment>> {
    let comment = Comment {
      comment_id:     Uuid::new_v4(),
      discussion_id:  input.discussion_id,
      insert_user_id: input.insert_user_id,
      body:           input.body,
      date_inserted:  Utc::now(),
    };
    let row = CommentRow::from(&comment);

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let bumped = tx.execute(
          "UPDATE discussions
             SET date_last_comment = ?2, count_comments = count_comments + 1
           WHERE discussion_id = ?1",
          rusqlite::params![row.discussion_id, row.date_inserted],
        )?;
        if bumped == 0 {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO comments (comment_id, discussion_id, insert_user_id, body, date_inserted)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            row.comment_id,
            row.discussion_id,
            row.insert_user_id,
            row.body,
            row.date_inserted,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(found.then_some(comment))
  }
}
