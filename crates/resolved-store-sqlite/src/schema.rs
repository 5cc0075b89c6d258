//! SQL schema and migrations for the discussion store.
//!
//! Versions are tracked in `PRAGMA user_version`:
//!
//! 1. host tables (`discussions`, `comments`)
//! 2. resolution columns on `discussions`
//!
//! Every step is idempotent, so reopening an up-to-date database is a no-op.

use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 2;

const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Version 1: the forum's own tables.
pub(crate) const BASE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS discussions (
    discussion_id     TEXT PRIMARY KEY,
    type              TEXT,            -- NULL for ordinary discussions
    name              TEXT NOT NULL,
    body              TEXT NOT NULL,
    insert_user_id    INTEGER NOT NULL,
    date_inserted     TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    date_last_comment TEXT,
    count_comments    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id     TEXT PRIMARY KEY,
    discussion_id  TEXT NOT NULL REFERENCES discussions(discussion_id),
    insert_user_id INTEGER NOT NULL,
    body           TEXT NOT NULL,
    date_inserted  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS comments_discussion_idx ON comments(discussion_id);
";

/// Version 2: the resolution sub-record, added only where missing.
const RESOLUTION_COLUMNS: [(&str, &str); 3] = [
  ("resolved", "INTEGER NOT NULL DEFAULT 0"),
  ("date_resolved", "TEXT"),
  ("resolved_user_id", "INTEGER"),
];

/// Bring `conn` up to [`SCHEMA_VERSION`].
pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(PRAGMAS)?;

  let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

  if version < 1 {
    conn.execute_batch(BASE_SCHEMA)?;
  }
  if version < 2 {
    add_resolution_columns(conn)?;
  }
  if version < SCHEMA_VERSION {
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tracing::debug!(from = version, to = SCHEMA_VERSION, "migrated discussion schema");
  }
  Ok(())
}

fn add_resolution_columns(conn: &Connection) -> rusqlite::Result<()> {
  for (column, decl) in RESOLUTION_COLUMNS {
    if !has_column(conn, "discussions", column)? {
      conn.execute_batch(&format!("ALTER TABLE discussions ADD COLUMN {column} {decl};"))?;
    }
  }
  conn.execute_batch(
    "CREATE INDEX IF NOT EXISTS discussions_resolved_idx ON discussions(resolved);",
  )
}

pub(crate) fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
  let n: i64 = conn.query_row(
    "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
    rusqlite::params![table, column],
    |row| row.get(0),
  )?;
  Ok(n > 0)
}
