//! Error type for `resolved-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The `resolved` flag disagrees with `date_resolved`/`resolved_user_id`.
  #[error("discussion {0} has an inconsistent resolution record")]
  CorruptResolution(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
