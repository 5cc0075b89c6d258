//! HTTP Basic-auth extractor mapping credentials to a forum [`UserId`].

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use resolved_core::{discussion::UserId, store::ForumStore};

use crate::{AppState, UserConfig, error::ApiError};

/// A login that maps to a forum user.
#[derive(Clone)]
pub struct Account {
  pub user_id:       UserId,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Credentials accepted by this server instance, keyed by username.
#[derive(Clone, Default)]
pub struct AuthConfig {
  accounts: HashMap<String, Account>,
}

impl AuthConfig {
  pub fn from_users(users: &[UserConfig]) -> Self {
    let accounts = users
      .iter()
      .map(|u| {
        (u.username.clone(), Account {
          user_id:       UserId(u.user_id),
          password_hash: u.password_hash.clone(),
        })
      })
      .collect();
    Self { accounts }
  }
}

/// The authenticated acting user.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub UserId);

/// Verify credentials from headers and return the matching user.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<UserId, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let account = config
    .accounts
    .get(username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(account.user_id)
}

impl<S> FromRequestParts<AppState<S>> for Actor
where
  S: ForumStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).map(Actor)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::{HeaderValue, header};
  use base64::Engine as _;
  use rand_core::OsRng;

  fn config(password: &str) -> AuthConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig::from_users(&[UserConfig {
      username:      "alice".into(),
      password_hash: hash,
      user_id:       42,
      capabilities:  vec![],
    }])
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials_yield_user_id() {
    let cfg = config("secret");
    let user = verify_auth(&headers(&basic("alice", "secret")), &cfg).unwrap();
    assert_eq!(user, UserId(42));
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("alice", "nope")), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("mallory", "secret")), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&HeaderMap::new(), &cfg),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    let res = verify_auth(&headers("Basic !!!not-base64!!!"), &cfg);
    assert!(matches!(res, Err(ApiError::Unauthorized)));
  }
}
