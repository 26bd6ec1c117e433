//! HTTP Basic-auth middleware.
//!
//! Valid credentials put an [`Actor`] into the request extensions, which the
//! API records as the author of every write. Public submission routes accept
//! anonymous requests; everything else answers 401 without credentials.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, Method, header},
  middleware::Next,
  response::Response,
};
use barrier_core::audit::Actor;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Check `Authorization: Basic` credentials, returning the username.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<String, Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(username.to_owned())
}

/// Requesters submit cases and their documents without an account.
pub fn allows_anonymous(method: &Method, path: &str) -> bool {
  method == Method::POST && matches!(path, "/cases" | "/casefiles")
}

/// Middleware: authenticate, or let a public submission through anonymously.
/// Credentials that are present but wrong are always rejected.
pub async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  if req.headers().contains_key(header::AUTHORIZATION) {
    let username = verify_auth(req.headers(), &auth)?;
    req.extensions_mut().insert(Actor::new(username));
  } else if !allows_anonymous(req.method(), req.uri().path()) {
    return Err(Error::Unauthorized);
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::Request;

  fn config(password: &str) -> AuthConfig {
    use argon2::{PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig { username: "staff".to_string(), password_hash: hash }
  }

  fn headers(value: &str) -> HeaderMap {
    let req = Request::builder()
      .header(header::AUTHORIZATION, value)
      .body(())
      .unwrap();
    req.headers().clone()
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn correct_credentials_yield_username() {
    let cfg = config("secret");
    let user = verify_auth(&headers(&basic("staff", "secret")), &cfg).unwrap();
    assert_eq!(user, "staff");
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("staff", "wrong")), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn wrong_username() {
    let cfg = config("secret");
    let res = verify_auth(&headers(&basic("other", "secret")), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(matches!(verify_auth(&HeaderMap::new(), &cfg), Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    let res = verify_auth(&headers("Basic !!!not-base64!!!"), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn only_submissions_are_public() {
    assert!(allows_anonymous(&Method::POST, "/cases"));
    assert!(allows_anonymous(&Method::POST, "/casefiles"));
    assert!(!allows_anonymous(&Method::GET, "/cases"));
    assert!(!allows_anonymous(&Method::PUT, "/cases/1"));
    assert!(!allows_anonymous(&Method::POST, "/requesters"));
  }
}
