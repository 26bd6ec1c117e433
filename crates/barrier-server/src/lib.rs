//! HTTP server for the barrier determination case service.
//!
//! Wraps the [`barrier_api`] router with Basic authentication and request
//! tracing, and defines the configuration the binary reads at startup.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, middleware};
use barrier_api::Workflow;
use barrier_core::{
  files::FileStorage, notify::Mailer, notify::NoticeConfig, store::CaseStore,
  upload::UploadPolicy,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `BARRIER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Root directory for uploaded case files.
  pub media_root:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  #[serde(default)]
  pub upload:             UploadPolicy,
  #[serde(default)]
  pub notices:            NoticeConfig,
}

impl ServerConfig {
  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application: API routes behind authentication, traced.
pub fn router<S, F, M>(workflow: Arc<Workflow<S, F, M>>, auth: Arc<AuthConfig>) -> Router
where
  S: CaseStore + 'static,
  F: FileStorage + 'static,
  M: Mailer + 'static,
{
  barrier_api::api_router(workflow)
    .layer(middleware::from_fn_with_state(auth, require_auth))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use barrier_api::{LocalFileStorage, LogMailer};
  use barrier_core::{
    party::{Address, NewProperty, NewRequester},
    validate::Validator,
  };
  use barrier_store_sqlite::SqliteStore;
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  struct App {
    router: Router,
    store:  SqliteStore,
    _dir:   TempDir,
  }

  async fn app(password: &str) -> App {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let dir   = tempfile::tempdir().unwrap();
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    let workflow = Workflow::new(
      store.clone(),
      LocalFileStorage::new(dir.path()),
      LogMailer,
      Validator::default(),
      NoticeConfig::default(),
    );
    let auth = AuthConfig { username: "staff".to_string(), password_hash: hash };
    App {
      router: router(Arc::new(workflow), Arc::new(auth)),
      store,
      _dir: dir,
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn send(
    app:    &App,
    method: &str,
    uri:    &str,
    auth:   Option<&str>,
    body:   Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    app.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn seed(store: &SqliteStore) -> Value {
    let r = store
      .create_requester(
        NewRequester {
          salutation:   String::new(),
          first_name:   "Ari".into(),
          last_name:    "Reed".into(),
          organization: String::new(),
          email:        String::new(),
          address:      Address::default(),
        },
        None,
      )
      .await
      .unwrap();
    let p = store
      .create_property(
        NewProperty {
          address:           Address { street: "3 Spit Rd".into(), ..Default::default() },
          legal_description: String::new(),
          subdivision:       String::new(),
          policy_number:     String::new(),
        },
        None,
      )
      .await
      .unwrap();
    json!({ "requester": r.id, "property": p.id })
  }

  #[tokio::test]
  async fn listing_requires_credentials() {
    let app  = app("secret").await;
    let resp = send(&app, "GET", "/cases", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let auth = auth_header("staff", "secret");
    let resp = send(&app, "GET", "/cases", Some(&auth), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn wrong_password_is_rejected_even_on_public_routes() {
    let app  = app("secret").await;
    let body = seed(&app.store).await;
    let auth = auth_header("staff", "nope");
    let resp = send(&app, "POST", "/cases", Some(&auth), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn anonymous_submission_has_no_author() {
    let app  = app("secret").await;
    let body = seed(&app.store).await;
    let resp = send(&app, "POST", "/cases", None, Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let case: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(case["audit"]["created_by"].is_null());
  }

  #[tokio::test]
  async fn authenticated_writes_record_the_user() {
    let app  = app("secret").await;
    let body = seed(&app.store).await;
    let auth = auth_header("staff", "secret");
    let resp = send(&app, "POST", "/cases", Some(&auth), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let case: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(case["audit"]["created_by"], "staff");
    assert_eq!(case["audit"]["modified_by"], "staff");
  }

  #[test]
  fn config_deserialises_with_defaults() {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(
        r#"
          host = "127.0.0.1"
          port = 8000
          store_path = "~/barrier.db"
          media_root = "media"
          auth_username = "staff"
          auth_password_hash = "x"
        "#,
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.upload, UploadPolicy::default());
    assert_eq!(cfg.notices, NoticeConfig::default());
    assert_eq!(cfg.port, 8000);
  }
}
