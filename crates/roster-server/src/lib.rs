//! HTTP server composition for Roster.
//!
//! Mounts the JSON API under `/api` behind the gateway-token check, adds a
//! `/health` probe and request tracing, and defines the configuration the
//! `roster-server` binary reads.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use roster_api::ApiStore;
use roster_core::{AccessConfig, EmailAllowlist, notification::PushDispatcher};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::GatewayAuth;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ROSTER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                        String,
  #[serde(default = "default_port")]
  pub port:                        u16,
  #[serde(default = "default_store_path")]
  pub store_path:                  PathBuf,
  /// argon2 PHC string of the token the fronting proxy presents.
  #[serde(default)]
  pub gateway_token_hash:          Option<String>,
  /// Comma-separated or JSON-array list of admin emails.
  #[serde(default)]
  pub admins:                      String,
  #[serde(default)]
  pub list_owner_email_whitelist:  String,
  #[serde(default)]
  pub whitelist_applies_to_export: bool,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("roster.sqlite") }

impl ServerConfig {
  /// The authorization settings handed to the services.
  pub fn access(&self) -> AccessConfig {
    AccessConfig {
      admins:                      EmailAllowlist::parse(&self.admins),
      owner_whitelist:             EmailAllowlist::parse(&self.list_owner_email_whitelist),
      whitelist_applies_to_export: self.whitelist_applies_to_export,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, D>(
  store: Arc<S>,
  dispatcher: Arc<D>,
  config: &ServerConfig,
) -> Result<Router, Error>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let gateway = GatewayAuth::new(config.gateway_token_hash.clone())?;
  if !gateway.is_enforced() {
    tracing::warn!("no gateway_token_hash configured; identity headers are trusted as-is");
  }

  let access = config.access();
  tracing::info!(
    admins = access.admins.len(),
    whitelisted = access.owner_whitelist.len(),
    "access configuration loaded"
  );

  let api = roster_api::api_router(store, Arc::new(access), dispatcher);

  Ok(
    Router::new()
      .nest("/api", api)
      .layer(middleware::from_fn_with_state(Arc::new(gateway), auth::require_gateway))
      .route("/health", get(|| async { "ok" }))
      .layer(TraceLayer::new_for_http()),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use roster_core::notification::UnconfiguredDispatcher;
  use roster_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  fn config(gateway_token_hash: Option<String>) -> ServerConfig {
    ServerConfig {
      host: default_host(),
      port: default_port(),
      store_path: PathBuf::from(":memory:"),
      gateway_token_hash,
      admins: r#"["boss@x.io"]"#.into(),
      list_owner_email_whitelist: String::new(),
      whitelist_applies_to_export: false,
    }
  }

  async fn app(gateway_token_hash: Option<String>) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(store), Arc::new(UnconfiguredDispatcher), &config(gateway_token_hash)).unwrap()
  }

  fn get_lists(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
      .uri("/api/lists")
      .header("x-principal-id", "u1")
      .header("x-principal-email", "u1@x.io");
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
  }

  #[test]
  fn access_is_parsed_from_config() {
    let mut cfg = config(None);
    cfg.list_owner_email_whitelist = "a@x.io, 'B@x.io'".into();
    let access = cfg.access();
    assert_eq!(access.admins.len(), 1);
    assert!(access.owner_whitelist.contains(Some("b@x.io")));
    assert!(!access.whitelist_applies_to_export);
  }

  #[tokio::test]
  async fn gateway_token_is_required_when_configured() {
    let app = app(Some(auth::hash_token("gw-secret").unwrap())).await;

    let resp = app.clone().oneshot(get_lists(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.clone().oneshot(get_lists(Some("nope"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.oneshot(get_lists(Some("gw-secret"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn headers_are_trusted_without_gateway_token() {
    let app = app(None).await;
    let resp = app.oneshot(get_lists(None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn health_is_open() {
    let app = app(Some(auth::hash_token("gw-secret").unwrap())).await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn invalid_token_hash_fails_router_construction() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let result = router(
      Arc::new(store),
      Arc::new(UnconfiguredDispatcher),
      &config(Some("garbage".into())),
    );
    assert!(matches!(result, Err(Error::InvalidTokenHash(_))));
  }
}
