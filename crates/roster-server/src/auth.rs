//! Gateway-token middleware and standalone verifier.
//!
//! The API trusts the `x-principal-*` headers it receives. Those headers are
//! only believed when the request also carries the shared token of the
//! authenticating proxy in front of this server, as `Authorization: Bearer`.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};

use crate::error::Error;

/// The shared gateway token, as an argon2 PHC string. `None` disables the
/// check and every request's identity headers are trusted.
#[derive(Debug, Clone, Default)]
pub struct GatewayAuth {
  token_hash: Option<String>,
}

impl GatewayAuth {
  /// Validate `token_hash` up front so a typo fails at startup rather than
  /// rejecting every request.
  pub fn new(token_hash: Option<String>) -> Result<Self, Error> {
    let token_hash = token_hash.filter(|h| !h.trim().is_empty());
    if let Some(hash) = &token_hash {
      PasswordHash::new(hash).map_err(|e| Error::InvalidTokenHash(e.to_string()))?;
    }
    Ok(Self { token_hash })
  }

  pub fn is_enforced(&self) -> bool { self.token_hash.is_some() }
}

/// Verify the gateway token directly from headers.
pub fn verify_gateway(headers: &HeaderMap, auth: &GatewayAuth) -> Result<(), Error> {
  let Some(token_hash) = &auth.token_hash else {
    return Ok(());
  };

  let token = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(token_hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(token.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(())
}

/// Middleware rejecting requests that do not carry the gateway token.
pub async fn require_gateway(
  State(auth): State<Arc<GatewayAuth>>,
  req: Request,
  next: Next,
) -> Result<Response, Error> {
  if let Err(e) = verify_gateway(req.headers(), &auth) {
    tracing::warn!(uri = %req.uri(), "gateway token rejected");
    return Err(e);
  }
  Ok(next.run(req).await)
}

/// Hash a gateway token into the PHC string stored in configuration.
pub fn hash_token(token: &str) -> Result<String, argon2::password_hash::Error> {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;

  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(token.as_bytes(), &salt)?.to_string())
}
