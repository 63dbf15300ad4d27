//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  /// `gateway_token_hash` is not a valid PHC string.
  #[error("invalid gateway token hash: {0}")]
  InvalidTokenHash(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"roster\""),
        );
        res
      }
      Error::InvalidTokenHash(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": self.to_string() })))
          .into_response()
      }
    }
  }
}
