//! The [`Viewer`] extractor: the caller's identity, as asserted by the
//! authentication layer in front of this API.
//!
//! | Header | Content |
//! |--------|---------|
//! | `x-principal-id` | Stable principal id; absent means anonymous |
//! | `x-principal-email` | Email address, verbatim |
//! | `x-principal-name` | Display name, base64 of UTF-8 |
//!
//! Header trust is the mounting server's concern.

use axum::{extract::FromRequestParts, http::request::Parts};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use roster_core::Principal;

use crate::error::ApiError;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_EMAIL_HEADER: &str = "x-principal-email";
pub const PRINCIPAL_NAME_HEADER: &str = "x-principal-name";

/// The calling principal, or `None` for an anonymous request.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Principal>);

impl Viewer {
  pub fn principal(&self) -> Option<&Principal> { self.0.as_ref() }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
  parts
    .headers
    .get(name)
    .map(|v| {
      v.to_str()
        .map_err(|_| ApiError::BadRequest(format!("{name} is not valid ASCII")))
    })
    .transpose()
}

fn decode_name(encoded: &str) -> Result<String, ApiError> {
  let bytes = B64
    .decode(encoded.trim())
    .map_err(|_| ApiError::BadRequest(format!("{PRINCIPAL_NAME_HEADER} is not base64")))?;
  String::from_utf8(bytes)
    .map_err(|_| ApiError::BadRequest(format!("{PRINCIPAL_NAME_HEADER} is not UTF-8")))
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let Some(id) = header_str(parts, PRINCIPAL_ID_HEADER)?
      .map(str::trim)
      .filter(|id| !id.is_empty())
    else {
      return Ok(Viewer(None));
    };

    let mut principal = Principal::new(id);
    if let Some(email) = header_str(parts, PRINCIPAL_EMAIL_HEADER)? {
      principal = principal.with_email(email);
    }
    if let Some(name) = header_str(parts, PRINCIPAL_NAME_HEADER)? {
      principal = principal.with_name(decode_name(name)?);
    }
    Ok(Viewer(Some(principal)))
  }
}
