//! Handlers for joining, leaving and editing people on a list.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST`  | `/lists/{id}/join` | Optional body `{"github_username":…,"inputs":[…]}`; 201 new, 200 existing |
//! | `POST`  | `/lists/{id}/leave` | Always 200; `removed` reports whether a record went away |
//! | `PATCH` | `/lists/{id}/people/{person_id}` | Body: [`PersonPatch`] |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  notification::PushDispatcher,
  person::{JoinPayload, PersonPatch, PersonRecord},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, ApiStore, error::ApiError, principal::Viewer};

/// `POST /lists/{id}/join`
pub async fn join<S, D>(
  State(state): State<ApiState<S, D>>,
  Path(id): Path<Uuid>,
  viewer: Viewer,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let payload = join_payload(&body)?;
  let outcome = state.roster.join(id, viewer.principal(), &payload).await?;
  let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(outcome)))
}

/// Plain lists need no payload, so an empty body is accepted.
fn join_payload(body: &[u8]) -> Result<JoinPayload, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(JoinPayload::default());
  }
  serde_json::from_slice(body)
    .map_err(|e| ApiError::BadRequest(format!("invalid join payload: {e}")))
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
  pub removed: bool,
}

/// `POST /lists/{id}/leave`
pub async fn leave<S, D>(
  State(state): State<ApiState<S, D>>,
  Path(id): Path<Uuid>,
  viewer: Viewer,
) -> Result<Json<LeaveResponse>, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let removed = state.roster.leave(id, viewer.principal()).await?;
  Ok(Json(LeaveResponse { removed }))
}

/// `PATCH /lists/{id}/people/{person_id}`
pub async fn edit<S, D>(
  State(state): State<ApiState<S, D>>,
  Path((id, person_id)): Path<(Uuid, Uuid)>,
  viewer: Viewer,
  Json(patch): Json<PersonPatch>,
) -> Result<Json<PersonRecord>, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let person = state
    .roster
    .edit(id, person_id, viewer.principal(), &patch)
    .await?;
  Ok(Json(person))
}
