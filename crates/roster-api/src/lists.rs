//! Handlers for `/lists` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/lists` | Lists owned by the caller, newest first |
//! | `POST`   | `/lists` | Body: [`CreateBody`]; returns 201 + the list |
//! | `GET`    | `/lists/{id}` | Detail for the caller; anonymous allowed |
//! | `DELETE` | `/lists/{id}` | Owner only; 404 otherwise |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use roster_core::{
  list::AppendList, list_type::ListType, notification::PushDispatcher, roster::ListDetail,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, ApiStore, error::ApiError, principal::Viewer};

// ─── Owned ───────────────────────────────────────────────────────────────────

/// `GET /lists`
pub async fn owned<S, D>(
  State(state): State<ApiState<S, D>>,
  viewer: Viewer,
) -> Result<Json<Vec<AppendList>>, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let principal = viewer.principal().ok_or(ApiError::Unauthenticated)?;
  let lists = state.roster.lists_owned_by(&principal.id).await?;
  Ok(Json(lists))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub title:       String,
  #[serde(default)]
  pub description: String,
  /// Defaults to `plain`; legacy spellings are accepted.
  pub list_type:   Option<String>,
}

/// `POST /lists` — body: `{"title":"…","description":"…","list_type":"github"}`
pub async fn create<S, D>(
  State(state): State<ApiState<S, D>>,
  viewer: Viewer,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let list_type = match body.list_type.as_deref() {
    Some(raw) => raw.parse::<ListType>()?,
    None => ListType::default(),
  };
  let list = state
    .roster
    .create_list(viewer.principal(), &body.title, &body.description, list_type)
    .await?;
  Ok((StatusCode::CREATED, Json(list)))
}

// ─── Detail ──────────────────────────────────────────────────────────────────

/// `GET /lists/{id}`
pub async fn detail<S, D>(
  State(state): State<ApiState<S, D>>,
  Path(id): Path<Uuid>,
  viewer: Viewer,
) -> Result<Json<ListDetail>, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let detail = state
    .roster
    .list_detail(id, viewer.principal())
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("append list {id} not found")))?;
  Ok(Json(detail))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /lists/{id}`
pub async fn delete_one<S, D>(
  State(state): State<ApiState<S, D>>,
  Path(id): Path<Uuid>,
  viewer: Viewer,
) -> Result<StatusCode, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  state.roster.delete_list(id, viewer.principal()).await?;
  Ok(StatusCode::NO_CONTENT)
}
