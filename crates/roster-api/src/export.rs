//! `GET /lists/{id}/export` — the list flattened into export rows.

use axum::{
  Json,
  extract::{Path, State},
};
use roster_core::{export::ExportSheet, notification::PushDispatcher};
use uuid::Uuid;

use crate::{ApiState, ApiStore, error::ApiError, principal::Viewer};

pub async fn handler<S, D>(
  State(state): State<ApiState<S, D>>,
  Path(id): Path<Uuid>,
  viewer: Viewer,
) -> Result<Json<ExportSheet>, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let sheet = state.roster.export_rows(id, viewer.principal()).await?;
  Ok(Json(sheet))
}
