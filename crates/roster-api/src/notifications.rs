//! Handlers for admin notifications and push subscriptions.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/notifications` | Unacknowledged notifications for the caller |
//! | `POST`   | `/notifications` | Admins only; body `{"title":…,"message":…}`; broadcast runs in the background |
//! | `POST`   | `/notifications/{id}/ack` | Idempotent |
//! | `POST`   | `/push/subscriptions` | Browser `PushSubscription` JSON; upserted by endpoint |
//! | `DELETE` | `/push/subscriptions` | Body `{"endpoint":…}`; only the caller's own subscription |

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use roster_core::notification::{
  NewPushSubscription, NotificationState, PushDispatcher, PushSubscription,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, ApiStore, error::ApiError, principal::Viewer};

/// `GET /notifications`
pub async fn state<S, D>(
  State(state): State<ApiState<S, D>>,
  viewer: Viewer,
) -> Result<Json<NotificationState>, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let notifications = state.bulletin.notification_state(viewer.principal()).await?;
  Ok(Json(notifications))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub title:   String,
  #[serde(default)]
  pub message: String,
}

/// `POST /notifications` — returns 201 once stored; delivery happens after.
pub async fn create<S, D>(
  State(state): State<ApiState<S, D>>,
  viewer: Viewer,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let notification = state
    .bulletin
    .create_notification(viewer.principal(), &body.title, &body.message)
    .await?;

  let bulletin = state.bulletin.clone();
  let dispatcher = state.dispatcher.clone();
  let id = notification.id;
  tokio::spawn(async move {
    if let Err(e) = bulletin.broadcast(id, dispatcher.as_ref()).await {
      tracing::warn!(notification_id = %id, error = %e, "broadcast failed");
    }
  });

  Ok((StatusCode::CREATED, Json(notification)))
}

/// `POST /notifications/{id}/ack`
pub async fn acknowledge<S, D>(
  State(state): State<ApiState<S, D>>,
  Path(id): Path<Uuid>,
  viewer: Viewer,
) -> Result<StatusCode, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  state.bulletin.acknowledge(viewer.principal(), id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /push/subscriptions`
pub async fn subscribe<S, D>(
  State(state): State<ApiState<S, D>>,
  viewer: Viewer,
  headers: HeaderMap,
  Json(subscription): Json<NewPushSubscription>,
) -> Result<(StatusCode, Json<PushSubscription>), ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  let user_agent = headers
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);
  let stored = state
    .bulletin
    .register_push_subscription(viewer.principal(), subscription, user_agent)
    .await?;
  Ok((StatusCode::CREATED, Json(stored)))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeBody {
  pub endpoint: String,
}

/// `DELETE /push/subscriptions`
pub async fn unsubscribe<S, D>(
  State(state): State<ApiState<S, D>>,
  viewer: Viewer,
  Json(body): Json<UnsubscribeBody>,
) -> Result<StatusCode, ApiError>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  state.bulletin.remove_push_subscription(viewer.principal(), &body.endpoint).await?;
  Ok(StatusCode::NO_CONTENT)
}
