//! Admin notifications, per-viewer acknowledgements and push subscriptions.
//!
//! Delivery is a collaborator: the [`PushDispatcher`] trait is implemented by
//! whatever transport the host wires in. [`UnconfiguredDispatcher`] is used
//! when none is.

use std::{future::Future, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{Error, Result, access::AccessConfig, identity::Principal};

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub id:               Uuid,
  pub title:            String,
  pub message:          String,
  pub created_at:       DateTime<Utc>,
  /// Lower-cased email of the admin who posted it.
  pub created_by_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
  pub p256dh: String,
  pub auth:   String,
}

/// A subscription as handed over by a browser.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPushSubscription {
  pub endpoint:        String,
  pub keys:            PushKeys,
  /// Milliseconds since the Unix epoch, as browsers report it.
  #[serde(default, alias = "expirationTime")]
  pub expiration_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
  pub id:              Uuid,
  pub viewer_id:       String,
  pub endpoint:        String,
  pub keys:            PushKeys,
  pub expiration_time: Option<i64>,
  pub user_agent:      Option<String>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// What a viewer sees: their unacknowledged notifications, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationState {
  pub is_admin:      bool,
  pub notifications: Vec<Notification>,
}

/// The JSON body pushed to each subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPayload {
  pub title:           String,
  pub message:         String,
  pub url:             String,
  pub notification_id: Uuid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
  pub sent:   usize,
  pub failed: usize,
}

// ─── Store trait ─────────────────────────────────────────────────────────────

pub trait NotificationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a notification; id and `created_at` are assigned by the store.
  fn insert_notification(
    &self,
    title: String,
    message: String,
    created_by_email: Option<String>,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  fn get_notification(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Notification>, Self::Error>> + Send + '_;

  /// Notifications `viewer_id` has not acknowledged, newest first.
  fn unacknowledged_notifications<'a>(
    &'a self,
    viewer_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  /// Record an acknowledgement. Returns `false` if one already existed.
  fn acknowledge<'a>(
    &'a self,
    notification_id: Uuid,
    viewer_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert or update the subscription keyed by its endpoint.
  fn upsert_push_subscription<'a>(
    &'a self,
    viewer_id: &'a str,
    subscription: NewPushSubscription,
    user_agent: Option<String>,
  ) -> impl Future<Output = Result<PushSubscription, Self::Error>> + Send + 'a;

  /// Remove the subscription at `endpoint`, whoever registered it. Returns
  /// `true` if a subscription was removed.
  fn remove_push_subscription<'a>(
    &'a self,
    endpoint: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Like [`remove_push_subscription`](Self::remove_push_subscription), but
  /// only when the subscription is bound to `viewer_id`.
  fn remove_viewer_push_subscription<'a>(
    &'a self,
    viewer_id: &'a str,
    endpoint: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn push_subscriptions(
    &self,
  ) -> impl Future<Output = Result<Vec<PushSubscription>, Self::Error>> + Send + '_;
}

// ─── Delivery ────────────────────────────────────────────────────────────────

/// A failed push. `status` is the push service's HTTP status, if any.
#[derive(Debug, Clone, Error)]
#[error("push delivery failed: {message}")]
pub struct DeliveryError {
  pub status:  Option<u16>,
  pub message: String,
}

impl DeliveryError {
  /// The push service reports the subscription as expired or unknown.
  pub fn is_gone(&self) -> bool { matches!(self.status, Some(404 | 410)) }
}

pub trait PushDispatcher: Send + Sync {
  /// `false` when no transport credentials are available.
  fn is_configured(&self) -> bool { true }

  fn dispatch<'a>(
    &'a self,
    subscription: &'a PushSubscription,
    payload: &'a PushPayload,
  ) -> impl Future<Output = Result<(), DeliveryError>> + Send + 'a;
}

/// Dispatcher used when push delivery has not been configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredDispatcher;

impl PushDispatcher for UnconfiguredDispatcher {
  fn is_configured(&self) -> bool { false }

  async fn dispatch(
    &self,
    _subscription: &PushSubscription,
    _payload: &PushPayload,
  ) -> Result<(), DeliveryError> {
    Err(DeliveryError { status: None, message: "push delivery is not configured".into() })
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Notification service, generic over the backing store.
pub struct Bulletin<S> {
  store:  Arc<S>,
  access: Arc<AccessConfig>,
}

impl<S> Clone for Bulletin<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), access: Arc::clone(&self.access) }
  }
}

impl<S: NotificationStore> Bulletin<S> {
  pub fn new(store: Arc<S>, access: Arc<AccessConfig>) -> Self {
    Self { store, access }
  }

  pub async fn notification_state(
    &self,
    viewer: Option<&Principal>,
  ) -> Result<NotificationState> {
    let viewer = viewer.ok_or(Error::Unauthenticated)?;
    let notifications = self
      .store
      .unacknowledged_notifications(&viewer.id)
      .await
      .map_err(Error::store)?;
    Ok(NotificationState { is_admin: self.access.is_admin(viewer), notifications })
  }

  /// Post a notification. Admins only; the poster's own copy is
  /// acknowledged immediately.
  pub async fn create_notification(
    &self,
    author: Option<&Principal>,
    title: &str,
    message: &str,
  ) -> Result<Notification> {
    let author = author.ok_or(Error::Unauthenticated)?;
    if !self.access.is_admin(author) {
      tracing::warn!(author = %author.id, "notification refused");
      return Err(Error::Forbidden("not allowed to post notifications".into()));
    }

    let title = title.trim();
    if title.is_empty() {
      return Err(Error::ValidationFailed("notification title is required".into()));
    }
    let message = message.trim();
    if message.is_empty() {
      return Err(Error::ValidationFailed("notification message is required".into()));
    }

    let notification = self
      .store
      .insert_notification(title.to_owned(), message.to_owned(), author.email_key())
      .await
      .map_err(Error::store)?;
    self
      .store
      .acknowledge(notification.id, &author.id)
      .await
      .map_err(Error::store)?;

    tracing::info!(notification_id = %notification.id, author = %author.id, "notification created");
    Ok(notification)
  }

  /// Dismiss a notification for the viewer. Repeating is a no-op.
  pub async fn acknowledge(
    &self,
    viewer: Option<&Principal>,
    notification_id: Uuid,
  ) -> Result<()> {
    let viewer = viewer.ok_or(Error::Unauthenticated)?;
    if self
      .store
      .get_notification(notification_id)
      .await
      .map_err(Error::store)?
      .is_none()
    {
      return Err(Error::NotFound(format!("notification {notification_id} not found")));
    }
    self
      .store
      .acknowledge(notification_id, &viewer.id)
      .await
      .map_err(Error::store)?;
    Ok(())
  }

  pub async fn register_push_subscription(
    &self,
    viewer: Option<&Principal>,
    subscription: NewPushSubscription,
    user_agent: Option<String>,
  ) -> Result<PushSubscription> {
    let viewer = viewer.ok_or(Error::Unauthenticated)?;
    if subscription.endpoint.trim().is_empty() {
      return Err(Error::ValidationFailed("subscription endpoint is required".into()));
    }
    let stored = self
      .store
      .upsert_push_subscription(&viewer.id, subscription, user_agent)
      .await
      .map_err(Error::store)?;
    tracing::debug!(viewer = %viewer.id, subscription_id = %stored.id, "push subscription registered");
    Ok(stored)
  }

  /// Forget one of the viewer's subscriptions. Unknown endpoints, and
  /// endpoints bound to another viewer, are left alone.
  pub async fn remove_push_subscription(
    &self,
    viewer: Option<&Principal>,
    endpoint: &str,
  ) -> Result<bool> {
    let viewer = viewer.ok_or(Error::Unauthenticated)?;
    self
      .store
      .remove_viewer_push_subscription(&viewer.id, endpoint)
      .await
      .map_err(Error::store)
  }

  /// Push a notification to every subscription. Subscriptions the push
  /// service reports as gone are removed.
  pub async fn broadcast<D: PushDispatcher>(
    &self,
    notification_id: Uuid,
    dispatcher: &D,
  ) -> Result<BroadcastReport> {
    let Some(notification) = self
      .store
      .get_notification(notification_id)
      .await
      .map_err(Error::store)?
    else {
      return Ok(BroadcastReport::default());
    };

    let subscriptions = self.store.push_subscriptions().await.map_err(Error::store)?;
    if !dispatcher.is_configured() {
      tracing::warn!("push notifications are not configured");
      return Ok(BroadcastReport { sent: 0, failed: subscriptions.len() });
    }

    let payload = PushPayload {
      title:           notification.title,
      message:         notification.message,
      url:             "/".into(),
      notification_id: notification.id,
    };

    let mut report = BroadcastReport::default();
    for subscription in &subscriptions {
      match dispatcher.dispatch(subscription, &payload).await {
        Ok(()) => report.sent += 1,
        Err(e) => {
          report.failed += 1;
          tracing::debug!(endpoint = %subscription.endpoint, error = %e, "push failed");
          if e.is_gone()
            && let Err(prune) = self.store.remove_push_subscription(&subscription.endpoint).await
          {
            tracing::warn!(endpoint = %subscription.endpoint, error = %prune, "failed to prune push subscription");
          }
        }
      }
    }

    tracing::info!(%notification_id, sent = report.sent, failed = report.failed, "broadcast finished");
    Ok(report)
  }
}
