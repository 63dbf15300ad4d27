//! JSON REST API for Roster.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`MembershipStore`] and [`NotificationStore`]. Verifying the identity
//! headers, TLS and other transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", roster_api::api_router(store, access, dispatcher))
//! ```

pub mod error;
pub mod export;
pub mod lists;
pub mod membership;
pub mod notifications;
pub mod principal;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use roster_core::{
  AccessConfig, Bulletin, Roster, notification::NotificationStore,
  notification::PushDispatcher, store::MembershipStore,
};

pub use error::ApiError;
pub use principal::Viewer;

/// A backend the API can serve from.
pub trait ApiStore: MembershipStore + NotificationStore + 'static {}

impl<T> ApiStore for T where T: MembershipStore + NotificationStore + 'static {}

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all API handlers.
pub struct ApiState<S, D> {
  pub roster:     Roster<S>,
  pub bulletin:   Bulletin<S>,
  /// Push transport used for notification broadcasts.
  pub dispatcher: Arc<D>,
}

impl<S, D> Clone for ApiState<S, D> {
  fn clone(&self) -> Self {
    Self {
      roster:     self.roster.clone(),
      bulletin:   self.bulletin.clone(),
      dispatcher: Arc::clone(&self.dispatcher),
    }
  }
}

impl<S: ApiStore, D: PushDispatcher> ApiState<S, D> {
  pub fn new(store: Arc<S>, access: Arc<AccessConfig>, dispatcher: Arc<D>) -> Self {
    Self {
      roster: Roster::new(Arc::clone(&store), Arc::clone(&access)),
      bulletin: Bulletin::new(store, access),
      dispatcher,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, D>(
  store: Arc<S>,
  access: Arc<AccessConfig>,
  dispatcher: Arc<D>,
) -> Router<()>
where
  S: ApiStore,
  D: PushDispatcher + 'static,
{
  Router::new()
    // Lists
    .route("/lists", get(lists::owned::<S, D>).post(lists::create::<S, D>))
    .route("/lists/{id}", get(lists::detail::<S, D>).delete(lists::delete_one::<S, D>))
    .route("/lists/{id}/export", get(export::handler::<S, D>))
    // Membership
    .route("/lists/{id}/join", post(membership::join::<S, D>))
    .route("/lists/{id}/leave", post(membership::leave::<S, D>))
    .route("/lists/{id}/people/{person_id}", patch(membership::edit::<S, D>))
    // Notifications
    .route(
      "/notifications",
      get(notifications::state::<S, D>).post(notifications::create::<S, D>),
    )
    .route("/notifications/{id}/ack", post(notifications::acknowledge::<S, D>))
    .route(
      "/push/subscriptions",
      post(notifications::subscribe::<S, D>).delete(notifications::unsubscribe::<S, D>),
    )
    .with_state(ApiState::new(store, access, dispatcher))
}
