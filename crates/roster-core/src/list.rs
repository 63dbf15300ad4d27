//! Append lists: named sign-up sheets owned by one principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::list_type::ListType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendList {
  /// Public, opaque identifier.
  pub id:          Uuid,
  pub title:       String,
  pub description: String,
  pub list_type:   ListType,
  pub owner_id:    String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl AppendList {
  pub fn is_owned_by(&self, principal_id: &str) -> bool {
    self.owner_id == principal_id
  }
}

/// Input to [`crate::store::MembershipStore::create_list`].
/// The store assigns `id` and sets `created_at == updated_at`.
#[derive(Debug, Clone)]
pub struct NewList {
  pub title:       String,
  pub description: String,
  pub list_type:   ListType,
  pub owner_id:    String,
}
