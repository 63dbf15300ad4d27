//! Person records: one member of an append list.
//!
//! The three person shapes share a common envelope; the shape-specific part
//! lives in [`PersonPayload`], discriminated by the owning list's type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::list_type::Partition;

// ─── Payload ─────────────────────────────────────────────────────────────────

/// Shape-specific fields of a person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersonPayload {
  Plain,
  Github { github_username: String },
  /// Free-form inputs in the order they were supplied.
  Others { inputs: Vec<String> },
}

impl PersonPayload {
  pub fn partition(&self) -> Partition {
    match self {
      Self::Plain => Partition::People,
      Self::Github { .. } => Partition::GithubPeople,
      Self::Others { .. } => Partition::OtherPeople,
    }
  }

  pub fn github_username(&self) -> Option<&str> {
    match self {
      Self::Github { github_username } => Some(github_username.as_str()),
      _ => None,
    }
  }

  pub fn inputs(&self) -> Option<&[String]> {
    match self {
      Self::Others { inputs } => Some(inputs.as_slice()),
      _ => None,
    }
  }
}

// ─── PersonRecord ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
  pub id:              Uuid,
  /// Non-owning back-reference to the list.
  pub list_id:         Uuid,
  pub display_name:    String,
  /// Lower-cased email of the joining principal, if it had one.
  pub email_key:       Option<String>,
  pub register_number: Option<String>,
  pub payload:         PersonPayload,
  /// Store-assigned; never changes after creation.
  pub joined_at:       DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::MembershipStore::insert_person`].
/// `id` and `joined_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub list_id:         Uuid,
  pub display_name:    String,
  pub email_key:       Option<String>,
  pub register_number: Option<String>,
  pub payload:         PersonPayload,
}

/// Replacement values written by [`crate::store::MembershipStore::update_person`].
#[derive(Debug, Clone)]
pub struct PersonUpdate {
  pub display_name:    String,
  pub register_number: Option<String>,
  pub payload:         PersonPayload,
}

/// Extra data a join call may carry, depending on the list type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinPayload {
  pub github_username: Option<String>,
  pub inputs:          Option<Vec<String>>,
}

/// An edit request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonPatch {
  /// New display name; blank means "keep the current one".
  pub updated_name:    Option<String>,
  pub github_username: Option<String>,
  pub inputs:          Option<Vec<String>>,
}
