//! [`Roster`], the list service, and the list lifecycle operations.
//!
//! Join/leave/edit live in [`crate::membership`], export in
//! [`crate::export`], permission resolution in [`crate::access`].

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  access::{AccessConfig, Permissions},
  identity::Principal,
  list::{AppendList, NewList},
  list_type::ListType,
  person::PersonRecord,
  store::MembershipStore,
};

// ─── Service ─────────────────────────────────────────────────────────────────

/// Entry point for every list operation, generic over the backing store.
///
/// Cloning is cheap; the store and configuration are reference-counted.
pub struct Roster<S> {
  store:  Arc<S>,
  access: Arc<AccessConfig>,
}

impl<S> Clone for Roster<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), access: Arc::clone(&self.access) }
  }
}

impl<S: MembershipStore> Roster<S> {
  pub fn new(store: Arc<S>, access: Arc<AccessConfig>) -> Self {
    Self { store, access }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn access(&self) -> &AccessConfig { &self.access }

  /// Load a list or fail with [`Error::NotFound`].
  pub(crate) async fn require_list(&self, id: Uuid) -> Result<AppendList> {
    self
      .store
      .get_list(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("append list {id} not found")))
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Create a list owned by `owner`. Title and description are trimmed and
  /// must not be blank; titles need not be unique.
  pub async fn create_list(
    &self,
    owner: Option<&Principal>,
    title: &str,
    description: &str,
    list_type: ListType,
  ) -> Result<AppendList> {
    let owner = owner.ok_or(Error::Unauthenticated)?;

    let title = title.trim();
    if title.is_empty() {
      return Err(Error::ValidationFailed("title is required".into()));
    }
    let description = description.trim();
    if description.is_empty() {
      return Err(Error::ValidationFailed("description is required".into()));
    }

    let list = self
      .store
      .create_list(NewList {
        title: title.to_owned(),
        description: description.to_owned(),
        list_type,
        owner_id: owner.id.clone(),
      })
      .await
      .map_err(Error::store)?;

    tracing::info!(list_id = %list.id, owner = %owner.id, %list_type, "append list created");
    Ok(list)
  }

  /// Delete a list and all of its people. Non-owners get the same
  /// [`Error::NotFound`] as a missing list.
  pub async fn delete_list(
    &self,
    id: Uuid,
    requester: Option<&Principal>,
  ) -> Result<()> {
    let requester = requester.ok_or(Error::Unauthenticated)?;

    match self
      .store
      .delete_owned_list(id, &requester.id)
      .await
      .map_err(Error::store)?
    {
      Some(removed) => {
        tracing::info!(list_id = %id, removed, "append list deleted");
        Ok(())
      }
      None => {
        tracing::warn!(list_id = %id, requester = %requester.id, "delete refused");
        Err(Error::NotFound("append list not found or not owned by you".into()))
      }
    }
  }

  /// Lists owned by `owner_id`, newest first.
  pub async fn lists_owned_by(&self, owner_id: &str) -> Result<Vec<AppendList>> {
    self.store.lists_owned_by(owner_id).await.map_err(Error::store)
  }

  // ── Detail ────────────────────────────────────────────────────────────

  /// The list, its people and the viewer's permissions; `None` when the list
  /// does not exist.
  pub async fn list_detail(
    &self,
    id: Uuid,
    viewer: Option<&Principal>,
  ) -> Result<Option<ListDetail>> {
    let Some(list) = self.store.get_list(id).await.map_err(Error::store)? else {
      return Ok(None);
    };

    let permissions = self.permissions(&list, viewer).await?;
    let viewer_is_admin = viewer.is_some_and(|v| self.access.is_admin(v));

    let people = self
      .store
      .list_people(list.id, list.list_type.partition())
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|person| {
        let can_edit = viewer.is_some_and(|v| self.access.can_edit(v, &person));
        PersonView::new(person, can_edit)
      })
      .collect();

    Ok(Some(ListDetail { list, people, permissions, viewer_is_admin }))
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A list as presented to one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct ListDetail {
  pub list:            AppendList,
  /// Sorted by join time, oldest first.
  pub people:          Vec<PersonView>,
  pub permissions:     Permissions,
  pub viewer_is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonView {
  pub id:              Uuid,
  pub name:            String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub github_username: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub inputs:          Option<Vec<String>>,
  /// Whether the viewer may edit this record.
  pub can_edit:        bool,
}

impl PersonView {
  fn new(person: PersonRecord, can_edit: bool) -> Self {
    Self {
      id: person.id,
      github_username: person.payload.github_username().map(str::to_owned),
      inputs: person.payload.inputs().map(<[String]>::to_vec),
      name: person.display_name,
      can_edit,
    }
  }
}
