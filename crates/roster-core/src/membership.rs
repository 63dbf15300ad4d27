//! Join, leave and edit: the person state transitions.
//!
//! Join and leave are idempotent. The store's uniqueness constraints back the
//! find-then-insert sequence of join: a conflicting insert means a concurrent
//! join won, and the winner's record is returned.

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  identity::{Principal, extract_register_number},
  person::{JoinPayload, NewPerson, PersonPatch, PersonRecord, PersonUpdate},
  roster::Roster,
  store::{MembershipStore, WriteOutcome, find_joined_record},
};

/// The record a join resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct JoinOutcome {
  pub person:  PersonRecord,
  /// `false` when the principal had already joined.
  pub created: bool,
}

impl<S: MembershipStore> Roster<S> {
  /// Add `principal` to the list, or return the record they already have.
  ///
  /// A repeat join never rewrites the existing record, including its
  /// type-specific payload.
  pub async fn join(
    &self,
    list_id: Uuid,
    principal: Option<&Principal>,
    payload: &JoinPayload,
  ) -> Result<JoinOutcome> {
    let principal = principal.ok_or(Error::Unauthenticated)?;
    let list = self.require_list(list_id).await?;
    let partition = list.list_type.partition();

    let email_key = principal.email_key();
    let display_name = principal.display_name();

    if let Some(person) = find_joined_record(
      self.store(),
      list.id,
      partition,
      email_key.as_deref(),
      Some(display_name.as_str()),
    )
    .await
    .map_err(Error::store)?
    {
      tracing::debug!(list_id = %list.id, person_id = %person.id, "already joined");
      return Ok(JoinOutcome { person, created: false });
    }

    let input = NewPerson {
      list_id:         list.id,
      register_number: principal.name.as_deref().and_then(extract_register_number),
      payload:         list.list_type.validate_join(payload)?,
      display_name:    display_name.clone(),
      email_key:       email_key.clone(),
    };

    match self.store().insert_person(input).await.map_err(Error::store)? {
      WriteOutcome::Written(person) => {
        tracing::info!(list_id = %list.id, person_id = %person.id, "person joined");
        Ok(JoinOutcome { person, created: true })
      }
      WriteOutcome::Conflict | WriteOutcome::Missing => {
        let person = find_joined_record(
          self.store(),
          list.id,
          partition,
          email_key.as_deref(),
          Some(display_name.as_str()),
        )
        .await
        .map_err(Error::store)?
        .ok_or_else(|| {
          Error::ValidationFailed("join conflicted with another record; retry".into())
        })?;
        tracing::debug!(list_id = %list.id, person_id = %person.id, "concurrent join resolved");
        Ok(JoinOutcome { person, created: false })
      }
    }
  }

  /// Remove `principal`'s record from the list. Leaving without having
  /// joined succeeds; returns whether a record was removed.
  pub async fn leave(
    &self,
    list_id: Uuid,
    principal: Option<&Principal>,
  ) -> Result<bool> {
    let principal = principal.ok_or(Error::Unauthenticated)?;
    let list = self.require_list(list_id).await?;

    let Some(person) = find_joined_record(
      self.store(),
      list.id,
      list.list_type.partition(),
      principal.email_key().as_deref(),
      principal.trimmed_name().as_deref(),
    )
    .await
    .map_err(Error::store)?
    else {
      tracing::debug!(list_id = %list.id, principal = %principal.id, "leave without membership");
      return Ok(false);
    };

    let removed = self.store().delete_person(person.id).await.map_err(Error::store)?;
    if removed {
      tracing::info!(list_id = %list.id, person_id = %person.id, "person left");
    }
    Ok(removed)
  }

  /// Update a person record. Admins may edit anyone; other principals only
  /// the record created under their own identity.
  pub async fn edit(
    &self,
    list_id: Uuid,
    person_id: Uuid,
    requester: Option<&Principal>,
    patch: &PersonPatch,
  ) -> Result<PersonRecord> {
    let requester = requester.ok_or(Error::Unauthenticated)?;
    let list = self.require_list(list_id).await?;

    let person = self
      .store()
      .get_person(person_id)
      .await
      .map_err(Error::store)?
      .filter(|p| p.list_id == list.id)
      .ok_or_else(|| Error::NotFound(format!("person {person_id} not found on this list")))?;

    if !self.access().can_edit(requester, &person) {
      tracing::warn!(%person_id, requester = %requester.id, "edit refused");
      return Err(Error::Forbidden("you may only edit your own entry".into()));
    }

    let new_name = patch
      .updated_name
      .as_deref()
      .filter(|n| !n.trim().is_empty());
    let update = PersonUpdate {
      display_name:    new_name.map_or_else(|| person.display_name.clone(), |n| n.trim().to_owned()),
      register_number: extract_register_number(new_name.unwrap_or(&person.display_name)),
      payload:         list.list_type.apply_patch(&person.payload, patch)?,
    };

    match self.store().update_person(person.id, update).await.map_err(Error::store)? {
      WriteOutcome::Written(updated) => {
        tracing::info!(%person_id, editor = %requester.id, "person edited");
        Ok(updated)
      }
      WriteOutcome::Conflict => Err(Error::ValidationFailed(
        "that name is already taken on this list".into(),
      )),
      WriteOutcome::Missing => {
        Err(Error::NotFound(format!("person {person_id} not found on this list")))
      }
    }
  }
}
