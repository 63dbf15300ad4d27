//! The `MembershipStore` trait and the composed join lookup.
//!
//! The trait is implemented by storage backends (e.g. `roster-store-sqlite`).
//! The services in this crate depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  list::{AppendList, NewList},
  list_type::Partition,
  person::{NewPerson, PersonRecord, PersonUpdate},
};

// ─── Write outcome ───────────────────────────────────────────────────────────

/// Result of a write guarded by the store's uniqueness constraints.
///
/// Backends must reject a second record with the same `(list_id, email_key)`
/// (when `email_key` is present) or the same `(list_id, display_name)` by
/// returning `Conflict` rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<T> {
  Written(T),
  /// A uniqueness constraint rejected the write.
  Conflict,
  /// The row to update no longer exists. Never returned by inserts.
  Missing,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the list and person collections.
///
/// All lookups are exact matches on indexed keys. All methods return `Send`
/// futures so the trait can be used from multi-threaded runtimes.
pub trait MembershipStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Lists ─────────────────────────────────────────────────────────────

  /// Persist a new list with a fresh id and identical created/updated stamps.
  fn create_list(
    &self,
    input: NewList,
  ) -> impl Future<Output = Result<AppendList, Self::Error>> + Send + '_;

  /// Retrieve a list by id. Returns `None` if not found.
  fn get_list(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AppendList>, Self::Error>> + Send + '_;

  /// Every list owned by `owner_id`, newest first.
  fn lists_owned_by<'a>(
    &'a self,
    owner_id: &'a str,
  ) -> impl Future<Output = Result<Vec<AppendList>, Self::Error>> + Send + 'a;

  /// Atomically delete a list and every person in every partition, provided
  /// `owner_id` owns it.
  ///
  /// Returns the number of person records removed, or `None` when the list
  /// does not exist or is owned by someone else (nothing is removed).
  fn delete_owned_list<'a>(
    &'a self,
    id: Uuid,
    owner_id: &'a str,
  ) -> impl Future<Output = Result<Option<usize>, Self::Error>> + Send + 'a;

  // ── People ────────────────────────────────────────────────────────────

  fn find_by_email<'a>(
    &'a self,
    list_id: Uuid,
    partition: Partition,
    email_key: &'a str,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + 'a;

  fn find_by_name<'a>(
    &'a self,
    list_id: Uuid,
    partition: Partition,
    display_name: &'a str,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + 'a;

  /// All people of a list in one partition, sorted by `joined_at` ascending.
  fn list_people(
    &self,
    list_id: Uuid,
    partition: Partition,
  ) -> impl Future<Output = Result<Vec<PersonRecord>, Self::Error>> + Send + '_;

  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + '_;

  /// Insert a person; the partition is taken from the payload.
  fn insert_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<WriteOutcome<PersonRecord>, Self::Error>> + Send + '_;

  fn update_person(
    &self,
    id: Uuid,
    update: PersonUpdate,
  ) -> impl Future<Output = Result<WriteOutcome<PersonRecord>, Self::Error>> + Send + '_;

  /// Returns `true` if a record was removed.
  fn delete_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Composed lookup ─────────────────────────────────────────────────────────

/// Find the record a principal joined under: by email first, then by name.
///
/// Email is the stronger identity signal, so a match on it wins even when a
/// different record carries the same name.
pub async fn find_joined_record<S>(
  store: &S,
  list_id: Uuid,
  partition: Partition,
  email_key: Option<&str>,
  name: Option<&str>,
) -> Result<Option<PersonRecord>, S::Error>
where
  S: MembershipStore + ?Sized,
{
  if let Some(email_key) = email_key
    && let Some(found) = store.find_by_email(list_id, partition, email_key).await?
  {
    return Ok(Some(found));
  }
  match name {
    Some(name) => store.find_by_name(list_id, partition, name).await,
    None => Ok(None),
  }
}
