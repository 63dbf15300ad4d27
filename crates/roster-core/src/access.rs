//! Authorization: allowlists and the per-(list, viewer) permission triple.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
  Error, Result,
  identity::{Principal, normalize_email},
  list::AppendList,
  person::PersonRecord,
  roster::Roster,
  store::{MembershipStore, find_joined_record},
};

// ─── Allowlists ──────────────────────────────────────────────────────────────

/// A set of lower-cased email addresses parsed from operator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailAllowlist(BTreeSet<String>);

impl EmailAllowlist {
  /// Parse a JSON array (`["a@x.io", "b@x.io"]`) or a comma-separated list.
  ///
  /// Comma-separated entries tolerate stray brackets and quotes, so a
  /// malformed JSON array still yields its addresses.
  pub fn parse(raw: &str) -> Self {
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(raw) {
      let emails = items
        .into_iter()
        .map(|item| match item {
          serde_json::Value::String(s) => s,
          other => other.to_string(),
        })
        .filter_map(|s| normalize_email(&s))
        .collect();
      return Self(emails);
    }

    let emails = raw
      .split(',')
      .filter_map(|entry| {
        let entry = entry.trim();
        let entry = entry.strip_prefix('[').unwrap_or(entry);
        let entry = entry.strip_suffix(']').unwrap_or(entry);
        normalize_email(strip_quotes(entry))
      })
      .collect();
    Self(emails)
  }

  /// Whether `email` (trimmed, case-insensitive) is listed. Blank never is.
  pub fn contains(&self, email: Option<&str>) -> bool {
    email
      .and_then(normalize_email)
      .is_some_and(|e| self.0.contains(&e))
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }
}

impl<S: Into<String>> FromIterator<S> for EmailAllowlist {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self(
      iter
        .into_iter()
        .filter_map(|s| {
          let s: String = s.into();
          normalize_email(&s)
        })
        .collect(),
    )
  }
}

fn strip_quotes(s: &str) -> &str {
  let s = s.strip_prefix(['\'', '"']).unwrap_or(s);
  s.strip_suffix(['\'', '"']).unwrap_or(s)
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Operator-supplied authorization settings, threaded into the services.
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
  /// May post notifications and edit anyone's person record.
  pub admins:                      EmailAllowlist,
  /// Non-owners granted download rights over lists they have joined under
  /// some identity candidate.
  pub owner_whitelist:             EmailAllowlist,
  /// Whether export honours `owner_whitelist` as well as list detail.
  pub whitelist_applies_to_export: bool,
}

impl AccessConfig {
  pub fn is_admin(&self, principal: &Principal) -> bool {
    self.admins.contains(principal.email.as_deref())
  }

  /// Admins may edit any record; everyone else only their own.
  pub fn can_edit(&self, principal: &Principal, person: &PersonRecord) -> bool {
    self.is_admin(principal) || owns_identity(principal, person)
  }
}

/// Whether `person` was created under `principal`'s own identity: the same
/// email key, or a display name equal to one of the principal's candidates.
pub fn owns_identity(principal: &Principal, person: &PersonRecord) -> bool {
  if let (Some(theirs), Some(mine)) = (person.email_key.as_deref(), principal.email_key())
    && theirs == mine
  {
    return true;
  }
  principal
    .identity_candidates()
    .iter()
    .any(|candidate| *candidate == person.display_name)
}

// ─── Permissions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Permissions {
  pub is_owner:     bool,
  pub has_joined:   bool,
  pub can_download: bool,
}

impl<S: MembershipStore> Roster<S> {
  /// Resolve the permission triple for `viewer` on `list`, including the
  /// owner-whitelist override.
  pub async fn permissions(
    &self,
    list: &AppendList,
    viewer: Option<&Principal>,
  ) -> Result<Permissions> {
    self.resolve_permissions(list, viewer, true).await
  }

  pub(crate) async fn resolve_permissions(
    &self,
    list: &AppendList,
    viewer: Option<&Principal>,
    honour_whitelist: bool,
  ) -> Result<Permissions> {
    let Some(viewer) = viewer else {
      return Ok(Permissions::default());
    };

    let is_owner = list.is_owned_by(&viewer.id);
    let has_joined = find_joined_record(
      self.store(),
      list.id,
      list.list_type.partition(),
      viewer.email_key().as_deref(),
      viewer.trimmed_name().as_deref(),
    )
    .await
    .map_err(Error::store)?
    .is_some();

    let whitelisted = honour_whitelist
      && !is_owner
      && !has_joined
      && self.access().owner_whitelist.contains(viewer.email.as_deref())
      && self.joined_under_any_candidate(list, viewer).await?;

    if whitelisted {
      tracing::debug!(list_id = %list.id, viewer = %viewer.id, "owner-whitelist override applied");
    }

    Ok(Permissions {
      is_owner,
      has_joined,
      can_download: is_owner || has_joined || whitelisted,
    })
  }

  /// Whether any record matches the viewer's email key, or has a display name
  /// equal to the viewer's literal name or literal email.
  async fn joined_under_any_candidate(
    &self,
    list: &AppendList,
    viewer: &Principal,
  ) -> Result<bool> {
    let partition = list.list_type.partition();

    if let Some(email_key) = viewer.email_key()
      && self
        .store()
        .find_by_email(list.id, partition, &email_key)
        .await
        .map_err(Error::store)?
        .is_some()
    {
      return Ok(true);
    }

    for candidate in viewer.identity_candidates() {
      if self
        .store()
        .find_by_name(list.id, partition, &candidate)
        .await
        .map_err(Error::store)?
        .is_some()
      {
        return Ok(true);
      }
    }
    Ok(false)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::person::PersonPayload;

  #[test]
  fn parses_comma_separated_with_noise() {
    let list = EmailAllowlist::parse(" A@x.io, 'b@x.io' ,[\"c@x.io\"], ,");
    assert_eq!(list.len(), 3);
    assert!(list.contains(Some("a@x.io")));
    assert!(list.contains(Some(" B@X.IO ")));
    assert!(list.contains(Some("c@x.io")));
    assert!(!list.contains(Some("")));
    assert!(!list.contains(None));
  }

  #[test]
  fn parses_json_array() {
    let list = EmailAllowlist::parse(r#"["Admin@X.io", " ops@x.io ", ""]"#);
    assert_eq!(list.len(), 2);
    assert!(list.contains(Some("admin@x.io")));
    assert!(list.contains(Some("ops@x.io")));
  }

  #[test]
  fn empty_string_is_empty_list() {
    assert!(EmailAllowlist::parse("").is_empty());
  }

  fn person(name: &str, email_key: Option<&str>) -> PersonRecord {
    PersonRecord {
      id:              Uuid::new_v4(),
      list_id:         Uuid::nil(),
      display_name:    name.into(),
      email_key:       email_key.map(Into::into),
      register_number: None,
      payload:         PersonPayload::Plain,
      joined_at:       Utc::now(),
    }
  }

  #[test]
  fn own_identity_matches_email_or_name() {
    let me = Principal::new("u1").with_email("Me@x.io").with_name("Me");
    assert!(owns_identity(&me, &person("Someone", Some("me@x.io"))));
    assert!(owns_identity(&me, &person("Me", None)));
    assert!(owns_identity(&me, &person("Me@x.io", None)));
    assert!(!owns_identity(&me, &person("You", Some("you@x.io"))));
  }

  #[test]
  fn admins_can_edit_anyone() {
    let access = AccessConfig {
      admins: EmailAllowlist::parse("boss@x.io"),
      ..Default::default()
    };
    let boss = Principal::new("b").with_email("BOSS@x.io");
    let other = Principal::new("o").with_email("o@x.io");
    let record = person("You", Some("you@x.io"));
    assert!(access.can_edit(&boss, &record));
    assert!(!access.can_edit(&other, &record));
  }
}
