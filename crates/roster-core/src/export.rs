//! Export projection: flattening a list's people into uniform rows.
//!
//! Joining times are rendered in India Standard Time regardless of who
//! downloads the export, so the same list always exports identically.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  identity::Principal,
  list_type::ListType,
  person::PersonRecord,
  roster::Roster,
  store::MembershipStore,
};

/// UTC+05:30; IST has no daylight saving.
const EXPORT_UTC_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;
const EXPORT_ZONE_LABEL: &str = "IST";

/// Separator used for the single-cell rendering of free-form inputs.
pub const INPUTS_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Serialize)]
pub struct ExportSheet {
  pub list_title: String,
  pub list_type:  ListType,
  /// Sorted by join time, oldest first.
  pub rows:       Vec<ExportRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
  pub name:            String,
  pub email_key:       Option<String>,
  pub register_number: Option<String>,
  /// `YYYY-MM-DD HH:MM:SS IST`
  pub joining_time:    String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub github_username: Option<String>,
  /// Free-form inputs, in the order they were given.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub inputs:          Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub inputs_joined:   Option<String>,
}

impl From<&PersonRecord> for ExportRow {
  fn from(person: &PersonRecord) -> Self {
    let inputs = person.payload.inputs();
    Self {
      name:            person.display_name.clone(),
      email_key:       person.email_key.clone(),
      register_number: person.register_number.clone(),
      joining_time:    format_joining_time(person.joined_at),
      github_username: person.payload.github_username().map(str::to_owned),
      inputs:          inputs.map(<[String]>::to_vec),
      inputs_joined:   inputs.map(|i| i.join(INPUTS_SEPARATOR)),
    }
  }
}

/// Render a timestamp as zero-padded `YYYY-MM-DD HH:MM:SS IST`.
pub fn format_joining_time(at: DateTime<Utc>) -> String {
  let local = at.naive_utc() + Duration::seconds(EXPORT_UTC_OFFSET_SECS);
  format!("{} {EXPORT_ZONE_LABEL}", local.format("%Y-%m-%d %H:%M:%S"))
}

impl<S: MembershipStore> Roster<S> {
  /// Export every person on the list. Only the owner and joined members may
  /// export; the owner-whitelist override applies only when configured.
  pub async fn export_rows(
    &self,
    list_id: Uuid,
    viewer: Option<&Principal>,
  ) -> Result<ExportSheet> {
    let viewer = viewer.ok_or(Error::Unauthenticated)?;
    let list = self.require_list(list_id).await?;

    let permissions = self
      .resolve_permissions(&list, Some(viewer), self.access().whitelist_applies_to_export)
      .await?;
    if !permissions.can_download {
      tracing::warn!(list_id = %list.id, viewer = %viewer.id, "export refused");
      return Err(Error::Forbidden("not allowed to export this list".into()));
    }

    let mut people = self
      .store()
      .list_people(list.id, list.list_type.partition())
      .await
      .map_err(Error::store)?;
    people.sort_by_key(|p| p.joined_at);

    Ok(ExportSheet {
      rows:       people.iter().map(ExportRow::from).collect(),
      list_title: list.title,
      list_type:  list.list_type,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::person::PersonPayload;

  #[test]
  fn joining_time_is_rendered_in_ist() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(format_joining_time(at), "2024-01-01 05:30:00 IST");
  }

  #[test]
  fn joining_time_rolls_over_the_date() {
    let at = Utc.with_ymd_and_hms(2024, 12, 31, 20, 5, 9).unwrap();
    assert_eq!(format_joining_time(at), "2025-01-01 01:35:09 IST");
  }

  #[test]
  fn row_keeps_input_order() {
    let person = PersonRecord {
      id:              Uuid::nil(),
      list_id:         Uuid::nil(),
      display_name:    "Jane".into(),
      email_key:       Some("jane@x.io".into()),
      register_number: None,
      payload:         PersonPayload::Others { inputs: vec!["x".into(), "y".into(), "x".into()] },
      joined_at:       Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    };
    let row = ExportRow::from(&person);
    assert_eq!(row.inputs.as_deref(), Some(&["x".to_owned(), "y".to_owned(), "x".to_owned()][..]));
    assert_eq!(row.inputs_joined.as_deref(), Some("x | y | x"));
    assert_eq!(row.github_username, None);
    assert_eq!(row.joining_time, "2024-06-01 17:30:00 IST");
  }
}
